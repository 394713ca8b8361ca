//! edgematch: compare the edges of two image files.
//!
//! Runs the same comparison the node-graph host runs, on images read
//! from disk. Prints `Yes` or `No` (or a JSON report) and exits with a
//! status that scripts can branch on.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin edgematch -- [OPTIONS] <IMAGE_A> <IMAGE_B>
//! ```
//!
//! Exit status: 0 when the edges match, 1 when they do not, 2 on error.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use edgematch_pipeline::diagnostics::compare_with_diagnostics;
use edgematch_pipeline::grayscale::decode_rgb;
use edgematch_pipeline::types::RgbImage;
use edgematch_pipeline::{CompareConfig, Dimensions, ImageTensor, NodeRegistry};
use tracing_subscriber::EnvFilter;

/// Decide whether two images share the same edges.
///
/// Both images are thresholded into edge masks, optionally dilated to
/// tolerate small shifts, and their overlap is compared against a
/// percentage of the larger edge set.
#[derive(Parser)]
#[command(name = "edgematch", version)]
struct Cli {
    /// First image (PNG, JPEG, BMP, WebP).
    #[arg(required_unless_present = "schema")]
    image_a: Option<PathBuf>,

    /// Second image (PNG, JPEG, BMP, WebP).
    #[arg(required_unless_present = "schema")]
    image_b: Option<PathBuf>,

    /// Dilation passes applied to each edge mask.
    #[arg(
        long,
        default_value_t = CompareConfig::DEFAULT_TOLERANCE_PIXELS,
        value_parser = clap::value_parser!(u8).range(0..=i64::from(CompareConfig::MAX_TOLERANCE_PIXELS)),
    )]
    tolerance_pixels: u8,

    /// Percentage of the larger edge set the overlap must cover.
    #[arg(
        long,
        default_value_t = CompareConfig::DEFAULT_MIN_OVERLAP_PERCENT,
        value_parser = parse_percent,
    )]
    min_overlap_percent: f64,

    /// Full comparison config as a JSON string.
    ///
    /// When provided, `--tolerance-pixels` and `--min-overlap-percent`
    /// are ignored. Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print the full overlap report as JSON instead of `Yes`/`No`.
    #[arg(long)]
    json: bool,

    /// Print per-stage timing and counts to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Print the registered node descriptors as JSON and exit.
    #[arg(long)]
    schema: bool,
}

/// Parse and range-check `--min-overlap-percent`.
fn parse_percent(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("not a number: {e}"))?;
    if (CompareConfig::MIN_OVERLAP_PERCENT..=CompareConfig::MAX_OVERLAP_PERCENT).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "must be within {}..={}",
            CompareConfig::MIN_OVERLAP_PERCENT,
            CompareConfig::MAX_OVERLAP_PERCENT,
        ))
    }
}

/// Build a [`CompareConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<CompareConfig, String> {
    let config = match cli.config_json {
        Some(ref json) => serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?,
        None => CompareConfig {
            tolerance_pixels: cli.tolerance_pixels,
            min_overlap_percent: cli.min_overlap_percent,
        },
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Read and decode an image, routed through the host tensor format.
fn load(path: &Path) -> Result<RgbImage, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let decoded = decode_rgb(&bytes).map_err(|e| format!("{}: {e}", path.display()))?;
    ImageTensor::from_rgb8(&decoded)
        .first_rgb8()
        .map_err(|e| format!("{}: {e}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, String> {
    if cli.schema {
        let registry = NodeRegistry::with_builtin();
        let descriptors: Vec<_> = registry.iter().collect();
        let json = serde_json::to_string_pretty(&descriptors)
            .map_err(|e| format!("Error serializing node schema: {e}"))?;
        println!("{json}");
        return Ok(ExitCode::SUCCESS);
    }

    let (Some(path_a), Some(path_b)) = (&cli.image_a, &cli.image_b) else {
        return Err("two image paths are required".to_owned());
    };

    let config = config_from_cli(cli)?;
    tracing::debug!(?config, "comparison config");

    let image_a = load(path_a)?;
    let image_b = load(path_b)?;
    tracing::debug!(
        a = %path_a.display(),
        b = %path_b.display(),
        a_size = %Dimensions::of(&image_a),
        b_size = %Dimensions::of(&image_b),
        "loaded images",
    );

    let (report, diagnostics) =
        compare_with_diagnostics(&image_a, &image_b, &config).map_err(|e| e.to_string())?;

    if cli.diagnostics {
        eprintln!("{}", diagnostics.report());
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error serializing report: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", report.verdict);
    }

    Ok(if report.verdict.is_match() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(code) => code,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("edgematch").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_match_node_defaults() {
        let cli = parse(&["a.png", "b.png"]).unwrap();
        assert_eq!(config_from_cli(&cli).unwrap(), CompareConfig::default());
    }

    #[test]
    fn flags_set_config() {
        let cli = parse(&[
            "a.png",
            "b.png",
            "--tolerance-pixels",
            "0",
            "--min-overlap-percent",
            "72.5",
        ])
        .unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.tolerance_pixels, 0);
        assert!((config.min_overlap_percent - 72.5).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_flags_are_rejected() {
        assert!(parse(&["a.png", "b.png", "--tolerance-pixels", "11"]).is_err());
        assert!(parse(&["a.png", "b.png", "--min-overlap-percent", "49"]).is_err());
        assert!(parse(&["a.png", "b.png", "--min-overlap-percent", "abc"]).is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "a.png",
            "b.png",
            "--tolerance-pixels",
            "7",
            "--config-json",
            r#"{"tolerance_pixels": 1, "min_overlap_percent": 95.0}"#,
        ])
        .unwrap();
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.tolerance_pixels, 1);
        assert!((config.min_overlap_percent - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn config_json_is_validated() {
        let cli = parse(&["a.png", "b.png", "--config-json", r#"{"tolerance_pixels": 40}"#]).unwrap();
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn image_paths_required_unless_schema() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--schema"]).is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let cli = parse(&["/nonexistent/a.png", "/nonexistent/b.png"]).unwrap();
        assert!(run(&cli).is_err());
    }
}
