//! Comparison diagnostics: timing and pixel counts for each stage.
//!
//! [`compare_with_diagnostics`] runs the same steps as
//! [`compare`](crate::compare) and additionally records how long each
//! stage took and what it produced. Intended for threshold tuning from
//! the CLI; the host never asks for it.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::{Duration, Instant};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::mask;
use crate::overlap;
use crate::resize;
use crate::types::{CompareConfig, Dimensions, OverlapReport, PipelineError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single comparison.
///
/// `dilate` is `None` when the tolerance is zero and the stage is
/// skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareDiagnostics {
    /// Stage 1: bring both images to a common size.
    pub normalize: StageDiagnostics,
    /// Stage 2: grayscale and threshold into edge masks.
    pub edge_mask: StageDiagnostics,
    /// Stage 3: tolerance dilation (only when `tolerance_pixels > 0`).
    pub dilate: Option<StageDiagnostics>,
    /// Stage 4: intersection and ratio.
    pub overlap: StageDiagnostics,
    /// Total wall-clock duration of the comparison (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Size normalization metrics.
    Normalize {
        /// Size of image A as given.
        input_a: Dimensions,
        /// Size of image B as given.
        input_b: Dimensions,
        /// Common size both were compared at.
        target: Dimensions,
        /// Whether any resampling happened.
        resized: bool,
    },
    /// Edge mask metrics.
    EdgeMask {
        /// Luminance threshold used.
        threshold: u8,
        /// Edge pixels in mask A.
        edges_a: u64,
        /// Edge pixels in mask B.
        edges_b: u64,
        /// Total pixel count per mask.
        total_pixel_count: u64,
    },
    /// Dilation metrics.
    Dilate {
        /// Dilation passes applied.
        iterations: u8,
        /// Edge pixels in mask A after dilation.
        edges_a: u64,
        /// Edge pixels in mask B after dilation.
        edges_b: u64,
    },
    /// Overlap metrics.
    Overlap {
        /// Pixels set in both masks.
        intersection: u64,
        /// Overlap in percent (0 for the edgeless case).
        overlap_percent: f64,
        /// Threshold in percent.
        min_overlap_percent: f64,
    },
}

impl CompareDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Edge Match Diagnostics\n{}", "=".repeat(60)));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);

        let mut stages = vec![("Normalize", &self.normalize), ("Edge Mask", &self.edge_mask)];
        if let Some(ref dilate) = self.dilate {
            stages.push(("Dilate", dilate));
        }
        stages.push(("Overlap", &self.overlap));

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Normalize {
            input_a,
            input_b,
            target,
            resized,
        } => {
            if *resized {
                format!("{input_a} + {input_b} -> {target}")
            } else {
                format!("{target} (no resize)")
            }
        }
        StageMetrics::EdgeMask {
            threshold,
            edges_a,
            edges_b,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = |edges: u64| {
                if *total_pixel_count > 0 {
                    edges as f64 / *total_pixel_count as f64 * 100.0
                } else {
                    0.0
                }
            };
            format!(
                "threshold={threshold} a={edges_a} ({:.1}%) b={edges_b} ({:.1}%)",
                density(*edges_a),
                density(*edges_b),
            )
        }
        StageMetrics::Dilate {
            iterations,
            edges_a,
            edges_b,
        } => format!("iterations={iterations} a={edges_a} b={edges_b}"),
        StageMetrics::Overlap {
            intersection,
            overlap_percent,
            min_overlap_percent,
        } => format!(
            "intersection={intersection} overlap={overlap_percent:.2}% (min {min_overlap_percent:.1}%)"
        ),
    }
}

/// Compare two images and collect per-stage diagnostics.
///
/// Produces the same [`OverlapReport`] as [`compare`](crate::compare).
///
/// # Errors
///
/// Same as [`compare`](crate::compare).
pub fn compare_with_diagnostics(
    image_a: &RgbImage,
    image_b: &RgbImage,
    config: &CompareConfig,
) -> Result<(OverlapReport, CompareDiagnostics), PipelineError> {
    config.validate()?;
    overlap::ensure_non_empty(image_a, "image_a")?;
    overlap::ensure_non_empty(image_b, "image_b")?;

    let total_start = Instant::now();

    let start = Instant::now();
    let input_a = Dimensions::of(image_a);
    let input_b = Dimensions::of(image_b);
    let (a, b, resized) = resize::match_dimensions(image_a.clone(), image_b.clone());
    let target = Dimensions::of(&a);
    let normalize = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::Normalize {
            input_a,
            input_b,
            target,
            resized,
        },
    };

    let start = Instant::now();
    let mask_a = mask::edge_mask(&a);
    let mask_b = mask::edge_mask(&b);
    let edge_mask = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::EdgeMask {
            threshold: mask::EDGE_THRESHOLD,
            edges_a: mask::count_edges(&mask_a),
            edges_b: mask::count_edges(&mask_b),
            total_pixel_count: target.pixel_count(),
        },
    };

    let (mask_a, mask_b, dilate) = if config.tolerance_pixels > 0 {
        let start = Instant::now();
        let dilated_a = mask::dilate(&mask_a, config.tolerance_pixels);
        let dilated_b = mask::dilate(&mask_b, config.tolerance_pixels);
        let diag = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Dilate {
                iterations: config.tolerance_pixels,
                edges_a: mask::count_edges(&dilated_a),
                edges_b: mask::count_edges(&dilated_b),
            },
        };
        (dilated_a, dilated_b, Some(diag))
    } else {
        (mask_a, mask_b, None)
    };

    let start = Instant::now();
    let mut report = overlap::measure(&mask_a, &mask_b, config)?;
    report.resized = resized;
    let overlap = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::Overlap {
            intersection: report.intersection,
            overlap_percent: report.overlap_percent(),
            min_overlap_percent: report.min_overlap_percent,
        },
    };

    let diagnostics = CompareDiagnostics {
        normalize,
        edge_mask,
        dilate,
        overlap,
        total_duration: total_start.elapsed(),
    };
    Ok((report, diagnostics))
}
