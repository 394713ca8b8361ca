//! Shared types for the edgematch comparison pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference edge masks
/// without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can hand in decoded
/// images without depending on `image` directly.
pub use image::RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new set of dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an existing image buffer.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parameters for a single edge comparison.
///
/// The ranges mirror what the host exposes on the node's input sockets:
/// `tolerance_pixels` in `0..=10` and `min_overlap_percent` in
/// `50.0..=100.0`. Use [`CompareConfig::try_new`] or
/// [`CompareConfig::validate`] to enforce them; every comparison entry
/// point validates before touching pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Number of 3x3 elliptical dilation passes applied to each edge
    /// mask. Each pass lets edges drift one more pixel and still match.
    pub tolerance_pixels: u8,

    /// Percentage of the larger edge-pixel count that the intersection
    /// must cover for the verdict to be [`Verdict::Yes`].
    pub min_overlap_percent: f64,
}

impl CompareConfig {
    /// Default dilation passes.
    pub const DEFAULT_TOLERANCE_PIXELS: u8 = 2;
    /// Largest accepted dilation pass count.
    pub const MAX_TOLERANCE_PIXELS: u8 = 10;
    /// Step the host uses for the tolerance slider.
    pub const TOLERANCE_PIXELS_STEP: u8 = 1;

    /// Default overlap threshold in percent.
    pub const DEFAULT_MIN_OVERLAP_PERCENT: f64 = 90.0;
    /// Smallest accepted overlap threshold in percent.
    pub const MIN_OVERLAP_PERCENT: f64 = 50.0;
    /// Largest accepted overlap threshold in percent.
    pub const MAX_OVERLAP_PERCENT: f64 = 100.0;
    /// Step the host uses for the overlap slider.
    pub const OVERLAP_PERCENT_STEP: f64 = 0.5;

    /// Build a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if either value is
    /// outside its accepted range.
    pub fn try_new(tolerance_pixels: u8, min_overlap_percent: f64) -> Result<Self, PipelineError> {
        let config = Self {
            tolerance_pixels,
            min_overlap_percent,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check both parameters against their accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.tolerance_pixels > Self::MAX_TOLERANCE_PIXELS {
            return Err(PipelineError::InvalidConfig(format!(
                "tolerance_pixels must be at most {}, got {}",
                Self::MAX_TOLERANCE_PIXELS,
                self.tolerance_pixels,
            )));
        }
        if !(Self::MIN_OVERLAP_PERCENT..=Self::MAX_OVERLAP_PERCENT)
            .contains(&self.min_overlap_percent)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "min_overlap_percent must be within {}..={}, got {}",
                Self::MIN_OVERLAP_PERCENT,
                Self::MAX_OVERLAP_PERCENT,
                self.min_overlap_percent,
            )));
        }
        Ok(())
    }

    /// The overlap threshold as a fraction in `0.5..=1.0`.
    #[must_use]
    pub fn min_overlap_ratio(&self) -> f64 {
        self.min_overlap_percent / 100.0
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            tolerance_pixels: Self::DEFAULT_TOLERANCE_PIXELS,
            min_overlap_percent: Self::DEFAULT_MIN_OVERLAP_PERCENT,
        }
    }
}

/// Outcome of an edge comparison, as the host sees it.
///
/// Serializes (and displays) as the bare strings `"Yes"` and `"No"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The edges overlap at or above the configured threshold.
    Yes,
    /// The edges do not overlap enough, or neither image has edges.
    No,
}

impl Verdict {
    /// The host-facing string for this verdict.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    /// `true` for [`Verdict::Yes`].
    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full result of comparing two edge masks.
///
/// The host only consumes [`OverlapReport::verdict`]; the counts are
/// kept for the CLI's JSON output and for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapReport {
    /// Size both masks were compared at.
    pub dimensions: Dimensions,

    /// Whether the inputs had to be resized to a common size.
    pub resized: bool,

    /// Tolerance the masks were dilated with.
    pub tolerance_pixels: u8,

    /// Edge pixels in mask A (after dilation).
    pub edges_a: u64,

    /// Edge pixels in mask B (after dilation).
    pub edges_b: u64,

    /// Pixels that are edges in both masks.
    pub intersection: u64,

    /// `intersection / max(edges_a, edges_b)`.
    ///
    /// `None` when neither mask contains an edge pixel; that comparison
    /// is defined as non-matching.
    pub overlap_ratio: Option<f64>,

    /// Threshold the ratio was tested against, in percent.
    pub min_overlap_percent: f64,

    /// Final decision.
    pub verdict: Verdict,
}

impl OverlapReport {
    /// The overlap ratio as a percentage, `0.0` for the edgeless case.
    #[must_use]
    pub fn overlap_percent(&self) -> f64 {
        self.overlap_ratio.map_or(0.0, |ratio| ratio * 100.0)
    }
}

/// Errors that can occur while comparing images.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An input image cannot be reduced to a non-empty 3-channel raster.
    #[error("invalid input image: {0}")]
    InvalidInput(String),

    /// Comparison parameters are out of range.
    #[error("invalid comparison configuration: {0}")]
    InvalidConfig(String),

    /// Two masks of different sizes were combined.
    #[error("mask dimensions differ: {a} vs {b}")]
    DimensionMismatch {
        /// Size of the first mask.
        a: Dimensions,
        /// Size of the second mask.
        b: Dimensions,
    },

    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// A node type name was registered twice.
    #[error("node type {0:?} is already registered")]
    DuplicateNode(String),
}
