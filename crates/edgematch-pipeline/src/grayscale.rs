//! Image decoding and grayscale conversion.
//!
//! Edge masks are thresholded on BT.601 luminance
//! (`0.299*R + 0.587*G + 0.114*B`). The `image` crate's own
//! `to_luma8` uses Rec. 709 weights, which shifts which dark pixels land
//! above the edge threshold, so the conversion is done here in 14-bit
//! fixed point with round-half-up.

use image::{GrayImage, RgbImage};

use crate::types::PipelineError;

const SHIFT: u32 = 14;
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const _: () = assert!(R_WEIGHT + G_WEIGHT + B_WEIGHT == 1 << SHIFT);

/// BT.601 luminance of a single RGB sample.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT;
    // The weights sum to 1 << SHIFT, so this is at most 255.
    ((weighted + (1 << (SHIFT - 1))) >> SHIFT) as u8
}

/// Convert an RGB image to single-channel BT.601 luminance.
#[must_use = "returns the grayscale image"]
pub fn to_luma(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        image::Luma([luma(r, g, b)])
    })
}

/// Decode raw image bytes into an 8-bit RGB image.
///
/// Supports PNG, JPEG, BMP, and WebP formats (whatever the `image` crate
/// was built with). Alpha is discarded.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}
