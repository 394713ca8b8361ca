//! Binary edge masks: thresholding, tolerance dilation, intersection.
//!
//! A mask is a [`GrayImage`] whose samples are either 0 (background) or
//! [`EDGE_VALUE`] (edge). Line-art inputs are assumed: any pixel brighter
//! than [`EDGE_THRESHOLD`] is an edge, with no gradient step involved.

use image::{GrayImage, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use crate::grayscale;
use crate::types::{Dimensions, PipelineError};

/// Luminance above which a pixel counts as an edge.
pub const EDGE_THRESHOLD: u8 = 20;

/// Sample value for edge pixels.
pub const EDGE_VALUE: u8 = 255;

/// Binarize a grayscale image: samples strictly above `threshold` become
/// [`EDGE_VALUE`], everything else 0.
#[must_use = "returns the binary mask"]
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y).0[0] > threshold {
            image::Luma([EDGE_VALUE])
        } else {
            image::Luma([0])
        }
    })
}

/// Grayscale an RGB image and binarize it at [`EDGE_THRESHOLD`].
#[must_use = "returns the edge mask"]
pub fn edge_mask(image: &RgbImage) -> GrayImage {
    binarize(&grayscale::to_luma(image), EDGE_THRESHOLD)
}

/// Grow the edges of `mask` by `iterations` passes of a 3x3 elliptical
/// structuring element.
///
/// The 3x3 ellipse is the plus-shaped cross, and `n` passes of it reach
/// exactly the pixels within L1 (city-block) distance `n` of an edge, so
/// this is a single L1 dilation of radius `iterations`. Pixels outside
/// the raster never contribute.
#[must_use = "returns the dilated mask"]
pub fn dilate(mask: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 || count_edges(mask) == 0 {
        return mask.clone();
    }
    morphology::dilate(mask, Norm::L1, iterations)
}

/// Pixel-wise AND of two masks.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if the masks differ in
/// size.
pub fn intersect(a: &GrayImage, b: &GrayImage) -> Result<GrayImage, PipelineError> {
    ensure_same_size(a, b)?;
    let raw: Vec<u8> = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&pa, &pb)| if pa != 0 && pb != 0 { EDGE_VALUE } else { 0 })
        .collect();
    GrayImage::from_raw(a.width(), a.height(), raw).ok_or(PipelineError::DimensionMismatch {
        a: Dimensions::of(a),
        b: Dimensions::of(b),
    })
}

/// Number of nonzero samples in a mask.
#[must_use]
pub fn count_edges(mask: &GrayImage) -> u64 {
    mask.as_raw().iter().filter(|&&v| v != 0).count() as u64
}

/// Fail unless both masks have the same size.
pub(crate) fn ensure_same_size(a: &GrayImage, b: &GrayImage) -> Result<(), PipelineError> {
    if a.dimensions() == b.dimensions() {
        Ok(())
    } else {
        Err(PipelineError::DimensionMismatch {
            a: Dimensions::of(a),
            b: Dimensions::of(b),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn single_dot(w: u32, h: u32, x: u32, y: u32) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        img.put_pixel(x, y, image::Luma([EDGE_VALUE]));
        img
    }

    #[test]
    fn binarize_is_strictly_greater_than() {
        let img = GrayImage::from_fn(4, 1, |x, _| image::Luma([[0, 20, 21, 255][x as usize]]));
        let mask = binarize(&img, EDGE_THRESHOLD);
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn edge_mask_thresholds_luminance() {
        let img = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => image::Rgb([20, 20, 20]),
            1 => image::Rgb([21, 21, 21]),
            _ => image::Rgb([0, 0, 170]),
        });
        let mask = edge_mask(&img);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.get_pixel(1, 0).0[0], EDGE_VALUE);
        assert_eq!(mask.get_pixel(2, 0).0[0], 0);
    }

    #[test]
    fn zero_iterations_is_identity() {
        let mask = single_dot(7, 7, 3, 3);
        assert_eq!(dilate(&mask, 0), mask);
    }

    #[test]
    fn one_iteration_is_a_cross() {
        let mask = single_dot(5, 5, 2, 2);
        let dilated = dilate(&mask, 1);
        assert_eq!(count_edges(&dilated), 5);
        for (x, y) in [(2, 2), (1, 2), (3, 2), (2, 1), (2, 3)] {
            assert_eq!(dilated.get_pixel(x, y).0[0], EDGE_VALUE, "({x}, {y})");
        }
        // Corners of the 3x3 neighborhood stay background.
        for (x, y) in [(1, 1), (3, 1), (1, 3), (3, 3)] {
            assert_eq!(dilated.get_pixel(x, y).0[0], 0, "({x}, {y})");
        }
    }

    #[test]
    fn repeated_iterations_grow_a_diamond() {
        // L1 ball of radius 2 holds 1 + 4 + 8 = 13 pixels.
        let mask = single_dot(9, 9, 4, 4);
        let dilated = dilate(&mask, 2);
        assert_eq!(count_edges(&dilated), 13);
        assert_eq!(dilated.get_pixel(4, 2).0[0], EDGE_VALUE);
        assert_eq!(dilated.get_pixel(3, 3).0[0], EDGE_VALUE);
        assert_eq!(dilated.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn dilation_is_clipped_at_the_border() {
        let mask = single_dot(5, 5, 0, 0);
        let dilated = dilate(&mask, 1);
        assert_eq!(count_edges(&dilated), 3);
    }

    #[test]
    fn dilating_an_empty_mask_stays_empty() {
        let mask = GrayImage::new(6, 6);
        assert_eq!(count_edges(&dilate(&mask, 10)), 0);
    }

    #[test]
    fn dilation_output_is_binary() {
        let mask = single_dot(9, 9, 4, 4);
        let dilated = dilate(&mask, 3);
        assert!(dilated.pixels().all(|p| p.0[0] == 0 || p.0[0] == EDGE_VALUE));
    }

    #[test]
    fn intersect_keeps_common_pixels() {
        let a = GrayImage::from_fn(4, 1, |x, _| image::Luma([if x < 2 { 255 } else { 0 }]));
        let b = GrayImage::from_fn(4, 1, |x, _| image::Luma([if x >= 1 { 255 } else { 0 }]));
        let both = intersect(&a, &b).unwrap();
        let values: Vec<u8> = both.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 255, 0, 0]);
    }

    #[test]
    fn intersect_rejects_size_mismatch() {
        let result = intersect(&GrayImage::new(3, 3), &GrayImage::new(3, 4));
        assert!(matches!(
            result,
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn count_edges_counts_nonzero() {
        let mut img = GrayImage::new(10, 10);
        for i in 0..5 {
            img.put_pixel(i, 0, image::Luma([255]));
        }
        assert_eq!(count_edges(&img), 5);
    }
}
