//! Bring two images to a common size before comparing their edges.
//!
//! Both images are resampled to the element-wise maximum of their widths
//! and heights. Nearest-neighbor sampling is used so that no intermediate
//! intensities appear along edges; a pixel in the output always carries
//! the exact color of some pixel in the input.
//!
//! The target keeps `max(width)` and `max(height)` independently, so for
//! a landscape/portrait pair the common size has an aspect ratio that
//! belongs to neither input. That is the established behavior of the
//! node and is kept as-is.

use image::RgbImage;

use crate::types::Dimensions;

/// Element-wise maximum of two sizes.
#[must_use]
pub fn target_dimensions(a: Dimensions, b: Dimensions) -> Dimensions {
    Dimensions {
        width: a.width.max(b.width),
        height: a.height.max(b.height),
    }
}

/// Resample `image` to `target` with nearest-neighbor sampling.
///
/// Destination pixel `(x, y)` reads source pixel
/// `(floor(x * sx), floor(y * sy))`, clamped to the last row/column,
/// where `sx = 1 / (dst_w / src_w)` is computed in `f64`. This is the
/// OpenCV `INTER_NEAREST` mapping, rounding included: at non-integer
/// scales it can differ by one pixel from exact integer division.
/// Integer upscales replicate each source pixel into an exact block.
#[must_use = "returns the resized image"]
pub fn resize_nearest(image: &RgbImage, target: Dimensions) -> RgbImage {
    let (src_w, src_h) = image.dimensions();
    if (src_w, src_h) == (target.width, target.height) {
        return image.clone();
    }
    if src_w == 0 || src_h == 0 {
        return RgbImage::new(target.width, target.height);
    }

    let xs: Vec<u32> = (0..target.width)
        .map(|x| nearest_source(x, src_w, target.width))
        .collect();
    let ys: Vec<u32> = (0..target.height)
        .map(|y| nearest_source(y, src_h, target.height))
        .collect();

    RgbImage::from_fn(target.width, target.height, |x, y| {
        *image.get_pixel(xs[x as usize], ys[y as usize])
    })
}

/// Source coordinate for destination coordinate `dst` along one axis.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn nearest_source(dst: u32, src_len: u32, dst_len: u32) -> u32 {
    let inv_scale = 1.0 / (f64::from(dst_len) / f64::from(src_len));
    // Non-negative; rounding can land on `src_len`, hence the clamp.
    let src = (f64::from(dst) * inv_scale).floor() as u32;
    src.min(src_len - 1)
}

/// Make two images the same size.
///
/// If their sizes already agree both are returned unchanged. Otherwise
/// both are resized to [`target_dimensions`] and the returned flag is
/// `true`.
#[must_use]
pub fn match_dimensions(a: RgbImage, b: RgbImage) -> (RgbImage, RgbImage, bool) {
    let dims_a = Dimensions::of(&a);
    let dims_b = Dimensions::of(&b);
    if dims_a == dims_b {
        return (a, b, false);
    }

    let target = target_dimensions(dims_a, dims_b);
    tracing::debug!(%dims_a, %dims_b, %target, "resizing images to a common size");
    (resize_nearest(&a, target), resize_nearest(&b, target), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x * 10 % 256) as u8, (y * 10 % 256) as u8, 7])
        })
    }

    #[test]
    fn target_takes_max_of_each_axis() {
        let t = target_dimensions(Dimensions::new(100, 20), Dimensions::new(30, 80));
        assert_eq!(t, Dimensions::new(100, 80));
    }

    #[test]
    fn same_size_is_identity() {
        let img = gradient(9, 7);
        let out = resize_nearest(&img, Dimensions::new(9, 7));
        assert_eq!(out, img);
    }

    #[test]
    fn integer_upscale_replicates_blocks() {
        let img = gradient(3, 2);
        let out = resize_nearest(&img, Dimensions::new(6, 4));
        for y in 0..4 {
            for x in 0..6 {
                assert_eq!(out.get_pixel(x, y), img.get_pixel(x / 2, y / 2));
            }
        }
    }

    #[test]
    fn upscale_introduces_no_new_colors() {
        let img = RgbImage::from_fn(5, 5, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        });
        let out = resize_nearest(&img, Dimensions::new(13, 11));
        assert!(
            out.pixels()
                .all(|p| p.0 == [0, 0, 0] || p.0 == [255, 255, 255])
        );
    }

    fn columns(src_len: u32, dst_len: u32) -> Vec<u32> {
        (0..dst_len)
            .map(|x| nearest_source(x, src_len, dst_len))
            .collect()
    }

    #[test]
    fn non_integer_scale_follows_floating_point_mapping() {
        assert_eq!(columns(2, 3), [0, 0, 1]);
        assert_eq!(columns(3, 7), [0, 0, 0, 1, 1, 2, 2]);

        // 49 * (1 / 49.0) rounds just below 1, so column 49 still reads
        // source column 0.
        let wide = columns(2, 98);
        assert_eq!(wide[49], 0);
        assert_eq!(wide[50], 1);
        assert_eq!(wide.iter().filter(|&&s| s == 0).count(), 50);
    }

    #[test]
    fn two_to_ninety_eight_keeps_fifty_white_columns() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        let out = resize_nearest(&img, Dimensions::new(98, 1));
        let white = out.pixels().filter(|p| p.0 == [255, 255, 255]).count();
        assert_eq!(white, 50);
    }

    #[test]
    fn anisotropic_target_stretches_each_axis() {
        let img = gradient(4, 4);
        let out = resize_nearest(&img, Dimensions::new(8, 4));
        assert_eq!(out.dimensions(), (8, 4));
        assert_eq!(out.get_pixel(7, 3), img.get_pixel(3, 3));
        assert_eq!(out.get_pixel(1, 2), img.get_pixel(0, 2));
    }

    #[test]
    fn match_dimensions_leaves_equal_sizes_alone() {
        let (a, b, resized) = match_dimensions(gradient(5, 5), gradient(5, 5));
        assert!(!resized);
        assert_eq!(a.dimensions(), (5, 5));
        assert_eq!(b.dimensions(), (5, 5));
    }

    #[test]
    fn match_dimensions_resizes_both_to_mixed_max() {
        let (a, b, resized) = match_dimensions(gradient(10, 4), gradient(6, 8));
        assert!(resized);
        assert_eq!(a.dimensions(), (10, 8));
        assert_eq!(b.dimensions(), (10, 8));
    }
}
