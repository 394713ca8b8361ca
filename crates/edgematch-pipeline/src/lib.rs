//! edgematch-pipeline: Edge overlap comparison for node-graph image
//! pipelines (sans-IO).
//!
//! Decides whether two images share the same edges, tolerant of small
//! pixel shifts, through:
//! rescale -> common size -> grayscale -> threshold -> dilation ->
//! intersection -> overlap ratio.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! tensors and rasters and returns structured data. Reading files and
//! printing results lives in `edgematch-cli`.

pub mod diagnostics;
pub mod grayscale;
pub mod mask;
pub mod node;
pub mod overlap;
pub mod resize;
pub mod tensor;
pub mod types;

pub use node::{EdgeMatchNode, NodeDescriptor, NodeInputs, NodeOutput, NodeRegistry};
pub use overlap::{compare, compare_masks, evaluate};
pub use tensor::ImageTensor;
pub use types::{CompareConfig, Dimensions, OverlapReport, PipelineError, Verdict};

/// Decode two encoded images and compare their edges.
///
/// Both images are routed through [`ImageTensor`] so they take exactly
/// the path a host-supplied image would.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// if either buffer cannot be decoded, plus anything [`compare`] returns.
pub fn compare_encoded(
    bytes_a: &[u8],
    bytes_b: &[u8],
    config: &CompareConfig,
) -> Result<OverlapReport, PipelineError> {
    let a = ImageTensor::from_rgb8(&grayscale::decode_rgb(bytes_a)?).first_rgb8()?;
    let b = ImageTensor::from_rgb8(&grayscale::decode_rgb(bytes_b)?).first_rgb8()?;
    compare(&a, &b, config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Encode an RGB image as PNG bytes.
    fn png(img: &image::RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    fn square_outline(size: u32) -> image::RgbImage {
        image::RgbImage::from_fn(size, size, |x, y| {
            if x == 2 || y == 2 || x == size - 3 || y == size - 3 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn compare_encoded_empty_input() {
        let ok = png(&square_outline(10));
        let result = compare_encoded(&[], &ok, &CompareConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn compare_encoded_corrupt_input() {
        let ok = png(&square_outline(10));
        let result = compare_encoded(&ok, &[0xFF, 0x00], &CompareConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn compare_encoded_same_png_matches() {
        let bytes = png(&square_outline(24));
        let report = compare_encoded(&bytes, &bytes, &CompareConfig::default()).unwrap();
        assert_eq!(report.verdict, Verdict::Yes);
        assert!((report.overlap_percent() - 100.0).abs() < 1e-9);
    }
}
