//! Host image tensors.
//!
//! The node-graph host hands images over as batched, channel-last float
//! tensors (`[batch, height, width, channels]`) with samples normalized
//! to `0.0..=1.0`. The comparison only ever looks at the first item of
//! the batch, rescaled to an 8-bit RGB raster.

use image::RgbImage;

use crate::types::PipelineError;

/// A batched `[batch, height, width, channels]` float image tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl ImageTensor {
    /// Wrap a flat, row-major sample buffer with its shape.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if `data.len()` does not
    /// equal the product of `shape`.
    pub fn new(shape: [usize; 4], data: Vec<f32>) -> Result<Self, PipelineError> {
        let expected = shape
            .iter()
            .try_fold(1_usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| PipelineError::InvalidInput(format!("tensor shape {shape:?} overflows")))?;
        if data.len() != expected {
            return Err(PipelineError::InvalidInput(format!(
                "tensor shape {shape:?} needs {expected} samples, got {}",
                data.len(),
            )));
        }
        Ok(Self { shape, data })
    }

    /// Build a single-item batch from an 8-bit RGB image.
    ///
    /// Samples are divided by 255 so the tensor looks exactly like what
    /// the host would pass in.
    #[must_use]
    pub fn from_rgb8(image: &RgbImage) -> Self {
        let data = image
            .as_raw()
            .iter()
            .map(|&v| f32::from(v) / 255.0)
            .collect();
        Self {
            shape: [1, image.height() as usize, image.width() as usize, 3],
            data,
        }
    }

    /// Tensor shape as `[batch, height, width, channels]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 4] {
        self.shape
    }

    /// Number of images in the batch.
    #[must_use]
    pub const fn batch_len(&self) -> usize {
        self.shape[0]
    }

    /// Take the first batch item and rescale it to an 8-bit RGB image.
    ///
    /// A fourth (alpha) channel is dropped. Samples are multiplied by 255
    /// and truncated; anything outside `0.0..=1.0` saturates and
    /// non-finite samples become 0.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if the batch is empty, the
    /// image has no pixels, the channel count is not 3 or 4, or a side
    /// does not fit in `u32`.
    pub fn first_rgb8(&self) -> Result<RgbImage, PipelineError> {
        let [batch, height, width, channels] = self.shape;
        if batch == 0 {
            return Err(PipelineError::InvalidInput("image batch is empty".to_owned()));
        }
        if height == 0 || width == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "image has no pixels ({width}x{height})"
            )));
        }
        if !matches!(channels, 3 | 4) {
            return Err(PipelineError::InvalidInput(format!(
                "expected 3 or 4 channels, got {channels}"
            )));
        }

        let to_u32 = |side: usize| {
            u32::try_from(side).map_err(|_| {
                PipelineError::InvalidInput(format!("image side {side} exceeds u32"))
            })
        };
        let (w, h) = (to_u32(width)?, to_u32(height)?);

        let item_len = height * width * channels;
        let raw: Vec<u8> = self.data[..item_len]
            .chunks_exact(channels)
            .flat_map(|px| [px[0], px[1], px[2]].map(rescale))
            .collect();

        RgbImage::from_raw(w, h, raw).ok_or_else(|| {
            PipelineError::InvalidInput(format!("cannot build a {w}x{h} RGB raster"))
        })
    }
}

/// Map a normalized sample to `0..=255`.
///
/// `as` saturates out-of-range floats and maps NaN to 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rescale(sample: f32) -> u8 {
    (sample * 255.0) as u8
}
