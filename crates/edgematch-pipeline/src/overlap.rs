//! Edge overlap comparison.
//!
//! Two edge masks match when the pixels they share cover at least
//! `min_overlap_percent` of the larger mask. Dividing by the larger count
//! makes the ratio symmetric and stops a sparse mask from "matching" a
//! dense one just because all of its few pixels are covered.

use image::{GrayImage, RgbImage};

use crate::mask;
use crate::resize;
use crate::tensor::ImageTensor;
use crate::types::{CompareConfig, Dimensions, OverlapReport, PipelineError, Verdict};

/// Compare two undilated, equal-size edge masks.
///
/// Both masks are dilated by `config.tolerance_pixels`, intersected, and
/// the intersection is measured against the larger of the two dilated
/// edge counts. When neither mask has any edge pixel the verdict is
/// [`Verdict::No`] and [`OverlapReport::overlap_ratio`] is `None`.
///
/// The returned report has `resized == false`; [`compare`] fills it in.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is out of range,
/// or [`PipelineError::DimensionMismatch`] if the masks differ in size.
pub fn compare_masks(
    mask_a: &GrayImage,
    mask_b: &GrayImage,
    config: &CompareConfig,
) -> Result<OverlapReport, PipelineError> {
    config.validate()?;
    mask::ensure_same_size(mask_a, mask_b)?;

    let dilated_a = mask::dilate(mask_a, config.tolerance_pixels);
    let dilated_b = mask::dilate(mask_b, config.tolerance_pixels);
    measure(&dilated_a, &dilated_b, config)
}

/// Intersect already-dilated masks and produce the report.
pub(crate) fn measure(
    dilated_a: &GrayImage,
    dilated_b: &GrayImage,
    config: &CompareConfig,
) -> Result<OverlapReport, PipelineError> {
    let intersection = mask::count_edges(&mask::intersect(dilated_a, dilated_b)?);
    let edges_a = mask::count_edges(dilated_a);
    let edges_b = mask::count_edges(dilated_b);

    let overlap_ratio = overlap_ratio(intersection, edges_a, edges_b);
    let verdict = match overlap_ratio {
        Some(ratio) if ratio >= config.min_overlap_ratio() => Verdict::Yes,
        _ => Verdict::No,
    };

    let report = OverlapReport {
        dimensions: Dimensions::of(dilated_a),
        resized: false,
        tolerance_pixels: config.tolerance_pixels,
        edges_a,
        edges_b,
        intersection,
        overlap_ratio,
        min_overlap_percent: config.min_overlap_percent,
        verdict,
    };

    match report.overlap_ratio {
        Some(_) => tracing::info!(
            overlap_percent = report.overlap_percent(),
            %verdict,
            edges_a,
            edges_b,
            intersection,
            "edge overlap: {:.2}% -> {verdict}",
            report.overlap_percent(),
        ),
        None => tracing::info!(%verdict, "neither image has edge pixels -> {verdict}"),
    }

    Ok(report)
}

/// `intersection / max(edges_a, edges_b)`, or `None` if both are empty.
#[allow(clippy::cast_precision_loss)]
fn overlap_ratio(intersection: u64, edges_a: u64, edges_b: u64) -> Option<f64> {
    let larger = edges_a.max(edges_b);
    (larger > 0).then(|| intersection as f64 / larger as f64)
}

/// Compare the edges of two RGB images.
///
/// Resizes both to a common size if needed, builds their edge masks and
/// hands them to [`compare_masks`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if either image has no pixels,
/// or [`PipelineError::InvalidConfig`] if `config` is out of range.
pub fn compare(
    image_a: &RgbImage,
    image_b: &RgbImage,
    config: &CompareConfig,
) -> Result<OverlapReport, PipelineError> {
    config.validate()?;
    ensure_non_empty(image_a, "image_a")?;
    ensure_non_empty(image_b, "image_b")?;

    let (a, b, resized) = resize::match_dimensions(image_a.clone(), image_b.clone());
    let mask_a = mask::edge_mask(&a);
    let mask_b = mask::edge_mask(&b);

    let mut report = compare_masks(&mask_a, &mask_b, config)?;
    report.resized = resized;
    Ok(report)
}

/// Decide whether the first images of two host tensors share their edges.
///
/// This is the node's entry point: tensors are rescaled to 8-bit, then
/// compared with [`compare`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if either tensor cannot be
/// reduced to a non-empty RGB raster, or
/// [`PipelineError::InvalidConfig`] if `config` is out of range.
pub fn evaluate(
    image_a: &ImageTensor,
    image_b: &ImageTensor,
    config: &CompareConfig,
) -> Result<Verdict, PipelineError> {
    let a = image_a.first_rgb8()?;
    let b = image_b.first_rgb8()?;
    Ok(compare(&a, &b, config)?.verdict)
}

/// Fail if an image has zero width or height.
pub(crate) fn ensure_non_empty(image: &RgbImage, name: &str) -> Result<(), PipelineError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::InvalidInput(format!(
            "{name} has no pixels ({}x{})",
            image.width(),
            image.height(),
        )));
    }
    Ok(())
}
