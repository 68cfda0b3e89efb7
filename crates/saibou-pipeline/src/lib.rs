//! saibou-pipeline: Pure cell segmentation and measurement (sans-IO).
//!
//! Turns a membrane-labeled microscopy image into a per-cell label map
//! and a table of per-cell measurements through:
//! smoothing -> adaptive thresholding -> mask refinement ->
//! distance-transform seeding -> watershed growth -> border cleaning ->
//! edge extraction -> measurement.
//!
//! This crate has **no I/O dependencies** — it operates on in-memory
//! channel stacks and returns structured data. File loading and result
//! writing live in `saibou-io`.
//!
//! Every invocation is a pure function of its inputs: components
//! allocate fresh outputs instead of mutating shared buffers, so
//! processing many images concurrently from independent workers needs
//! no coordination.

pub mod border;
pub mod edges;
pub mod measure;
pub mod pipeline;
pub mod refine;
pub mod seeds;
pub mod smooth;
pub mod threshold;
pub mod types;
pub mod watershed;

#[cfg(test)]
pub(crate) mod test_scenes;

pub use pipeline::SegmentationPipeline;
pub use types::{
    CellMeasurement, ChannelStack, Dimensions, GrayImage, LabelImage, Luma32FImage,
    SegmentationConfig, SegmentationError, SegmentationResult,
};

/// Run the full segmentation and measurement pipeline.
///
/// Takes a validated [`ChannelStack`] and a configuration, and produces
/// a [`SegmentationResult`] holding the clean label map (cells `1..=N`,
/// background 0, no cell touching the image border), the per-cell edge
/// map, and the measurement table in ascending cell-ID order.
///
/// # Pipeline steps
///
/// 1. Gaussian smoothing of the segmentation channel
/// 2. Adaptive (local-mean) thresholding into a membrane mask
/// 3. Mask refinement: hole filling + padded morphological closing
/// 4. Seed generation: distance transform + smoothed local maxima
/// 5. Watershed region growing over the smoothed intensity surface
/// 6. Border-cell removal and contiguous relabeling
/// 7. Per-cell edge extraction
/// 8. Measurement aggregation from the original channels
///
/// Zero surviving cells is a valid `Ok` outcome (an empty table), which
/// is deliberately distinct from the degenerate-input errors below.
///
/// # Errors
///
/// Returns [`SegmentationError::InvalidConfig`] if the configuration is
/// inconsistent with the stack, and [`SegmentationError::NoMembrane`] /
/// [`SegmentationError::NoSeeds`] when thresholding or seeding finds
/// nothing to segment — flat or empty input never silently yields a
/// fabricated label map.
pub fn segment_and_measure(
    stack: ChannelStack,
    config: &SegmentationConfig,
) -> Result<SegmentationResult, SegmentationError> {
    Ok(SegmentationPipeline::new(stack, config.clone())
        .smooth()?
        .threshold()
        .refine()
        .seed()?
        .grow()
        .clean_borders()
        .extract_edges()
        .measure()
        .into_result())
}
