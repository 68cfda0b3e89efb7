//! Shared types for the saibou segmentation pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference binary
/// masks without depending on `image` directly.
pub use image::GrayImage;

/// Single-channel floating-point plane: raw intensities, smoothed
/// intensities, and distance maps all use this representation.
pub type Luma32FImage = image::ImageBuffer<image::Luma<f32>, Vec<f32>>;

/// Integer label map: `0` is background, every positive value names one
/// region. Matches the output type of
/// [`imageproc::region_labelling::connected_components`].
pub type LabelImage = image::ImageBuffer<image::Luma<u32>, Vec<u32>>;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A validated stack of same-sized image channels.
///
/// This is the pipeline's only input: one `f32` plane per channel, all
/// with identical dimensions. Single-channel images are a stack of one.
/// The stack is immutable once constructed — the pipeline reads the
/// segmentation channel for mask building and every channel for
/// measurement, and never writes back.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStack {
    channels: Vec<Luma32FImage>,
    dimensions: Dimensions,
}

impl ChannelStack {
    /// Build a stack from pre-constructed channel planes.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::EmptyInput`] if `channels` is empty
    /// or the first plane has no pixels, and
    /// [`SegmentationError::ChannelSizeMismatch`] if any later plane
    /// disagrees with the first plane's dimensions.
    pub fn from_channels(channels: Vec<Luma32FImage>) -> Result<Self, SegmentationError> {
        let Some(first) = channels.first() else {
            return Err(SegmentationError::EmptyInput);
        };
        let dimensions = Dimensions {
            width: first.width(),
            height: first.height(),
        };
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(SegmentationError::EmptyInput);
        }
        for (index, channel) in channels.iter().enumerate() {
            if channel.width() != dimensions.width || channel.height() != dimensions.height {
                return Err(SegmentationError::ChannelSizeMismatch {
                    channel: index,
                    expected: dimensions,
                    actual: Dimensions {
                        width: channel.width(),
                        height: channel.height(),
                    },
                });
            }
        }
        Ok(Self {
            channels,
            dimensions,
        })
    }

    /// Build a stack from a flat `(channel, row, column)` sample buffer.
    ///
    /// `samples` must hold exactly `channel_count * height * width`
    /// values, one channel after another in raster order.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::EmptyInput`] for a zero-sized shape
    /// and [`SegmentationError::SampleCountMismatch`] if the buffer
    /// length disagrees with the declared shape.
    pub fn from_raw(
        channel_count: usize,
        width: u32,
        height: u32,
        samples: &[f32],
    ) -> Result<Self, SegmentationError> {
        if channel_count == 0 || width == 0 || height == 0 {
            return Err(SegmentationError::EmptyInput);
        }
        let plane_len = (width as usize) * (height as usize);
        let expected = channel_count * plane_len;
        if samples.len() != expected {
            return Err(SegmentationError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }
        let mut channels = Vec::with_capacity(channel_count);
        for chunk in samples.chunks_exact(plane_len) {
            let plane = Luma32FImage::from_raw(width, height, chunk.to_vec()).ok_or(
                SegmentationError::SampleCountMismatch {
                    expected,
                    actual: samples.len(),
                },
            )?;
            channels.push(plane);
        }
        Self::from_channels(channels)
    }

    /// Build a single-channel stack from one plane.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::EmptyInput`] if the plane has no
    /// pixels.
    pub fn single(plane: Luma32FImage) -> Result<Self, SegmentationError> {
        Self::from_channels(vec![plane])
    }

    /// Number of channels in the stack.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Borrow one channel plane, if the index is in range.
    #[must_use]
    pub fn channel(&self, index: usize) -> Option<&Luma32FImage> {
        self.channels.get(index)
    }

    /// All channel planes in order.
    #[must_use]
    pub fn channels(&self) -> &[Luma32FImage] {
        &self.channels
    }

    /// Plane dimensions shared by every channel.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}

/// Configuration for the segmentation pipeline.
///
/// All parameters default to the values the pipeline was tuned with on
/// membrane-labeled confocal images; they scale with image resolution
/// and cell size, so retargeting to other optics means adjusting these
/// rather than editing the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Gaussian smoothing sigma applied to the segmentation channel
    /// before thresholding and region growing. Non-positive values skip
    /// smoothing.
    pub smoothing_sigma: f32,

    /// Radius of the disk neighborhood used for the local-mean
    /// background estimate (radius 15 gives a 31x31 bounding box).
    pub threshold_radius: u32,

    /// Radius of the disk structuring element used for morphological
    /// closing of the membrane mask (radius 7 gives a 15x15 box).
    pub closing_radius: u32,

    /// Gaussian sigma applied to the distance map before local-maxima
    /// extraction, merging nearby maxima that belong to one cell.
    /// Non-positive values skip the smoothing.
    pub seed_smoothing_sigma: f32,

    /// Minimum separation between seed points in pixels: a seed must be
    /// the maximum of the square window of this half-width centered on
    /// it.
    pub min_seed_separation: u32,

    /// Index of the channel that drives segmentation. Measurement
    /// always covers every channel.
    pub segmentation_channel: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            smoothing_sigma: 3.0,
            threshold_radius: 15,
            closing_radius: 7,
            seed_smoothing_sigma: 5.0,
            min_seed_separation: 10,
            segmentation_channel: 0,
        }
    }
}

impl SegmentationConfig {
    /// Check the configuration against a stack with `channel_count`
    /// channels.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::InvalidConfig`] for non-finite
    /// sigmas, a zero threshold radius or seed separation, or a
    /// segmentation channel index outside the stack.
    pub fn validate(&self, channel_count: usize) -> Result<(), SegmentationError> {
        if !self.smoothing_sigma.is_finite() {
            return Err(SegmentationError::InvalidConfig(format!(
                "smoothing_sigma must be finite, got {}",
                self.smoothing_sigma
            )));
        }
        if !self.seed_smoothing_sigma.is_finite() {
            return Err(SegmentationError::InvalidConfig(format!(
                "seed_smoothing_sigma must be finite, got {}",
                self.seed_smoothing_sigma
            )));
        }
        if self.threshold_radius == 0 {
            return Err(SegmentationError::InvalidConfig(
                "threshold_radius must be at least 1".to_string(),
            ));
        }
        if self.min_seed_separation == 0 {
            return Err(SegmentationError::InvalidConfig(
                "min_seed_separation must be at least 1".to_string(),
            ));
        }
        if self.segmentation_channel >= channel_count {
            return Err(SegmentationError::InvalidConfig(format!(
                "segmentation_channel {} out of range for a {channel_count}-channel stack",
                self.segmentation_channel
            )));
        }
        Ok(())
    }
}

/// Per-cell measurement record.
///
/// One record per surviving cell, emitted in ascending `cell_id` order.
/// The per-channel vectors are indexed like the input stack's channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellMeasurement {
    /// Cell ID, matching the clean label map (1..=N, no gaps).
    pub cell_id: u32,

    /// Mean intensity over the cell's whole-cell pixels, per channel,
    /// taken from the original (unsmoothed) image.
    pub interior_mean: Vec<f64>,

    /// Mean intensity over the cell's edge pixels, per channel. `NaN`
    /// when the cell has no edge pixels (see
    /// [`edge_degenerate`](Self::edge_degenerate)).
    pub edge_mean: Vec<f64>,

    /// Whole-cell pixel count.
    pub area: u64,

    /// Edge pixel count.
    pub edge_length: u64,

    /// `true` when the cell had no edge pixels, making the edge means
    /// undefined. The cell is still reported rather than dropped.
    pub edge_degenerate: bool,
}

/// Result of running the full segmentation pipeline.
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    /// Clean label map: `0` background, cells labeled `1..=N`
    /// contiguously, no cell touching the image border.
    pub labels: LabelImage,

    /// Edge map: for each cell, exactly its one-pixel inner boundary,
    /// written with the cell's ID. A subset of the label map's non-zero
    /// pixels.
    pub edges: LabelImage,

    /// Per-cell measurements in ascending cell-ID order.
    pub measurements: Vec<CellMeasurement>,

    /// Dimensions of the processed image.
    pub dimensions: Dimensions,
}

impl SegmentationResult {
    /// Number of surviving cells. Zero is a valid outcome (every
    /// detected region touched the border) and is distinct from the
    /// error cases that abort the pipeline.
    #[must_use]
    pub fn cell_count(&self) -> u32 {
        u32::try_from(self.measurements.len()).unwrap_or(u32::MAX)
    }
}

/// Errors that can occur during segmentation.
#[derive(Debug, thiserror::Error)]
pub enum SegmentationError {
    /// The input stack had no channels or zero-sized planes.
    #[error("input image has no pixels")]
    EmptyInput,

    /// A channel plane disagreed with the stack's dimensions.
    #[error(
        "channel {channel} is {}x{}, expected {}x{}",
        .actual.width, .actual.height, .expected.width, .expected.height
    )]
    ChannelSizeMismatch {
        /// Index of the offending channel.
        channel: usize,
        /// Dimensions established by the first channel.
        expected: Dimensions,
        /// Dimensions of the offending channel.
        actual: Dimensions,
    },

    /// A flat sample buffer did not match its declared shape.
    #[error("sample buffer holds {actual} values, shape requires {expected}")]
    SampleCountMismatch {
        /// Value count implied by the declared shape.
        expected: usize,
        /// Value count actually provided.
        actual: usize,
    },

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// Adaptive thresholding classified no pixel as membrane, so there
    /// is nothing to segment.
    #[error("adaptive threshold produced an empty membrane mask")]
    NoMembrane,

    /// The distance transform yielded no seed candidates, so region
    /// growing cannot start.
    #[error("no seed candidates found in the distance transform")]
    NoSeeds,
}
