//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::segment_and_measure`] which runs everything in one
//! call, [`SegmentationPipeline`] lets the caller drive execution one
//! step at a time:
//!
//! ```rust
//! # use saibou_pipeline::{ChannelStack, SegmentationConfig, SegmentationError};
//! # use saibou_pipeline::pipeline::SegmentationPipeline;
//! # fn run(stack: ChannelStack) -> Result<(), SegmentationError> {
//! let result = SegmentationPipeline::new(stack, SegmentationConfig::default())
//!     .smooth()?
//!     .threshold()
//!     .refine()
//!     .seed()?
//!     .grow()
//!     .clean_borders()
//!     .extract_edges()
//!     .measure()
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next state (or
//! `Result` for the two fallible transitions), carrying all previously
//! computed intermediates. Accessors on every stage expose the current
//! output, so a caller can stop mid-chain to inspect the membrane mask
//! or the distance map without running the rest.
//!
//! Making the transitions consume `self` means skipping a stage or
//! running one out of order is a compile-time error, which is what
//! keeps the strictly forward data flow honest.

use image::GrayImage;

use crate::seeds::SeedMap;
use crate::types::{
    CellMeasurement, ChannelStack, LabelImage, Luma32FImage, SegmentationConfig,
    SegmentationError, SegmentationResult,
};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing — call .smooth() to continue"]
pub struct Pending {
    config: SegmentationConfig,
    stack: ChannelStack,
}

impl Pending {
    /// The input channel stack.
    #[must_use]
    pub const fn stack(&self) -> &ChannelStack {
        &self.stack
    }

    /// Validate the configuration against the stack and smooth the
    /// segmentation channel.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::InvalidConfig`] if the configuration
    /// is inconsistent with the stack (see
    /// [`SegmentationConfig::validate`]).
    pub fn smooth(self) -> Result<Smoothed, SegmentationError> {
        self.config.validate(self.stack.channel_count())?;
        let channel = self
            .stack
            .channel(self.config.segmentation_channel)
            .ok_or_else(|| {
                SegmentationError::InvalidConfig(format!(
                    "segmentation_channel {} out of range",
                    self.config.segmentation_channel
                ))
            })?;
        let smoothed = crate::smooth::gaussian_smooth(channel, self.config.smoothing_sigma);
        Ok(Smoothed {
            config: self.config,
            stack: self.stack,
            smoothed,
        })
    }
}

// ───────────────────────── Stage 1: Smoothed ─────────────────────────

/// Pipeline state after Gaussian smoothing of the segmentation channel.
#[must_use = "pipeline stages are consumed by advancing — call .threshold() to continue"]
pub struct Smoothed {
    config: SegmentationConfig,
    stack: ChannelStack,
    smoothed: Luma32FImage,
}

impl Smoothed {
    /// The smoothed segmentation channel.
    #[must_use]
    pub const fn smoothed(&self) -> &Luma32FImage {
        &self.smoothed
    }

    /// Classify membrane pixels against the local-mean background.
    pub fn threshold(self) -> Thresholded {
        let membrane =
            crate::threshold::adaptive_threshold(&self.smoothed, self.config.threshold_radius);
        Thresholded {
            config: self.config,
            stack: self.stack,
            smoothed: self.smoothed,
            membrane,
        }
    }
}

// ───────────────────────── Stage 2: Thresholded ──────────────────────

/// Pipeline state after adaptive thresholding.
#[must_use = "pipeline stages are consumed by advancing — call .refine() to continue"]
pub struct Thresholded {
    config: SegmentationConfig,
    stack: ChannelStack,
    smoothed: Luma32FImage,
    membrane: GrayImage,
}

impl Thresholded {
    /// The raw membrane mask (255 = membrane).
    #[must_use]
    pub const fn membrane(&self) -> &GrayImage {
        &self.membrane
    }

    /// Fill interior holes and close membrane gaps.
    pub fn refine(self) -> Refined {
        let refined = crate::refine::refine_mask(&self.membrane, self.config.closing_radius);
        Refined {
            config: self.config,
            stack: self.stack,
            smoothed: self.smoothed,
            membrane: self.membrane,
            refined,
        }
    }
}

// ───────────────────────── Stage 3: Refined ──────────────────────────

/// Pipeline state after mask refinement.
#[must_use = "pipeline stages are consumed by advancing — call .seed() to continue"]
pub struct Refined {
    config: SegmentationConfig,
    stack: ChannelStack,
    smoothed: Luma32FImage,
    membrane: GrayImage,
    refined: GrayImage,
}

impl Refined {
    /// The refined membrane mask.
    #[must_use]
    pub const fn refined(&self) -> &GrayImage {
        &self.refined
    }

    /// Generate watershed seeds from the distance transform.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentationError::NoMembrane`] or
    /// [`SegmentationError::NoSeeds`] when the mask degenerates — a
    /// fatal condition for this image, never silently papered over with
    /// an empty segmentation.
    pub fn seed(self) -> Result<Seeded, SegmentationError> {
        let seeds = crate::seeds::generate_seeds(
            &self.refined,
            self.config.seed_smoothing_sigma,
            self.config.min_seed_separation,
        )?;
        Ok(Seeded {
            stack: self.stack,
            smoothed: self.smoothed,
            membrane: self.membrane,
            refined: self.refined,
            seeds,
        })
    }
}

// ───────────────────────── Stage 4: Seeded ───────────────────────────

/// Pipeline state after seed generation.
#[must_use = "pipeline stages are consumed by advancing — call .grow() to continue"]
pub struct Seeded {
    stack: ChannelStack,
    smoothed: Luma32FImage,
    membrane: GrayImage,
    refined: GrayImage,
    seeds: SeedMap,
}

impl Seeded {
    /// The smoothed distance map the seeds were extracted from.
    #[must_use]
    pub const fn distance(&self) -> &Luma32FImage {
        &self.seeds.distance
    }

    /// The seed label map.
    #[must_use]
    pub const fn seeds(&self) -> &LabelImage {
        &self.seeds.labels
    }

    /// Number of distinct seeds.
    #[must_use]
    pub const fn seed_count(&self) -> u32 {
        self.seeds.count
    }

    /// Flood the seeds over the smoothed intensity surface.
    pub fn grow(self) -> Grown {
        let labels = crate::watershed::grow_regions(&self.smoothed, &self.seeds.labels);
        Grown {
            stack: self.stack,
            smoothed: self.smoothed,
            membrane: self.membrane,
            refined: self.refined,
            seeds: self.seeds,
            labels,
        }
    }
}

// ───────────────────────── Stage 5: Grown ────────────────────────────

/// Pipeline state after watershed region growing.
#[must_use = "pipeline stages are consumed by advancing — call .clean_borders() to continue"]
pub struct Grown {
    stack: ChannelStack,
    smoothed: Luma32FImage,
    membrane: GrayImage,
    refined: GrayImage,
    seeds: SeedMap,
    labels: LabelImage,
}

impl Grown {
    /// The raw full-coverage label map.
    #[must_use]
    pub const fn labels(&self) -> &LabelImage {
        &self.labels
    }

    /// Remove border-touching regions and compact the label range.
    pub fn clean_borders(self) -> Cleaned {
        let (clean, cell_count) = crate::border::clean_borders(&self.labels);
        Cleaned {
            stack: self.stack,
            smoothed: self.smoothed,
            membrane: self.membrane,
            refined: self.refined,
            seeds: self.seeds,
            labels: self.labels,
            clean,
            cell_count,
        }
    }
}

// ───────────────────────── Stage 6: Cleaned ──────────────────────────

/// Pipeline state after border cleaning.
#[must_use = "pipeline stages are consumed by advancing — call .extract_edges() to continue"]
pub struct Cleaned {
    stack: ChannelStack,
    smoothed: Luma32FImage,
    membrane: GrayImage,
    refined: GrayImage,
    seeds: SeedMap,
    labels: LabelImage,
    clean: LabelImage,
    cell_count: u32,
}

impl Cleaned {
    /// The clean label map (IDs `1..=N`, no border contact).
    #[must_use]
    pub const fn clean_labels(&self) -> &LabelImage {
        &self.clean
    }

    /// Number of surviving cells. Zero is valid: every region touched
    /// the border.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.cell_count
    }

    /// Extract each cell's one-pixel inner boundary.
    pub fn extract_edges(self) -> Edged {
        let edges = crate::edges::extract_edges(&self.clean);
        Edged {
            stack: self.stack,
            smoothed: self.smoothed,
            membrane: self.membrane,
            refined: self.refined,
            seeds: self.seeds,
            labels: self.labels,
            clean: self.clean,
            cell_count: self.cell_count,
            edges,
        }
    }
}

// ───────────────────────── Stage 7: Edged ────────────────────────────

/// Pipeline state after edge extraction.
#[must_use = "pipeline stages are consumed by advancing — call .measure() to continue"]
pub struct Edged {
    stack: ChannelStack,
    smoothed: Luma32FImage,
    membrane: GrayImage,
    refined: GrayImage,
    seeds: SeedMap,
    labels: LabelImage,
    clean: LabelImage,
    cell_count: u32,
    edges: LabelImage,
}

impl Edged {
    /// The edge map.
    #[must_use]
    pub const fn edge_map(&self) -> &LabelImage {
        &self.edges
    }

    /// Number of surviving cells.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.cell_count
    }

    /// Aggregate per-cell measurements from the original channels.
    pub fn measure(self) -> Measured {
        let measurements = crate::measure::measure_cells(&self.stack, &self.clean, &self.edges);
        Measured {
            stack: self.stack,
            smoothed: self.smoothed,
            membrane: self.membrane,
            refined: self.refined,
            seeds: self.seeds,
            labels: self.labels,
            clean: self.clean,
            edges: self.edges,
            measurements,
        }
    }
}

// ───────────────────────── Stage 8: Measured ─────────────────────────

/// Final pipeline state. Call [`into_result`](Self::into_result) to
/// extract the [`SegmentationResult`].
#[must_use = "call .into_result() to extract the SegmentationResult"]
pub struct Measured {
    stack: ChannelStack,
    smoothed: Luma32FImage,
    membrane: GrayImage,
    refined: GrayImage,
    seeds: SeedMap,
    labels: LabelImage,
    clean: LabelImage,
    edges: LabelImage,
    measurements: Vec<CellMeasurement>,
}

impl Measured {
    /// The measurement table, ascending cell-ID order.
    #[must_use]
    pub fn measurements(&self) -> &[CellMeasurement] {
        &self.measurements
    }

    /// The smoothed segmentation channel.
    #[must_use]
    pub const fn smoothed(&self) -> &Luma32FImage {
        &self.smoothed
    }

    /// The raw membrane mask from thresholding.
    #[must_use]
    pub const fn membrane(&self) -> &GrayImage {
        &self.membrane
    }

    /// The refined membrane mask.
    #[must_use]
    pub const fn refined(&self) -> &GrayImage {
        &self.refined
    }

    /// The smoothed distance map.
    #[must_use]
    pub const fn distance(&self) -> &Luma32FImage {
        &self.seeds.distance
    }

    /// The seed label map.
    #[must_use]
    pub const fn seeds(&self) -> &LabelImage {
        &self.seeds.labels
    }

    /// The raw (pre-cleaning) watershed label map.
    #[must_use]
    pub const fn raw_labels(&self) -> &LabelImage {
        &self.labels
    }

    /// Consume the pipeline and return the result.
    #[must_use]
    pub fn into_result(self) -> SegmentationResult {
        let dimensions = self.stack.dimensions();
        SegmentationResult {
            labels: self.clean,
            edges: self.edges,
            measurements: self.measurements,
            dimensions,
        }
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental segmentation pipeline.
///
/// Created via [`SegmentationPipeline::new`], which stores the stack
/// and config without doing any processing. The caller then chains
/// stage methods; see the [module docs](self) for the full chain.
pub struct SegmentationPipeline;

impl SegmentationPipeline {
    /// Create a new pipeline from an input stack and config.
    ///
    /// No processing is performed — call
    /// [`.smooth()`](Pending::smooth) to begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(stack: ChannelStack, config: SegmentationConfig) -> Pending {
        Pending { config, stack }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_scenes::two_ring_scene;

    #[test]
    fn chained_stages_match_one_shot() {
        let config = SegmentationConfig::default();
        let one_shot = crate::segment_and_measure(two_ring_scene(), &config).unwrap();

        let chained = SegmentationPipeline::new(two_ring_scene(), config)
            .smooth()
            .unwrap()
            .threshold()
            .refine()
            .seed()
            .unwrap()
            .grow()
            .clean_borders()
            .extract_edges()
            .measure()
            .into_result();

        assert_eq!(one_shot.labels.as_raw(), chained.labels.as_raw());
        assert_eq!(one_shot.edges.as_raw(), chained.edges.as_raw());
        assert_eq!(one_shot.measurements, chained.measurements);
    }

    #[test]
    fn accessors_expose_each_intermediate() {
        let stack = two_ring_scene();
        let dims = stack.dimensions();

        let pending = SegmentationPipeline::new(stack, SegmentationConfig::default());
        assert_eq!(pending.stack().dimensions(), dims);

        let smoothed = pending.smooth().unwrap();
        assert_eq!(smoothed.smoothed().width(), dims.width);

        let thresholded = smoothed.threshold();
        assert_eq!(thresholded.membrane().height(), dims.height);

        let refined = thresholded.refine();
        assert_eq!(refined.refined().width(), dims.width);

        let seeded = refined.seed().unwrap();
        assert!(seeded.seed_count() >= 2, "both rings should seed");
        assert_eq!(seeded.distance().width(), dims.width);
        assert_eq!(seeded.seeds().height(), dims.height);

        let grown = seeded.grow();
        assert!(grown.labels().pixels().all(|p| p.0[0] != 0));

        let cleaned = grown.clean_borders();
        assert_eq!(cleaned.cell_count(), 2);
        assert_eq!(cleaned.clean_labels().width(), dims.width);

        let edged = cleaned.extract_edges();
        assert_eq!(edged.edge_map().width(), dims.width);

        let measured = edged.measure();
        assert_eq!(measured.measurements().len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected_at_smooth() {
        let config = SegmentationConfig {
            segmentation_channel: 5,
            ..SegmentationConfig::default()
        };
        let result = SegmentationPipeline::new(two_ring_scene(), config).smooth();
        assert!(matches!(
            result,
            Err(SegmentationError::InvalidConfig(_))
        ));
    }
}
