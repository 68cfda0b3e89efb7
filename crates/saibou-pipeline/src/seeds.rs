//! Seed generation from the distance transform.
//!
//! Every interior pixel's distance to the nearest membrane pixel peaks
//! near cell centers, so the local maxima of the (smoothed) distance
//! map make good markers for region growing. Smoothing merges clusters
//! of nearby maxima that belong to one cell; the remaining maxima are
//! labeled into connected components so that adjacent peak pixels act
//! as a single seed.
//!
//! A flat distance plateau can still produce several disconnected
//! maxima inside one true cell. That over-seeding is an accepted
//! approximation of this approach and is not corrected here.

use image::GrayImage;
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::smooth::gaussian_smooth;
use crate::types::{LabelImage, Luma32FImage, SegmentationError};

/// Output of seed generation.
#[derive(Debug, Clone)]
pub struct SeedMap {
    /// Smoothed distance-to-membrane map the maxima were taken from.
    pub distance: Luma32FImage,
    /// Seed label map: unique positive ID per seed cluster, 0 elsewhere.
    pub labels: LabelImage,
    /// Number of distinct seeds.
    pub count: u32,
}

/// Generate watershed seeds from a refined membrane mask.
///
/// `seed_sigma` smooths the distance map before maxima extraction
/// (non-positive skips smoothing); `min_separation` is the half-width
/// of the square window a maximum must dominate.
///
/// # Errors
///
/// Returns [`SegmentationError::NoMembrane`] if the mask classifies no
/// pixel as membrane (degenerate input: there is nothing to measure
/// distances against) and [`SegmentationError::NoSeeds`] if no strictly
/// positive local maximum exists (the membrane covers everything).
pub fn generate_seeds(
    membrane: &GrayImage,
    seed_sigma: f32,
    min_separation: u32,
) -> Result<SeedMap, SegmentationError> {
    if membrane.pixels().all(|p| p.0[0] == 0) {
        return Err(SegmentationError::NoMembrane);
    }

    // Distance of every pixel to the nearest membrane pixel; membrane
    // pixels themselves are at distance zero.
    let squared = euclidean_squared_distance_transform(membrane);
    let distance = Luma32FImage::from_fn(membrane.width(), membrane.height(), |x, y| {
        image::Luma([squared.get_pixel(x, y).0[0].sqrt() as f32])
    });
    let distance = gaussian_smooth(&distance, seed_sigma);

    let peaks = local_maxima(&distance, min_separation);
    let labels = connected_components(&peaks, Connectivity::Four, image::Luma([0u8]));
    let count = labels.as_raw().iter().max().copied().unwrap_or(0);
    if count == 0 {
        return Err(SegmentationError::NoSeeds);
    }

    Ok(SeedMap {
        distance,
        labels,
        count,
    })
}

/// Strictly positive pixels that equal the maximum of the
/// `(2 * separation + 1)` square window centered on them.
///
/// The window maximum is computed separably (rows, then columns), so
/// the cost is linear in the window half-width rather than its area.
fn local_maxima(distance: &Luma32FImage, separation: u32) -> GrayImage {
    let width = distance.width() as usize;
    let height = distance.height() as usize;
    let d = separation as usize;
    let src = distance.as_raw();

    let mut row_max = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            let x0 = x.saturating_sub(d);
            let x1 = (x + d).min(width - 1);
            let mut best = f32::MIN;
            for xx in x0..=x1 {
                best = best.max(src[y * width + xx]);
            }
            row_max[y * width + x] = best;
        }
    }

    GrayImage::from_fn(distance.width(), distance.height(), |x, y| {
        let (x, y) = (x as usize, y as usize);
        let y0 = y.saturating_sub(d);
        let y1 = (y + d).min(height - 1);
        let mut best = f32::MIN;
        for yy in y0..=y1 {
            best = best.max(row_max[yy * width + x]);
        }
        let value = src[y * width + x];
        if value > 0.0 && value >= best {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}
