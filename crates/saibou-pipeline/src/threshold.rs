//! Adaptive background-relative thresholding.
//!
//! Membrane signal rides on a slowly varying background (uneven
//! illumination, depth-dependent attenuation), so a single global
//! threshold either eats dim membranes or hallucinates bright interiors.
//! Instead every pixel is compared against the mean of its disk-shaped
//! neighborhood: pixels strictly brighter than their local background
//! are classified as membrane.
//!
//! Boundary policy: the neighborhood is clipped to the image bounds and
//! the mean is taken over the in-bounds subset only. Combined with the
//! strict `>` comparison this keeps flat regions (including a fully
//! uniform image) out of the mask — an all-false mask is the documented
//! outcome for degenerate input and surfaces downstream as
//! [`SegmentationError::NoMembrane`](crate::SegmentationError::NoMembrane).

use image::GrayImage;

use crate::types::Luma32FImage;

/// Classify membrane pixels by comparing the smoothed signal against a
/// local-mean background estimate.
///
/// `radius` is the radius of the disk neighborhood (radius 15 spans a
/// 31x31 bounding box). Returns a binary mask with membrane pixels at
/// 255 and everything else at 0.
#[must_use = "returns the membrane mask"]
pub fn adaptive_threshold(smoothed: &Luma32FImage, radius: u32) -> GrayImage {
    let background = local_disk_mean(smoothed, radius);
    let width = smoothed.width() as usize;
    let src = smoothed.as_raw();
    GrayImage::from_fn(smoothed.width(), smoothed.height(), |x, y| {
        let index = y as usize * width + x as usize;
        if f64::from(src[index]) > background[index] {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

/// Mean of the disk neighborhood around every pixel, clipped to the
/// image bounds.
///
/// Row prefix sums make each pixel cost one subtraction per covered
/// row instead of one addition per covered pixel.
fn local_disk_mean(plane: &Luma32FImage, radius: u32) -> Vec<f64> {
    let width = plane.width() as usize;
    let height = plane.height() as usize;
    let src = plane.as_raw();

    // pref[y][x] = sum of row y up to (exclusive) column x.
    let stride = width + 1;
    let mut pref = vec![0.0f64; stride * height];
    for y in 0..height {
        let mut acc = 0.0f64;
        for x in 0..width {
            acc += f64::from(src[y * width + x]);
            pref[y * stride + x + 1] = acc;
        }
    }

    // Horizontal half-width of the disk at each row offset.
    let r = i64::from(radius);
    let half_widths: Vec<i64> = (-r..=r)
        .map(|dy| (((r * r - dy * dy) as f64).sqrt().floor()) as i64)
        .collect();

    let mut means = vec![0.0f64; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f64;
            let mut count = 0i64;
            for (k, &hw) in half_widths.iter().enumerate() {
                let yy = y as i64 + k as i64 - r;
                if yy < 0 || yy >= height as i64 {
                    continue;
                }
                let x0 = (x as i64 - hw).max(0) as usize;
                let x1 = (x as i64 + hw).min(width as i64 - 1) as usize;
                sum += pref[yy as usize * stride + x1 + 1] - pref[yy as usize * stride + x0];
                count += (x1 - x0 + 1) as i64;
            }
            // The dy = 0 row always contributes at least the pixel itself.
            means[y * width + x] = sum / count as f64;
        }
    }
    means
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Luma32FImage;

    fn plane_from(values: &[f32], width: u32, height: u32) -> Luma32FImage {
        Luma32FImage::from_raw(width, height, values.to_vec()).unwrap()
    }

    #[test]
    fn uniform_plane_yields_empty_mask() {
        let plane = Luma32FImage::from_pixel(20, 20, image::Luma([37.0]));
        let mask = adaptive_threshold(&plane, 5);
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn all_zero_plane_yields_empty_mask() {
        let plane = Luma32FImage::new(16, 16);
        let mask = adaptive_threshold(&plane, 15);
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn bright_pixel_is_membrane() {
        let mut plane = Luma32FImage::new(11, 11);
        plane.put_pixel(5, 5, image::Luma([100.0]));
        let mask = adaptive_threshold(&plane, 3);
        assert_eq!(mask.get_pixel(5, 5).0[0], 255);
        // Far corner never sees the bright pixel: 0 > 0 is false.
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn bright_line_is_membrane() {
        let plane = Luma32FImage::from_fn(21, 21, |x, _y| {
            if x == 10 {
                image::Luma([200.0])
            } else {
                image::Luma([10.0])
            }
        });
        let mask = adaptive_threshold(&plane, 5);
        for y in 0..21 {
            assert_eq!(mask.get_pixel(10, y).0[0], 255, "line pixel at y={y}");
            assert_eq!(mask.get_pixel(2, y).0[0], 0, "background at y={y}");
        }
    }

    #[test]
    fn radius_one_uses_cross_neighborhood() {
        // 3x3 plane, radius 1: the disk degenerates to a cross, so the
        // center's background is the mean of itself and its 4-neighbors.
        let plane = plane_from(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 3, 3);
        let mask = adaptive_threshold(&plane, 1);
        // (1+3+4+5+7)/5 = 4 == center: strict comparison keeps it out.
        assert_eq!(mask.get_pixel(1, 1).0[0], 0);

        let spiked = plane_from(&[0.0, 1.0, 2.0, 3.0, 10.0, 5.0, 6.0, 7.0, 8.0], 3, 3);
        let mask = adaptive_threshold(&spiked, 1);
        // (1+3+10+5+7)/5 = 5.2 < 10.
        assert_eq!(mask.get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn mask_dimensions_match_input() {
        let plane = Luma32FImage::new(13, 7);
        let mask = adaptive_threshold(&plane, 15);
        assert_eq!(mask.width(), 13);
        assert_eq!(mask.height(), 7);
    }
}
