//! Gaussian smoothing for floating-point planes.
//!
//! The raw membrane signal is noisy at the pixel scale; smoothing it
//! before thresholding and region growing keeps the background estimate
//! and the watershed elevation surface stable. The same routine smooths
//! the distance map during seed generation.
//!
//! Implemented as a separable convolution over `f32` samples: the
//! integer-raster blur in `imageproc` clamps to the `u8` range, which
//! would corrupt unnormalized intensity data, so the float planes get
//! their own kernel here. The kernel is truncated at three sigma and
//! normalized; samples beyond the image edge replicate the border
//! pixel.

use crate::types::Luma32FImage;

/// Apply Gaussian smoothing to a floating-point plane.
///
/// Higher `sigma` values produce more smoothing. Non-positive sigma
/// values return the plane unchanged.
#[must_use = "returns the smoothed plane"]
pub fn gaussian_smooth(plane: &Luma32FImage, sigma: f32) -> Luma32FImage {
    if sigma <= 0.0 {
        return plane.clone();
    }

    let kernel = gaussian_kernel(sigma);
    let width = plane.width() as usize;
    let height = plane.height() as usize;
    let src = plane.as_raw();

    // Horizontal pass, then vertical pass over the intermediate.
    let mut horizontal = vec![0.0f32; width * height];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            horizontal[y * width + x] = convolve_line(row, x, width, &kernel);
        }
    }

    let mut out = vec![0.0f32; width * height];
    let mut column = vec![0.0f32; height];
    for x in 0..width {
        for (y, value) in column.iter_mut().enumerate() {
            *value = horizontal[y * width + x];
        }
        for y in 0..height {
            out[y * width + x] = convolve_line(&column, y, height, &kernel);
        }
    }

    Luma32FImage::from_fn(plane.width(), plane.height(), |x, y| {
        image::Luma([out[y as usize * width + x as usize]])
    })
}

/// Normalized 1D Gaussian kernel truncated at three sigma.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as i64;
    let two_sigma_sq = f64::from(2.0 * sigma * sigma);
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / two_sigma_sq).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel.iter().map(|&w| w as f32).collect()
}

/// Convolve one sample of a line with the kernel, replicating the
/// endpoints beyond the line's bounds.
fn convolve_line(line: &[f32], center: usize, len: usize, kernel: &[f32]) -> f32 {
    let radius = (kernel.len() / 2) as i64;
    let mut acc = 0.0f64;
    for (k, &weight) in kernel.iter().enumerate() {
        let offset = k as i64 - radius;
        let index = (center as i64 + offset).clamp(0, len as i64 - 1) as usize;
        acc += f64::from(line[index]) * f64::from(weight);
    }
    acc as f32
}
