//! Per-cell edge extraction.
//!
//! A cell's edge is its one-pixel inner boundary: the pixels that
//! disappear when the cell mask is eroded by one pixel with a cross
//! (4-connectivity) structuring element. Equivalently — and computed
//! this way, in one pass over the map — a cell pixel is an edge pixel
//! iff at least one of its 4-neighbors lies outside the cell.
//!
//! A one-pixel-wide cell erodes to nothing, so its edge equals its
//! whole mask. That is fine here; the measurement stage treats the
//! (theoretical) zero-edge case separately.

use crate::types::LabelImage;

/// Extract the edge map from a clean label map.
///
/// The output has the same ID space: edge pixels carry their cell's ID,
/// everything else is 0. Edge pixels are a subset of the cell's pixels.
#[must_use = "returns the edge map"]
pub fn extract_edges(labels: &LabelImage) -> LabelImage {
    let width = labels.width() as usize;
    let height = labels.height() as usize;
    let src = labels.as_raw();

    LabelImage::from_fn(labels.width(), labels.height(), |x, y| {
        let (x, y) = (x as usize, y as usize);
        let label = src[y * width + x];
        if label == 0 {
            return image::Luma([0]);
        }
        let interior = x > 0
            && src[y * width + x - 1] == label
            && x + 1 < width
            && src[y * width + x + 1] == label
            && y > 0
            && src[(y - 1) * width + x] == label
            && y + 1 < height
            && src[(y + 1) * width + x] == label;
        if interior {
            image::Luma([0])
        } else {
            image::Luma([label])
        }
    })
}
