//! Border-cell removal and contiguous relabeling.
//!
//! A region that touches the outermost pixel ring is almost certainly a
//! truncated cell, so it is dropped from the segmentation. Survivors
//! are renumbered to a gapless `1..=N` range, preserving ascending
//! original-ID order.
//!
//! The whole decision — which labels die, and the old-to-new mapping —
//! is computed from a read-only scan before any pixel is rewritten, and
//! the rewrite produces a fresh map in a single pass. Label 0 is
//! background, never a cell, and is left untouched.

use crate::types::LabelImage;

/// Remove border-touching regions and compact the surviving labels.
///
/// Returns the clean label map and the number of surviving cells. Zero
/// survivors is a valid outcome, distinct from the error conditions
/// that abort the pipeline.
#[must_use = "returns the clean label map and surviving cell count"]
pub fn clean_borders(labels: &LabelImage) -> (LabelImage, u32) {
    let width = labels.width() as usize;
    let height = labels.height() as usize;
    let src = labels.as_raw();

    let max_label = src.iter().max().copied().unwrap_or(0) as usize;
    if max_label == 0 {
        return (labels.clone(), 0);
    }

    // One pass: which labels exist, and which touch the border ring.
    let mut present = vec![false; max_label + 1];
    for &label in src {
        present[label as usize] = true;
    }
    let mut touches_border = vec![false; max_label + 1];
    for x in 0..width {
        touches_border[src[x] as usize] = true;
        touches_border[src[(height - 1) * width + x] as usize] = true;
    }
    for y in 0..height {
        touches_border[src[y * width] as usize] = true;
        touches_border[src[y * width + width - 1] as usize] = true;
    }

    // Old ID -> new ID, ascending original order; dropped labels map to 0.
    let mut mapping = vec![0u32; max_label + 1];
    let mut next = 0u32;
    for label in 1..=max_label {
        if present[label] && !touches_border[label] {
            next += 1;
            mapping[label] = next;
        }
    }

    let clean = LabelImage::from_fn(labels.width(), labels.height(), |x, y| {
        image::Luma([mapping[src[y as usize * width + x as usize] as usize]])
    });
    (clean, next)
}
