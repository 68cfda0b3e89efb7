//! Marker-driven watershed region growing.
//!
//! Floods outward from the labeled seeds across the smoothed intensity
//! surface, always expanding the globally lowest-elevation frontier
//! pixel first. Cell interiors are intensity basins and membranes are
//! ridges, so competing floods meet — and the region boundary settles —
//! along the membrane crest between two seeds.
//!
//! Determinism: the frontier is a binary heap ordered by elevation
//! (`f32::total_cmp`), with insertion age as the tie-break, so equal
//! elevations resolve first-in-first-out. A pixel is labeled at the
//! moment it is queued and each pixel is queued exactly once; the
//! output therefore depends only on the inputs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::types::{LabelImage, Luma32FImage};

/// Frontier entry: elevation first, age as FIFO tie-break.
struct Frontier {
    elevation: f32,
    age: u64,
    index: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.elevation
            .total_cmp(&other.elevation)
            .then_with(|| self.age.cmp(&other.age))
    }
}

/// Grow the labeled seed regions over the elevation surface until every
/// pixel carries a label.
///
/// `elevation` and `seeds` must have identical dimensions. Seed pixels
/// keep their labels; every other pixel receives the label of the flood
/// that reaches it first under minimum-elevation-first ordering
/// (4-connectivity).
#[must_use = "returns the full-image label map"]
pub fn grow_regions(elevation: &Luma32FImage, seeds: &LabelImage) -> LabelImage {
    let width = elevation.width() as usize;
    let height = elevation.height() as usize;
    let surface = elevation.as_raw();

    let mut labels: Vec<u32> = seeds.as_raw().clone();
    let mut heap: BinaryHeap<Reverse<Frontier>> = BinaryHeap::new();
    let mut age = 0u64;

    for (index, &label) in labels.iter().enumerate() {
        if label != 0 {
            heap.push(Reverse(Frontier {
                elevation: surface[index],
                age,
                index,
            }));
            age += 1;
        }
    }

    while let Some(Reverse(entry)) = heap.pop() {
        let label = labels[entry.index];
        let x = entry.index % width;
        let y = entry.index / width;

        let mut claim = |index: usize, heap: &mut BinaryHeap<Reverse<Frontier>>| {
            if labels[index] == 0 {
                labels[index] = label;
                heap.push(Reverse(Frontier {
                    elevation: surface[index],
                    age,
                    index,
                }));
                age += 1;
            }
        };
        if x > 0 {
            claim(entry.index - 1, &mut heap);
        }
        if x + 1 < width {
            claim(entry.index + 1, &mut heap);
        }
        if y > 0 {
            claim(entry.index - width, &mut heap);
        }
        if y + 1 < height {
            claim(entry.index + width, &mut heap);
        }
    }

    LabelImage::from_fn(elevation.width(), elevation.height(), |x, y| {
        image::Luma([labels[y as usize * width + x as usize]])
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn every_pixel_receives_a_label() {
        let elevation = Luma32FImage::from_fn(9, 9, |x, y| image::Luma([(x + y) as f32]));
        let mut seeds = LabelImage::new(9, 9);
        seeds.put_pixel(0, 0, image::Luma([1]));
        let labels = grow_regions(&elevation, &seeds);
        assert!(labels.pixels().all(|p| p.0[0] == 1));
    }

    #[test]
    fn ridge_separates_two_basins() {
        // Elevation rises to a crest at x = 4; seeds sit in the two
        // valleys. Each flood should claim its own side.
        let profile = [0.0f32, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0];
        let elevation = Luma32FImage::from_fn(9, 5, |x, _y| image::Luma([profile[x as usize]]));
        let mut seeds = LabelImage::new(9, 5);
        seeds.put_pixel(1, 2, image::Luma([1]));
        seeds.put_pixel(7, 2, image::Luma([2]));

        let labels = grow_regions(&elevation, &seeds);
        for y in 0..5 {
            for x in 0..4 {
                assert_eq!(labels.get_pixel(x, y).0[0], 1, "left basin at ({x},{y})");
            }
            for x in 5..9 {
                assert_eq!(labels.get_pixel(x, y).0[0], 2, "right basin at ({x},{y})");
            }
        }
        // The crest column belongs to exactly one flood.
        for y in 0..5 {
            assert_ne!(labels.get_pixel(4, y).0[0], 0);
        }
    }

    #[test]
    fn seed_pixels_keep_their_labels() {
        let elevation = Luma32FImage::from_pixel(5, 5, image::Luma([1.0]));
        let mut seeds = LabelImage::new(5, 5);
        seeds.put_pixel(0, 0, image::Luma([3]));
        seeds.put_pixel(4, 4, image::Luma([7]));
        let labels = grow_regions(&elevation, &seeds);
        assert_eq!(labels.get_pixel(0, 0).0[0], 3);
        assert_eq!(labels.get_pixel(4, 4).0[0], 7);
    }

    #[test]
    fn growth_is_deterministic() {
        let elevation = Luma32FImage::from_fn(20, 20, |x, y| {
            image::Luma([((x * 7 + y * 13) % 17) as f32])
        });
        let mut seeds = LabelImage::new(20, 20);
        seeds.put_pixel(3, 3, image::Luma([1]));
        seeds.put_pixel(16, 16, image::Luma([2]));
        seeds.put_pixel(3, 16, image::Luma([3]));

        let first = grow_regions(&elevation, &seeds);
        let second = grow_regions(&elevation, &seeds);
        assert_eq!(first.as_raw(), second.as_raw());
    }
}
