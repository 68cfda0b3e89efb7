//! Binary cleanup of the membrane mask.
//!
//! Two sequential repairs, both preserving the membrane = 255 /
//! interior = 0 convention:
//!
//! 1. **Hole filling** — bright noise pixels inside a cell interior get
//!    classified as membrane and would fragment the interior. Inverting
//!    the mask, filling enclosed holes of the interior, and inverting
//!    back removes every membrane component that is not connected to
//!    the image border (4-connectivity, matching the flood used by the
//!    hole filler).
//! 2. **Morphological closing** — a disk structuring element bridges
//!    small gaps in membrane lines so cells stay sealed. The mask is
//!    reflect-padded by `radius + 1` before closing and cropped after:
//!    closing against a hard array edge treats the outside as interior
//!    and erodes real membrane segments near the border.

use image::GrayImage;

/// Refine a membrane mask: fill interior holes, then close membrane
/// gaps with a disk of the given radius.
#[must_use = "returns the refined mask"]
pub fn refine_mask(membrane: &GrayImage, closing_radius: u32) -> GrayImage {
    let filled = invert(&fill_holes(&invert(membrane)));

    let pad = closing_radius + 1;
    let padded = pad_reflect(&filled, pad);
    let offsets = disk_offsets(closing_radius);
    let closed = erode(&dilate(&padded, &offsets), &offsets);
    crop(&closed, pad, membrane.width(), membrane.height())
}

/// Fill enclosed holes of a binary mask's foreground.
///
/// Background pixels that cannot reach the image border through other
/// background pixels (4-connectivity) become foreground.
fn fill_holes(mask: &GrayImage) -> GrayImage {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let src = mask.as_raw();

    // Flood the background from every border pixel; what the flood
    // never reaches is a hole.
    let mut reached = vec![false; width * height];
    let mut stack: Vec<usize> = Vec::new();
    let push = |index: usize, stack: &mut Vec<usize>, reached: &mut Vec<bool>| {
        if src[index] == 0 && !reached[index] {
            reached[index] = true;
            stack.push(index);
        }
    };
    for x in 0..width {
        push(x, &mut stack, &mut reached);
        push((height - 1) * width + x, &mut stack, &mut reached);
    }
    for y in 0..height {
        push(y * width, &mut stack, &mut reached);
        push(y * width + width - 1, &mut stack, &mut reached);
    }
    while let Some(index) = stack.pop() {
        let x = index % width;
        let y = index / width;
        if x > 0 {
            push(index - 1, &mut stack, &mut reached);
        }
        if x + 1 < width {
            push(index + 1, &mut stack, &mut reached);
        }
        if y > 0 {
            push(index - width, &mut stack, &mut reached);
        }
        if y + 1 < height {
            push(index + width, &mut stack, &mut reached);
        }
    }

    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let index = y as usize * width + x as usize;
        if src[index] != 0 || !reached[index] {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

fn invert(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] == 0 {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

/// Offsets of a disk structuring element: all `(dx, dy)` with
/// `dx^2 + dy^2 <= radius^2`.
fn disk_offsets(radius: u32) -> Vec<(i64, i64)> {
    let r = i64::from(radius);
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

fn dilate(mask: &GrayImage, offsets: &[(i64, i64)]) -> GrayImage {
    let width = mask.width() as i64;
    let height = mask.height() as i64;
    let w = mask.width() as usize;
    let src = mask.as_raw();
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let hit = offsets.iter().any(|&(dx, dy)| {
            let xx = i64::from(x) + dx;
            let yy = i64::from(y) + dy;
            xx >= 0 && xx < width && yy >= 0 && yy < height && src[yy as usize * w + xx as usize] != 0
        });
        if hit { image::Luma([255]) } else { image::Luma([0]) }
    })
}

fn erode(mask: &GrayImage, offsets: &[(i64, i64)]) -> GrayImage {
    let width = mask.width() as i64;
    let height = mask.height() as i64;
    let w = mask.width() as usize;
    let src = mask.as_raw();
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let full = offsets.iter().all(|&(dx, dy)| {
            let xx = i64::from(x) + dx;
            let yy = i64::from(y) + dy;
            xx >= 0 && xx < width && yy >= 0 && yy < height && src[yy as usize * w + xx as usize] != 0
        });
        if full { image::Luma([255]) } else { image::Luma([0]) }
    })
}

/// Reflect-pad a mask by `pad` pixels on every side (mirror without
/// repeating the edge sample).
fn pad_reflect(mask: &GrayImage, pad: u32) -> GrayImage {
    let width = mask.width();
    let height = mask.height();
    GrayImage::from_fn(width + 2 * pad, height + 2 * pad, |x, y| {
        let sx = reflect_index(i64::from(x) - i64::from(pad), i64::from(width));
        let sy = reflect_index(i64::from(y) - i64::from(pad), i64::from(height));
        *mask.get_pixel(sx, sy)
    })
}

/// Map a possibly out-of-range coordinate into `[0, len)` by mirror
/// reflection about the endpoints.
fn reflect_index(mut index: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    index = index.rem_euclid(period);
    if index >= len {
        index = period - index;
    }
    index as u32
}

fn crop(mask: &GrayImage, pad: u32, width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| *mask.get_pixel(x + pad, y + pad))
}
