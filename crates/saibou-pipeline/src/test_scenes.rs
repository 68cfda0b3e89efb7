//! Synthetic membrane-labeled scenes shared by tests.
//!
//! Real inputs are densely packed epithelia: bright membrane lines
//! enclosing dark interiors, with the membrane network running out to
//! the image border. The builders here draw miniature versions of that
//! geometry — rings (cells) plus stub lines tying them into the border
//! — so the full pipeline has realistic topology to chew on.

use crate::types::{ChannelStack, Luma32FImage};

const AMPLITUDE: f32 = 255.0;

/// Draw a circular membrane ring of the given center-line radius and
/// half-thickness.
pub(crate) fn draw_ring(plane: &mut Luma32FImage, cx: f32, cy: f32, radius: f32, half: f32) {
    for y in 0..plane.height() {
        for x in 0..plane.width() {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if (d - radius).abs() <= half {
                plane.put_pixel(x, y, image::Luma([AMPLITUDE]));
            }
        }
    }
}

/// Draw a horizontal membrane stub 3 pixels thick.
pub(crate) fn draw_stub(plane: &mut Luma32FImage, y: u32, x0: u32, x1: u32) {
    for yy in y.saturating_sub(1)..=(y + 1).min(plane.height() - 1) {
        for xx in x0..=x1.min(plane.width() - 1) {
            plane.put_pixel(xx, yy, image::Luma([AMPLITUDE]));
        }
    }
}

/// Two complete cells: membrane rings of radius 15 at (30,30) and
/// (70,70) on a 100x100 field, each tied to the border by a stub so the
/// membrane network reaches the image edge (as it does in real tissue).
pub(crate) fn two_ring_scene() -> ChannelStack {
    let mut plane = Luma32FImage::new(100, 100);
    draw_ring(&mut plane, 30.0, 30.0, 15.0, 1.5);
    draw_ring(&mut plane, 70.0, 70.0, 15.0, 1.5);
    draw_stub(&mut plane, 30, 0, 16);
    draw_stub(&mut plane, 70, 84, 99);
    ChannelStack::single(plane).unwrap_or_else(|_| unreachable!("plane is non-empty"))
}

/// Like [`two_ring_scene`], but the second ring is centered at (88,50)
/// so its interior runs into the right image border.
pub(crate) fn edge_touching_ring_scene() -> ChannelStack {
    let mut plane = Luma32FImage::new(100, 100);
    draw_ring(&mut plane, 30.0, 30.0, 15.0, 1.5);
    draw_ring(&mut plane, 88.0, 50.0, 15.0, 1.5);
    draw_stub(&mut plane, 30, 0, 16);
    ChannelStack::single(plane).unwrap_or_else(|_| unreachable!("plane is non-empty"))
}

/// Two-channel scene: channel 0 carries the membrane rings with a
/// filled interior on a dim background; channel 1 is a flat low value
/// everywhere.
pub(crate) fn filled_two_channel_scene() -> ChannelStack {
    let mut first = Luma32FImage::from_pixel(100, 100, image::Luma([50.0]));
    // Fill the cell interiors before drawing the rings on top.
    for y in 0..100u32 {
        for x in 0..100u32 {
            for (cx, cy) in [(30.0f32, 30.0f32), (70.0, 70.0)] {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if (dx * dx + dy * dy).sqrt() < 15.0 {
                    first.put_pixel(x, y, image::Luma([120.0]));
                }
            }
        }
    }
    draw_ring(&mut first, 30.0, 30.0, 15.0, 1.5);
    draw_ring(&mut first, 70.0, 70.0, 15.0, 1.5);
    draw_stub(&mut first, 30, 0, 16);
    draw_stub(&mut first, 70, 84, 99);

    let second = Luma32FImage::from_pixel(100, 100, image::Luma([8.0]));
    ChannelStack::from_channels(vec![first, second])
        .unwrap_or_else(|_| unreachable!("planes share dimensions"))
}
