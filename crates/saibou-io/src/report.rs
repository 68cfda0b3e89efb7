//! Result rendering and serialization.
//!
//! `render_label_map` turns a label map into a color PNG for eyeball
//! checks: background stays black and each cell ID gets a fixed hue
//! from a golden-angle wheel, so the same segmentation always renders
//! the same colors.
//!
//! `measurements_to_csv` is a pure serializer — it returns a `String`
//! and performs no I/O. One row per cell; per-channel columns are
//! expanded (`interior_mean_0`, `interior_mean_1`, ...). Undefined edge
//! means (degenerate cells) serialize as `NaN`.

use std::fmt::Write as _;
use std::path::Path;

use image::RgbImage;
use saibou_pipeline::{CellMeasurement, LabelImage};

use crate::loader::IoError;

/// Golden angle in degrees; consecutive IDs land far apart on the hue
/// wheel.
const GOLDEN_ANGLE: f32 = 137.508;

/// Render a label map as a color image: black background, one fixed
/// color per cell ID.
#[must_use = "returns the rendered image"]
pub fn render_label_map(labels: &LabelImage) -> RgbImage {
    RgbImage::from_fn(labels.width(), labels.height(), |x, y| {
        let label = labels.get_pixel(x, y).0[0];
        if label == 0 {
            image::Rgb([0, 0, 0])
        } else {
            let hue = (label as f32 * GOLDEN_ANGLE) % 360.0;
            image::Rgb(hsv_to_rgb(hue, 0.75, 1.0))
        }
    })
}

/// Convert HSV (h in degrees, s and v in `[0, 1]`) to 8-bit RGB.
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}

/// Serialize a measurement table to CSV.
///
/// `channel_count` controls how many per-channel columns the header
/// declares; every record is expected to carry that many means.
#[must_use = "returns the CSV text"]
pub fn measurements_to_csv(measurements: &[CellMeasurement], channel_count: usize) -> String {
    let mut out = String::from("cell_id");
    for c in 0..channel_count {
        let _ = write!(out, ",interior_mean_{c}");
    }
    for c in 0..channel_count {
        let _ = write!(out, ",edge_mean_{c}");
    }
    out.push_str(",area,edge_length,edge_degenerate\n");

    for cell in measurements {
        let _ = write!(out, "{}", cell.cell_id);
        for c in 0..channel_count {
            let value = cell.interior_mean.get(c).copied().unwrap_or(f64::NAN);
            let _ = write!(out, ",{value:.6}");
        }
        for c in 0..channel_count {
            let value = cell.edge_mean.get(c).copied().unwrap_or(f64::NAN);
            let _ = write!(out, ",{value:.6}");
        }
        let _ = writeln!(
            out,
            ",{},{},{}",
            cell.area, cell.edge_length, cell.edge_degenerate
        );
    }
    out
}

/// Render a label map and write it as a PNG file.
///
/// # Errors
///
/// Returns [`IoError::Codec`] if PNG encoding fails and
/// [`IoError::File`] if the file cannot be written.
pub fn write_label_map_png(path: &Path, labels: &LabelImage) -> Result<(), IoError> {
    let rendered = render_label_map(labels);
    rendered.save(path)?;
    Ok(())
}

/// Serialize a measurement table and write it as a CSV file.
///
/// # Errors
///
/// Returns [`IoError::File`] if the file cannot be written.
pub fn write_measurements_csv(
    path: &Path,
    measurements: &[CellMeasurement],
    channel_count: usize,
) -> Result<(), IoError> {
    std::fs::write(path, measurements_to_csv(measurements, channel_count))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(cell_id: u32) -> CellMeasurement {
        CellMeasurement {
            cell_id,
            interior_mean: vec![10.5, 20.25],
            edge_mean: vec![30.0, 40.0],
            area: 100,
            edge_length: 36,
            edge_degenerate: false,
        }
    }

    #[test]
    fn background_renders_black_and_cells_render_distinct() {
        let labels = LabelImage::from_fn(4, 1, |x, _y| image::Luma([x]));
        let rendered = render_label_map(&labels);
        assert_eq!(rendered.get_pixel(0, 0).0, [0, 0, 0]);
        let first = rendered.get_pixel(1, 0).0;
        let second = rendered.get_pixel(2, 0).0;
        let third = rendered.get_pixel(3, 0).0;
        assert_ne!(first, [0, 0, 0]);
        assert_ne!(first, second);
        assert_ne!(second, third);
    }

    #[test]
    fn rendering_is_deterministic() {
        let labels = LabelImage::from_fn(8, 8, |x, y| image::Luma([(x + y) % 5]));
        let first = render_label_map(&labels);
        let second = render_label_map(&labels);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn csv_has_header_and_one_row_per_cell() {
        let table = measurements_to_csv(&[record(1), record(2)], 2);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "cell_id,interior_mean_0,interior_mean_1,edge_mean_0,edge_mean_1,\
             area,edge_length,edge_degenerate",
        );
        assert_eq!(
            lines[1],
            "1,10.500000,20.250000,30.000000,40.000000,100,36,false",
        );
    }

    #[test]
    fn degenerate_edge_means_serialize_as_nan() {
        let cell = CellMeasurement {
            cell_id: 1,
            interior_mean: vec![5.0],
            edge_mean: vec![f64::NAN],
            area: 1,
            edge_length: 0,
            edge_degenerate: true,
        };
        let table = measurements_to_csv(&[cell], 1);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[1], "1,5.000000,NaN,1,0,true");
    }

    #[test]
    fn empty_table_is_just_the_header() {
        let table = measurements_to_csv(&[], 1);
        assert_eq!(
            table,
            "cell_id,interior_mean_0,edge_mean_0,area,edge_length,edge_degenerate\n",
        );
    }
}
