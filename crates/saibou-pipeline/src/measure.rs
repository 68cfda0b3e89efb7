//! Per-cell measurement aggregation.
//!
//! Statistics are taken from the ORIGINAL (unsmoothed) channels: the
//! smoothed image exists for mask building and region growing only, and
//! must not bias intensity readouts. One accumulation pass over the
//! label and edge maps collects per-cell, per-channel sums and counts;
//! records are then emitted in ascending cell-ID order, so the table's
//! row order is stable across runs.
//!
//! A cell with no edge pixels cannot have a defined edge mean. That
//! cell is kept — its edge means become `NaN` and the record is flagged
//! `edge_degenerate` — so one odd cell never discards a whole image's
//! measurements.

use crate::types::{CellMeasurement, ChannelStack, LabelImage};

/// Aggregate measurements for every cell in the clean label map.
///
/// `labels` must be a clean label map (contiguous IDs `1..=N`) and
/// `edges` its matching edge map; both must share the stack's
/// dimensions.
#[must_use = "returns the measurement table"]
pub fn measure_cells(
    stack: &ChannelStack,
    labels: &LabelImage,
    edges: &LabelImage,
) -> Vec<CellMeasurement> {
    let label_data = labels.as_raw();
    let edge_data = edges.as_raw();
    let channel_count = stack.channel_count();

    let cell_count = label_data.iter().max().copied().unwrap_or(0) as usize;
    if cell_count == 0 {
        return Vec::new();
    }

    let mut area = vec![0u64; cell_count];
    let mut edge_length = vec![0u64; cell_count];
    // Flat [cell][channel] accumulators.
    let mut interior_sum = vec![0.0f64; cell_count * channel_count];
    let mut edge_sum = vec![0.0f64; cell_count * channel_count];

    for (channel_index, channel) in stack.channels().iter().enumerate() {
        let samples = channel.as_raw();
        for (pixel_index, &label) in label_data.iter().enumerate() {
            if label == 0 {
                continue;
            }
            let cell = (label - 1) as usize;
            let value = f64::from(samples[pixel_index]);
            interior_sum[cell * channel_count + channel_index] += value;
            if channel_index == 0 {
                area[cell] += 1;
            }
            if edge_data[pixel_index] == label {
                edge_sum[cell * channel_count + channel_index] += value;
                if channel_index == 0 {
                    edge_length[cell] += 1;
                }
            }
        }
    }

    (0..cell_count)
        .map(|cell| {
            let interior_mean: Vec<f64> = (0..channel_count)
                .map(|c| interior_sum[cell * channel_count + c] / area[cell] as f64)
                .collect();
            let degenerate = edge_length[cell] == 0;
            let edge_mean: Vec<f64> = (0..channel_count)
                .map(|c| {
                    if degenerate {
                        f64::NAN
                    } else {
                        edge_sum[cell * channel_count + c] / edge_length[cell] as f64
                    }
                })
                .collect();
            CellMeasurement {
                cell_id: u32::try_from(cell + 1).unwrap_or(u32::MAX),
                interior_mean,
                edge_mean,
                area: area[cell],
                edge_length: edge_length[cell],
                edge_degenerate: degenerate,
            }
        })
        .collect()
}
