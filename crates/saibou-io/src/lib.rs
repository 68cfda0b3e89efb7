//! saibou-io: file I/O around the pure segmentation pipeline.
//!
//! Loads microscopy images (TIFF, PNG) into the pipeline's
//! [`ChannelStack`](saibou_pipeline::ChannelStack) input type, and
//! writes results back out: a color-rendered label map PNG for human
//! inspection and a CSV measurement table for analysis.
//!
//! The pipeline crate never calls into this one — all dependencies
//! point inward.

pub mod loader;
pub mod report;

pub use loader::{IoError, decode_channels, load_channels};
pub use report::{measurements_to_csv, render_label_map, write_label_map_png, write_measurements_csv};
