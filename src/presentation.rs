//! Terminal output for the `sonde` binary.
//!
//! - `format`: byte, number and relative-time formatting.
//! - `render`: plain-text dashboard, tables and charts.

pub mod format;
pub mod render;

pub use format::{format_bytes, format_number, time_ago, title_case};
