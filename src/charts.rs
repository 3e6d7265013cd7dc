//! Time-bucketed aggregate series for the chart sinks.
//!
//! Components:
//! - `types`: time ranges and the series shapes handed to a renderer.
//! - `series_builder`: bucketing of buffered records and protocol breakdowns.

pub mod series_builder;
pub mod types;

pub use series_builder::{protocol_distribution, ChartSeriesBuilder};
pub use types::{ChartSeries, DistributionSlice, Series, TimeRange};
