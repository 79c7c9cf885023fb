//! Health report analysis.
//!
//! Takes an uploaded CSV with a header row, computes per-metric means for the
//! four recognized columns, classifies each against fixed thresholds, and
//! renders the recognized series on one shared line chart.

pub mod analyzer;
pub mod chart;

pub use analyzer::{analyze_csv, Analysis, Metric, MetricSeries, MetricStatus};
pub use chart::render_chart;
