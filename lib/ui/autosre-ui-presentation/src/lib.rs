//! Presentation helpers shared by terminal surfaces.

pub mod formatting;

pub use formatting::{
    MetricRow, MetricStatus, alert_line, event_line, metric_rows, postmortem_lines, progress_bar,
    remediation_line, sparkline, stats_line,
};
