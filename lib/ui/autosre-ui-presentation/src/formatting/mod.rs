//! Shared formatting helpers used by the CLI.

mod logs;
mod metrics;
mod remediation;

pub use logs::{alert_line, event_line, stats_line};
pub use metrics::{MetricRow, MetricStatus, metric_rows, sparkline};
pub use remediation::{postmortem_lines, progress_bar, remediation_line};
