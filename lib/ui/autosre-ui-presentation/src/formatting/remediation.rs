use autosre_domain::{ActiveRemediation, Postmortem};

/// `[##########----------]  50%`
pub fn progress_bar(percent: f64, width: usize) -> String {
    let percent = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}

pub fn remediation_line(active: &ActiveRemediation) -> String {
    format!(
        "{} {} {}",
        active.tool_name,
        progress_bar(active.percent(), 20),
        active.description
    )
}

pub fn postmortem_lines(report: &Postmortem) -> Vec<String> {
    vec![
        format!("POSTMORTEM {} (incident {})", report.id, report.incident_id),
        format!("  Metric:      {}", report.metric_label),
        format!("  Impact:      {}", report.impact),
        format!("  Root cause:  {}", report.rca),
        format!("  Remediation: {}", report.remediation),
        format!("  Duration:    {}s", report.duration_seconds),
    ]
}
