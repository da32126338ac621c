use chrono::DateTime;

use autosre_domain::{Alert, Catalog, Event, Stats};

fn clock(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".into())
}

/// `[12:00:01] WARNING REMEDIATING: Triggering Cache Cleaner...`
pub fn event_line(event: &Event) -> String {
    format!(
        "[{}] {:<7} {}",
        clock(event.timestamp),
        event.level.as_str().to_uppercase(),
        event.message
    )
}

pub fn alert_line(alert: &Alert, catalog: &Catalog) -> String {
    let (value, threshold) = match catalog.metric(&alert.metric_id) {
        Some(def) => (def.format_value(alert.value), def.format_value(alert.threshold)),
        None => (alert.value.to_string(), alert.threshold.to_string()),
    };
    let status = if alert.is_active() { "ACTIVE" } else { "RESOLVED" };
    let mut line = format!(
        "[{}] {:<8} {} {} ({} >= {})",
        clock(alert.timestamp),
        status,
        alert.id,
        alert.label,
        value,
        threshold
    );
    if let Some(scenario) = &alert.scenario {
        line.push_str(&format!(" [{}]", scenario.name));
    }
    line
}

pub fn stats_line(stats: &Stats) -> String {
    let last_fix = stats
        .last_fix_time
        .map(clock)
        .unwrap_or_else(|| "never".into());
    format!(
        "Resolved: {} | Uptime: {} | Time saved: {}m | Last fix: {}",
        stats.incidents_resolved, stats.uptime_label, stats.time_saved_minutes, last_fix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosre_domain::{AlertStatus, EventLevel, builtin_scenarios};

    #[test]
    fn event_line_uses_utc_clock() {
        let event = Event::at(EventLevel::Warn, "REMEDIATING: Triggering Log Rotator...", 3_723_000);
        assert_eq!(
            event_line(&event),
            "[01:02:03] WARNING REMEDIATING: Triggering Log Rotator..."
        );
    }

    #[test]
    fn alert_line_shows_scenario() {
        let alert = Alert {
            id: "alert-000001-cpu".into(),
            metric_id: "cpu".into(),
            label: "CPU Usage".into(),
            value: 100.0,
            threshold: 80.0,
            status: AlertStatus::Active,
            timestamp: 0,
            resolved_at: None,
            scenario: builtin_scenarios().into_iter().next(),
        };
        let line = alert_line(&alert, &Catalog::default());
        assert!(line.starts_with("[00:00:00] ACTIVE"));
        assert!(line.contains("(100% >= 80%)"));
        assert!(line.ends_with("[CPU_SPIKE]"));
    }

    #[test]
    fn stats_line_without_fixes() {
        let line = stats_line(&Stats::default());
        assert_eq!(
            line,
            "Resolved: 0 | Uptime: 99.99% | Time saved: 0m | Last fix: never"
        );
    }
}
