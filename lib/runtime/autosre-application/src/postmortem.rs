use autosre_domain::{ActiveRemediation, Alert, MetricDefinition, Postmortem, Stats, TimeSavedRange};

use crate::rng::SimRng;
use crate::sequence::postmortem_id;

pub fn default_rca(metric_id: &str) -> String {
    let cause = match metric_id {
        "cpu" => "runaway compute task",
        "memory" => "uncollected garbage",
        _ => "resource exhaustion",
    };
    format!("Threshold breach detected. Likely cause: {cause}.")
}

/// Build the report for a finished run. `alert` is the triggering alert when
/// it is still in the log; its scenario, if any, supplies the root cause.
pub fn build(
    done: &ActiveRemediation,
    def: Option<&MetricDefinition>,
    alert: Option<&Alert>,
    now: i64,
) -> Postmortem {
    let metric_label = def
        .map(|def| def.label.clone())
        .or_else(|| alert.map(|alert| alert.label.clone()))
        .unwrap_or_else(|| done.metric_id.clone());
    let impact = match def {
        Some(def) => def.format_value(done.breach_value),
        None => format!("{}", done.breach_value),
    };
    let rca = alert
        .and_then(|alert| alert.scenario.as_ref())
        .map(|scenario| scenario.rca.clone())
        .unwrap_or_else(|| default_rca(&done.metric_id));
    let elapsed_ms = (now - done.alert_timestamp).max(0);

    Postmortem {
        id: postmortem_id(&done.remediation_id),
        incident_id: done.alert_id.clone(),
        metric_label,
        impact,
        rca,
        remediation: done.tool_name.clone(),
        duration_seconds: (elapsed_ms as f64 / 1000.0).round() as u64,
    }
}

/// Count a resolved incident. Returns the minutes credited.
pub fn record_resolution(
    stats: &mut Stats,
    rng: &mut SimRng,
    range: TimeSavedRange,
    now: i64,
) -> u64 {
    let saved = rng.int_inclusive(range.min as i64, range.max as i64).max(0) as u64;
    stats.incidents_resolved = stats.incidents_resolved.saturating_add(1);
    stats.last_fix_time = Some(now);
    stats.time_saved_minutes = stats.time_saved_minutes.saturating_add(saved);
    saved
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosre_domain::{AlertStatus, Catalog, Scenario, builtin_scenarios};

    fn finished(metric: &str, breach_value: f64) -> ActiveRemediation {
        ActiveRemediation {
            remediation_id: "rem-000004".into(),
            alert_id: format!("alert-000003-{metric}"),
            metric_id: metric.into(),
            tool_name: "Service Restarter".into(),
            description: String::new(),
            duration_ms: 3000,
            progress: 100.0,
            breach_value,
            alert_timestamp: 10_000,
        }
    }

    fn alert_with(scenario: Option<Scenario>) -> Alert {
        Alert {
            id: "alert-000003-cpu".into(),
            metric_id: "cpu".into(),
            label: "CPU Usage".into(),
            value: 100.0,
            threshold: 80.0,
            status: AlertStatus::Active,
            timestamp: 10_000,
            resolved_at: None,
            scenario,
        }
    }

    #[test]
    fn default_report_uses_generated_rca() {
        let catalog = Catalog::default();
        let done = finished("cpu", 100.0);
        let report = build(&done, catalog.metric("cpu"), Some(&alert_with(None)), 13_600);

        assert_eq!(report.id, "pm-000004");
        assert_eq!(report.incident_id, "alert-000003-cpu");
        assert_eq!(report.metric_label, "CPU Usage");
        assert_eq!(report.impact, "100%");
        assert_eq!(
            report.rca,
            "Threshold breach detected. Likely cause: runaway compute task."
        );
        assert_eq!(report.remediation, "Service Restarter");
        assert_eq!(report.duration_seconds, 4);
    }

    #[test]
    fn scenario_rca_overrides_default() {
        let catalog = Catalog::default();
        let scenario = builtin_scenarios().into_iter().next().expect("scenario");
        let report = build(
            &finished("cpu", 100.0),
            catalog.metric("cpu"),
            Some(&alert_with(Some(scenario.clone()))),
            11_000,
        );
        assert_eq!(report.rca, scenario.rca);
    }

    #[test]
    fn rca_defaults_per_metric() {
        assert!(default_rca("memory").contains("uncollected garbage"));
        assert!(default_rca("disk").contains("resource exhaustion"));
    }

    #[test]
    fn resolution_updates_counters() {
        let mut stats = Stats::default();
        let mut rng = SimRng::seeded(1);
        let saved = record_resolution(&mut stats, &mut rng, TimeSavedRange::default(), 99);
        assert!((15..=45).contains(&saved));
        assert_eq!(stats.incidents_resolved, 1);
        assert_eq!(stats.time_saved_minutes, saved);
        assert_eq!(stats.last_fix_time, Some(99));
    }
}
