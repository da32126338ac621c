//! Single-slot remediation scheduler.
//!
//! Admission only happens while the slot is empty and admits at most one
//! alert per pass, so the in-progress invariant holds structurally.

use autosre_domain::{
    ActiveRemediation, AlertLog, Catalog, Event, EventLevel, Remediation, RemediationLog,
    RemediationStatus,
};

use crate::sequence::IdSequence;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemediationScheduler {
    active: Option<ActiveRemediation>,
}

impl RemediationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(active: Option<ActiveRemediation>) -> Self {
        Self { active }
    }

    pub fn active(&self) -> Option<&ActiveRemediation> {
        self.active.as_ref()
    }

    pub fn remediating_metric(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.metric_id.as_str())
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Admit the oldest active alert that has no remediation yet.
    ///
    /// Alerts whose metric or tool cannot be resolved are skipped for this
    /// pass and stay pending.
    pub fn admit(
        &mut self,
        catalog: &Catalog,
        alerts: &AlertLog,
        log: &mut RemediationLog,
        ids: &mut IdSequence,
        now: i64,
    ) -> Option<Event> {
        if !self.is_idle() || log.in_progress().is_some() {
            return None;
        }

        for alert in alerts.active() {
            if log.has_in_progress_for(&alert.id) {
                continue;
            }
            let Some(def) = catalog.metric(&alert.metric_id) else {
                tracing::warn!(
                    alert = %alert.id,
                    metric = %alert.metric_id,
                    "alert references unknown metric, skipping admission"
                );
                continue;
            };
            let Some(tool) = catalog.tool(&def.remediation_tool) else {
                tracing::warn!(
                    alert = %alert.id,
                    tool = %def.remediation_tool,
                    "metric references unknown tool, skipping admission"
                );
                continue;
            };

            let remediation = Remediation {
                id: ids.remediation_id(),
                alert_id: alert.id.clone(),
                metric_id: alert.metric_id.clone(),
                tool_name: tool.name.clone(),
                status: RemediationStatus::InProgress,
                timestamp: now,
                completed_at: None,
            };
            self.active = Some(ActiveRemediation {
                remediation_id: remediation.id.clone(),
                alert_id: alert.id.clone(),
                metric_id: alert.metric_id.clone(),
                tool_name: tool.name.clone(),
                description: tool.description.clone(),
                duration_ms: tool.duration_ms,
                progress: 0.0,
                breach_value: alert.value,
                alert_timestamp: alert.timestamp,
            });
            log.push(remediation);

            return Some(Event::at(
                EventLevel::Warn,
                format!("REMEDIATING: Triggering {}...", tool.name),
                now,
            ));
        }

        None
    }

    /// Advance the active remediation by `step_ms`. On completion the slot is
    /// emptied, the log entry is marked completed, and the finished run is
    /// returned.
    pub fn advance(
        &mut self,
        step_ms: u64,
        log: &mut RemediationLog,
        now: i64,
    ) -> Option<ActiveRemediation> {
        let active = self.active.as_mut()?;
        if !active.advance(step_ms) {
            return None;
        }
        let done = self.active.take()?;
        if let Some(entry) = log.get_mut(&done.remediation_id) {
            entry.complete(now);
        }
        Some(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosre_domain::{Alert, AlertStatus};

    fn active_alert(id: &str, metric: &str, timestamp: i64) -> Alert {
        Alert {
            id: id.into(),
            metric_id: metric.into(),
            label: metric.into(),
            value: 100.0,
            threshold: 80.0,
            status: AlertStatus::Active,
            timestamp,
            resolved_at: None,
            scenario: None,
        }
    }

    #[test]
    fn admits_oldest_alert_only() {
        let catalog = Catalog::default();
        let mut alerts = AlertLog::default();
        alerts.push(active_alert("alert-1-cpu", "cpu", 10));
        alerts.push(active_alert("alert-2-memory", "memory", 20));
        let mut log = RemediationLog::default();
        let mut ids = IdSequence::new(3);
        let mut scheduler = RemediationScheduler::new();

        let event = scheduler
            .admit(&catalog, &alerts, &mut log, &mut ids, 30)
            .expect("admitted");
        assert_eq!(event.message, "REMEDIATING: Triggering Service Restarter...");
        assert_eq!(scheduler.remediating_metric(), Some("cpu"));

        assert!(scheduler.admit(&catalog, &alerts, &mut log, &mut ids, 31).is_none());
        assert_eq!(log.in_progress_count(), 1);
    }

    #[test]
    fn skips_alerts_with_unknown_metric() {
        let catalog = Catalog::default();
        let mut alerts = AlertLog::default();
        alerts.push(active_alert("alert-1-gpu", "gpu", 10));
        alerts.push(active_alert("alert-2-disk", "disk", 20));
        let mut log = RemediationLog::default();
        let mut ids = IdSequence::new(3);
        let mut scheduler = RemediationScheduler::new();

        scheduler.admit(&catalog, &alerts, &mut log, &mut ids, 30);
        let active = scheduler.active().expect("active");
        assert_eq!(active.alert_id, "alert-2-disk");
        assert_eq!(active.tool_name, "Log Rotator");
    }

    #[test]
    fn completes_after_tool_duration() {
        let catalog = Catalog::default();
        let mut alerts = AlertLog::default();
        alerts.push(active_alert("alert-1-memory", "memory", 10));
        let mut log = RemediationLog::default();
        let mut ids = IdSequence::new(2);
        let mut scheduler = RemediationScheduler::new();
        scheduler.admit(&catalog, &alerts, &mut log, &mut ids, 30);

        // Cache Cleaner: 2500 ms at 50 ms per step.
        for step in 1..50 {
            assert!(scheduler.advance(50, &mut log, 30 + step * 50).is_none());
        }
        let done = scheduler.advance(50, &mut log, 2_530).expect("done");
        assert_eq!(done.tool_name, "Cache Cleaner");
        assert!(scheduler.is_idle());

        let entry = log.iter().next().expect("entry");
        assert_eq!(entry.status, RemediationStatus::Completed);
        assert_eq!(entry.completed_at, Some(2_530));
        assert!(scheduler.advance(50, &mut log, 2_580).is_none());
    }
}
