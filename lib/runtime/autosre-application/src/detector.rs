//! Level-triggered threshold detection.

use autosre_domain::{Alert, AlertLog, AlertStatus, Catalog, Event, EventLevel, MetricState};

use crate::sequence::IdSequence;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Detection {
    pub opened: Vec<String>,
    pub resolved: Vec<String>,
    pub events: Vec<Event>,
}

/// Open one alert per newly breached metric and resolve alerts whose metric
/// is back under threshold.
pub fn evaluate(
    catalog: &Catalog,
    metrics: &MetricState,
    alerts: &mut AlertLog,
    ids: &mut IdSequence,
    now: i64,
) -> Detection {
    let mut detection = Detection::default();

    for def in catalog.metrics() {
        let Some(&value) = metrics.get(&def.id) else {
            continue;
        };

        if def.is_breached(value) {
            if alerts.active_for(&def.id).is_some() {
                continue;
            }
            let alert = Alert {
                id: ids.alert_id(&def.id),
                metric_id: def.id.clone(),
                label: def.label.clone(),
                value,
                threshold: def.threshold,
                status: AlertStatus::Active,
                timestamp: now,
                resolved_at: None,
                scenario: None,
            };
            detection.events.push(Event::at(
                EventLevel::Error,
                format!("ALERT: {} critical at {}", def.label, def.format_value(value)),
                now,
            ));
            detection.opened.push(alert.id.clone());
            alerts.push(alert);
        } else if let Some(alert) = alerts.active_for_mut(&def.id) {
            alert.resolve(now);
            detection.resolved.push(alert.id.clone());
            detection.events.push(Event::at(
                EventLevel::Success,
                format!("NORMAL: {} recovered to {}", def.label, def.format_value(value)),
                now,
            ));
        }
    }

    detection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pairs: &[(&str, f64)]) -> MetricState {
        pairs.iter().map(|(id, v)| (id.to_string(), *v)).collect()
    }

    #[test]
    fn opens_once_per_breach() {
        let catalog = Catalog::default();
        let mut alerts = AlertLog::default();
        let mut ids = IdSequence::default();
        let metrics = state(&[("cpu", 95.0), ("memory", 40.0)]);

        let first = evaluate(&catalog, &metrics, &mut alerts, &mut ids, 1_000);
        assert_eq!(first.opened.len(), 1);
        assert_eq!(first.events[0].message, "ALERT: CPU Usage critical at 95%");

        let second = evaluate(&catalog, &metrics, &mut alerts, &mut ids, 2_500);
        assert!(second.opened.is_empty());
        assert_eq!(alerts.active().count(), 1);
    }

    #[test]
    fn threshold_is_inclusive() {
        let catalog = Catalog::default();
        let mut alerts = AlertLog::default();
        let mut ids = IdSequence::default();
        let detection = evaluate(&catalog, &state(&[("cpu", 80.0)]), &mut alerts, &mut ids, 0);
        assert_eq!(detection.opened.len(), 1);
    }

    #[test]
    fn resolves_when_back_under_threshold() {
        let catalog = Catalog::default();
        let mut alerts = AlertLog::default();
        let mut ids = IdSequence::default();
        evaluate(&catalog, &state(&[("cpu", 95.0)]), &mut alerts, &mut ids, 1_000);
        let detection = evaluate(&catalog, &state(&[("cpu", 60.0)]), &mut alerts, &mut ids, 4_000);

        assert_eq!(detection.resolved.len(), 1);
        let alert = alerts.iter().next().cloned().expect("alert");
        assert_eq!(alert.status, AlertStatus::Resolved);
        assert_eq!(alert.resolved_at, Some(4_000));
        assert_eq!(detection.events[0].level, EventLevel::Success);

        // A fresh breach opens a new, distinct alert.
        let again = evaluate(&catalog, &state(&[("cpu", 85.0)]), &mut alerts, &mut ids, 5_500);
        assert_eq!(again.opened.len(), 1);
        assert_ne!(again.opened[0], alert.id);
        assert_eq!(alerts.len(), 2);
    }
}
