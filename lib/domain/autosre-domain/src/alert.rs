//! Alert lifecycle records.
//!
//! An alert is opened when a metric reaches its threshold and transitions
//! exactly once to `Resolved`. The log keeps at most one active alert per
//! metric; the detector and the injection path both go through
//! [`AlertLog::active_for`] before opening a new one.

use serde::{Deserialize, Serialize};

use crate::catalog::MetricId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Resolved,
}

/// Caller-supplied incident narrative for a forced breach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub metric: MetricId,
    pub rca: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub metric_id: MetricId,
    pub label: String,
    pub value: f64,
    pub threshold: f64,
    pub status: AlertStatus,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    /// Returns `false` when the alert was already resolved.
    pub fn resolve(&mut self, now: i64) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = AlertStatus::Resolved;
        // Clock skew must not produce a resolution before the breach.
        self.resolved_at = Some(now.max(self.timestamp));
        true
    }
}

/// Alert log in creation order, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertLog {
    alerts: Vec<Alert>,
    capacity: usize,
}

impl AlertLog {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new(capacity: usize) -> Self {
        Self {
            alerts: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn from_alerts(alerts: Vec<Alert>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        for alert in alerts {
            log.push(alert);
        }
        log
    }

    /// Append, evicting the oldest resolved alert (or the oldest alert if
    /// every entry is still active) once the log is full.
    pub fn push(&mut self, alert: Alert) {
        while self.alerts.len() >= self.capacity {
            let index = self
                .alerts
                .iter()
                .position(|existing| !existing.is_active())
                .unwrap_or(0);
            self.alerts.remove(index);
        }
        self.alerts.push(alert);
    }

    pub fn active_for(&self, metric_id: &str) -> Option<&Alert> {
        self.alerts
            .iter()
            .find(|alert| alert.is_active() && alert.metric_id == metric_id)
    }

    pub fn active_for_mut(&mut self, metric_id: &str) -> Option<&mut Alert> {
        self.alerts
            .iter_mut()
            .find(|alert| alert.is_active() && alert.metric_id == metric_id)
    }

    /// Active alerts in creation order.
    pub fn active(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|alert| alert.is_active())
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|alert| alert.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Alert> {
        self.alerts.iter_mut().find(|alert| alert.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Alert> {
        self.alerts.clone()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Incident narratives offered by the operator console.
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "CPU_SPIKE".into(),
            metric: "cpu".into(),
            rca: "Runaway background process found in container cluster_A. Process was \
                  consuming 98% of assigned cycles due to infinite loop in legacy middleware."
                .into(),
        },
        Scenario {
            name: "MEM_LEAK".into(),
            metric: "memory".into(),
            rca: "Memory leak detected in API gateway. Buffer was not being released after \
                  large payload processing in the networking layer."
                .into(),
        },
        Scenario {
            name: "NET_STORM".into(),
            metric: "latency".into(),
            rca: "Recursive DNS lookup loop discovered. A misconfigured route caused infinite \
                  retries, flooding the internal network bridge."
                .into(),
        },
    ]
}
