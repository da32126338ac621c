use serde::{Deserialize, Serialize};

use crate::catalog::MetricId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remediation {
    pub id: String,
    pub alert_id: String,
    #[serde(default)]
    pub metric_id: MetricId,
    pub tool_name: String,
    pub status: RemediationStatus,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl Remediation {
    pub fn is_in_progress(&self) -> bool {
        self.status == RemediationStatus::InProgress
    }

    pub fn complete(&mut self, now: i64) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        self.status = RemediationStatus::Completed;
        self.completed_at = Some(now.max(self.timestamp));
        true
    }
}

/// The single remediation currently executing, with its progress counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRemediation {
    pub remediation_id: String,
    pub alert_id: String,
    pub metric_id: MetricId,
    pub tool_name: String,
    pub description: String,
    pub duration_ms: u64,
    /// Percentage, may overshoot 100 on the final step.
    pub progress: f64,
    pub breach_value: f64,
    pub alert_timestamp: i64,
}

impl ActiveRemediation {
    /// Advance by one progress step, returning `true` once complete.
    pub fn advance(&mut self, step_ms: u64) -> bool {
        self.progress += step_ms as f64 / self.duration_ms.max(1) as f64 * 100.0;
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }

    pub fn percent(&self) -> f64 {
        self.progress.clamp(0.0, 100.0)
    }
}

/// Remediation log in creation order, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationLog {
    entries: Vec<Remediation>,
    capacity: usize,
}

impl RemediationLog {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn from_entries(entries: Vec<Remediation>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        for entry in entries {
            log.push(entry);
        }
        log
    }

    pub fn push(&mut self, remediation: Remediation) {
        while self.entries.len() >= self.capacity {
            let index = self
                .entries
                .iter()
                .position(|existing| !existing.is_in_progress())
                .unwrap_or(0);
            self.entries.remove(index);
        }
        self.entries.push(remediation);
    }

    pub fn in_progress(&self) -> Option<&Remediation> {
        self.entries.iter().find(|entry| entry.is_in_progress())
    }

    pub fn in_progress_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_in_progress()).count()
    }

    pub fn has_in_progress_for(&self, alert_id: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.is_in_progress() && entry.alert_id == alert_id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Remediation> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Remediation> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Remediation> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Remediation> {
        self.entries.clone()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for RemediationLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
