//! Persisted engine state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::events::Event;
use crate::metrics::{HistorySample, MetricState};
use crate::remediation::{ActiveRemediation, Remediation};
use crate::report::Stats;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume a run. Absent fields fall back to defaults so
/// older or hand-edited snapshots still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub version: u32,
    pub metrics: MetricState,
    pub history: Vec<HistorySample>,
    pub alerts: Vec<Alert>,
    pub remediations: Vec<Remediation>,
    /// Newest first.
    pub logs: Vec<Event>,
    pub stats: Stats,
    pub active: Option<ActiveRemediation>,
    pub next_seq: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            metrics: MetricState::new(),
            history: Vec::new(),
            alerts: Vec::new(),
            remediations: Vec::new(),
            logs: Vec::new(),
            stats: Stats::default(),
            active: None,
            next_seq: 1,
        }
    }
}

impl Snapshot {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed to parse snapshot")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize snapshot")
    }
}
