use serde::{Deserialize, Serialize};

/// Incident summary produced once per completed remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Postmortem {
    pub id: String,
    pub incident_id: String,
    pub metric_label: String,
    pub impact: String,
    pub rca: String,
    pub remediation: String,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub incidents_resolved: u64,
    /// Cosmetic, never computed.
    pub uptime_label: String,
    pub last_fix_time: Option<i64>,
    pub time_saved_minutes: u64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            incidents_resolved: 0,
            uptime_label: "99.99%".into(),
            last_fix_time: None,
            time_saved_minutes: 0,
        }
    }
}
