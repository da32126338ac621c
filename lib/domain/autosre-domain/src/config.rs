//! Simulator configuration loaded from YAML.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, MetricDefinition, Tool};

pub const DEFAULT_CONFIG_FILE: &str = "autosre-config.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSavedRange {
    pub min: u64,
    pub max: u64,
}

impl Default for TimeSavedRange {
    fn default() -> Self {
        Self { min: 15, max: 45 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub tick_interval_ms: u64,
    pub progress_step_ms: u64,
    pub history_capacity: usize,
    pub alert_capacity: usize,
    pub remediation_capacity: usize,
    pub log_capacity: usize,
    pub time_saved_minutes: TimeSavedRange,
    pub auto_pilot: bool,
    pub seed: Option<u64>,
    pub snapshot_path: Option<PathBuf>,
    pub metrics: Option<Vec<MetricDefinition>>,
    pub tools: Option<Vec<Tool>>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1500,
            progress_step_ms: 50,
            history_capacity: 30,
            alert_capacity: 100,
            remediation_capacity: 50,
            log_capacity: 50,
            time_saved_minutes: TimeSavedRange::default(),
            auto_pilot: false,
            seed: None,
            snapshot_path: None,
            metrics: None,
            tools: None,
        }
    }
}

impl SimulatorConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config = Self::from_yaml(&raw)
            .with_context(|| format!("invalid config at {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw).context("failed to parse config yaml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 || self.progress_step_ms == 0 {
            bail!("tick_interval_ms and progress_step_ms must be non-zero");
        }
        if self.time_saved_minutes.min > self.time_saved_minutes.max {
            bail!(
                "time_saved_minutes.min ({}) exceeds max ({})",
                self.time_saved_minutes.min,
                self.time_saved_minutes.max
            );
        }
        Ok(())
    }

    /// Resolve the catalog, falling back to the built-in metrics and tools.
    pub fn catalog(&self) -> Result<Catalog> {
        let metrics = self.metrics.clone().unwrap_or_else(Catalog::default_metrics);
        let tools = self.tools.clone().unwrap_or_else(Catalog::default_tools);
        Catalog::new(metrics, tools).context("invalid metric catalog")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = SimulatorConfig::load_from_path(&dir.path().join("absent.yaml"))
            .expect("defaults");
        assert_eq!(config, SimulatorConfig::default());
        assert_eq!(config.tick_interval_ms, 1500);
        assert_eq!(config.progress_step_ms, 50);
    }

    #[test]
    fn yaml_overrides_selected_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "tick_interval_ms: 500\nauto_pilot: true\nseed: 7\ntime_saved_minutes:\n  min: 1\n  max: 2"
        )
        .expect("write");
        let config = SimulatorConfig::load_from_path(file.path()).expect("load");
        assert_eq!(config.tick_interval_ms, 500);
        assert!(config.auto_pilot);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.time_saved_minutes, TimeSavedRange { min: 1, max: 2 });
        assert_eq!(config.history_capacity, 30);
    }

    #[test]
    fn rejects_inverted_time_saved_range() {
        let raw = "time_saved_minutes:\n  min: 50\n  max: 10\n";
        assert!(SimulatorConfig::from_yaml(raw).is_err());
    }

    #[test]
    fn custom_catalog_is_validated() {
        let raw = r##"
metrics:
  - id: queue
    label: Queue Depth
    unit: msgs
    min: 0
    max: 100
    threshold: 60
    color: "#ffffff"
    remediation_tool: Drainer
"##;
        let config = SimulatorConfig::from_yaml(raw).expect("parse");
        assert!(config.catalog().is_err());

        let with_tool = format!(
            "{raw}tools:\n  - name: Drainer\n    description: Draining queue...\n    duration_ms: 1000\n"
        );
        let config = SimulatorConfig::from_yaml(&with_tool).expect("parse");
        let catalog = config.catalog().expect("catalog");
        assert_eq!(catalog.metrics().len(), 1);
        assert_eq!(catalog.tool("Drainer").map(|t| t.duration_ms), Some(1000));
    }
}
