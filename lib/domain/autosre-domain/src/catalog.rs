//! Static metric and remediation tool catalog.
//!
//! The catalog is loaded once and never mutated. Every component looks up
//! bounds, thresholds and tool durations here by id.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

pub type MetricId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: MetricId,
    pub label: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub threshold: f64,
    pub color: String,
    pub remediation_tool: String,
}

impl MetricDefinition {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Value the being-remediated mode converges toward.
    pub fn safe_target(&self) -> f64 {
        self.min + 5.0
    }

    pub fn is_breached(&self, value: f64) -> bool {
        value >= self.threshold
    }

    /// `"100%"`, `"80.42%"`, `"512ms"`.
    pub fn format_value(&self, value: f64) -> String {
        if value.fract() == 0.0 {
            format!("{value:.0}{}", self.unit)
        } else {
            format!("{value:.2}{}", self.unit)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    metrics: Vec<MetricDefinition>,
    tools: BTreeMap<String, Tool>,
}

impl Catalog {
    /// Build a catalog, rejecting definitions that would break the alert model.
    pub fn new(metrics: Vec<MetricDefinition>, tools: Vec<Tool>) -> Result<Self> {
        let tools: BTreeMap<String, Tool> = tools
            .into_iter()
            .map(|tool| (tool.name.clone(), tool))
            .collect();

        let mut seen = BTreeSet::new();
        for metric in &metrics {
            if !seen.insert(metric.id.as_str()) {
                bail!("duplicate metric id in catalog: {}", metric.id);
            }
            if !(metric.min < metric.threshold && metric.threshold <= metric.max) {
                bail!(
                    "metric {} must satisfy min < threshold <= max (got {} / {} / {})",
                    metric.id,
                    metric.min,
                    metric.threshold,
                    metric.max
                );
            }
            if !tools.contains_key(&metric.remediation_tool) {
                bail!(
                    "metric {} references unknown remediation tool: {}",
                    metric.id,
                    metric.remediation_tool
                );
            }
        }
        for tool in tools.values() {
            if tool.duration_ms == 0 {
                bail!("tool {} must have a non-zero duration", tool.name);
            }
        }

        Ok(Self { metrics, tools })
    }

    pub fn metrics(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    pub fn metric(&self, id: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|metric| metric.id == id)
    }

    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    pub fn default_metrics() -> Vec<MetricDefinition> {
        vec![
            metric("cpu", "CPU Usage", "%", 10.0, 100.0, 80.0, "#3b82f6", "Service Restarter"),
            metric("memory", "Memory Usage", "%", 20.0, 100.0, 75.0, "#a855f7", "Cache Cleaner"),
            metric("disk", "Disk Usage", "%", 30.0, 100.0, 90.0, "#eab308", "Log Rotator"),
            metric("latency", "API Latency", "ms", 50.0, 1000.0, 500.0, "#10b981", "Load Balancer"),
            metric(
                "error_rate",
                "Error Rate",
                "%",
                0.0,
                20.0,
                5.0,
                "#ef4444",
                "Deployment Rollback",
            ),
            metric(
                "traffic",
                "Traffic Load",
                "req/s",
                100.0,
                5000.0,
                4000.0,
                "#f97316",
                "Auto-Scaler",
            ),
        ]
    }

    pub fn default_tools() -> Vec<Tool> {
        vec![
            tool(
                "Service Restarter",
                "Restarting system services to clear CPU hang...",
                3000,
            ),
            tool("Cache Cleaner", "Purging transient caches and heap memory...", 2500),
            tool("Log Rotator", "Compressing and archiving old system logs...", 4000),
            tool("Load Balancer", "Re-routing traffic to healthy nodes...", 3500),
            tool(
                "Deployment Rollback",
                "Reverting to the last stable production build...",
                5000,
            ),
            tool("Auto-Scaler", "Provisioning new instances for high load...", 6000),
        ]
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            metrics: Self::default_metrics(),
            tools: Self::default_tools()
                .into_iter()
                .map(|tool| (tool.name.clone(), tool))
                .collect(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn metric(
    id: &str,
    label: &str,
    unit: &str,
    min: f64,
    max: f64,
    threshold: f64,
    color: &str,
    remediation_tool: &str,
) -> MetricDefinition {
    MetricDefinition {
        id: id.into(),
        label: label.into(),
        unit: unit.into(),
        min,
        max,
        threshold,
        color: color.into(),
        remediation_tool: remediation_tool.into(),
    }
}

fn tool(name: &str, description: &str, duration_ms: u64) -> Tool {
    Tool {
        name: name.into(),
        description: description.into(),
        duration_ms,
    }
}
