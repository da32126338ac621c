use serde::Serialize;

use autosre_domain::{Catalog, HistorySample, MetricDefinition, MetricState};

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricStatus {
    Critical,
    Nominal,
}

impl MetricStatus {
    pub fn label(self) -> &'static str {
        match self {
            MetricStatus::Critical => "CRITICAL",
            MetricStatus::Nominal => "NOMINAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub id: String,
    pub label: String,
    pub value: String,
    pub threshold: String,
    pub status: MetricStatus,
    pub sparkline: String,
}

/// One row per catalog metric, in catalog order.
pub fn metric_rows(
    catalog: &Catalog,
    metrics: &MetricState,
    history: &[HistorySample],
) -> Vec<MetricRow> {
    catalog
        .metrics()
        .iter()
        .map(|def| row(def, metrics.get(&def.id).copied(), history))
        .collect()
}

fn row(def: &MetricDefinition, value: Option<f64>, history: &[HistorySample]) -> MetricRow {
    let status = match value {
        Some(value) if def.is_breached(value) => MetricStatus::Critical,
        _ => MetricStatus::Nominal,
    };
    let series: Vec<f64> = history
        .iter()
        .filter_map(|sample| sample.values.get(&def.id).copied())
        .collect();
    MetricRow {
        id: def.id.clone(),
        label: def.label.clone(),
        value: value
            .map(|value| def.format_value(value))
            .unwrap_or_else(|| "-".into()),
        threshold: def.format_value(def.threshold),
        status,
        sparkline: sparkline(&series, def.min, def.max),
    }
}

/// Render `values` scaled into `[min, max]` as block characters.
pub fn sparkline(values: &[f64], min: f64, max: f64) -> String {
    let span = max - min;
    values
        .iter()
        .map(|value| {
            if span <= 0.0 {
                return BARS[0];
            }
            let ratio = ((value - min) / span).clamp(0.0, 1.0);
            let index = (ratio * (BARS.len() - 1) as f64).round() as usize;
            BARS[index.min(BARS.len() - 1)]
        })
        .collect()
}
