//! The owned simulation engine.
//!
//! All mutation funnels through four entry points, each of which ends with a
//! snapshot save:
//! - [`Engine::tick`]: fluctuate → detect → schedule.
//! - [`Engine::advance_remediation`]: progress → complete → report → schedule.
//! - [`Engine::trigger_incident`]: explicit override.
//! - [`Engine::reset`]: wipe state and the persisted snapshot.

use std::collections::BTreeSet;

use serde::Serialize;

use autosre_domain::{
    ActiveRemediation, Alert, AlertLog, AlertStatus, Catalog, Event, EventBus, EventLevel,
    HistoryBuffer, HistorySample, MetricDefinition, MetricState, Postmortem, Remediation,
    RemediationLog, SNAPSHOT_VERSION, Scenario, SimulatorConfig, Snapshot, Stats, TimeSavedRange,
};
use autosre_ports::PortSet;

use crate::detector;
use crate::error::EngineError;
use crate::fluctuation::{self, FluctuationMode};
use crate::postmortem;
use crate::rng::SimRng;
use crate::scheduler::RemediationScheduler;
use crate::sequence::IdSequence;

const INIT_MESSAGE: &str = "Auto SRE Emulator Kernel initialized. Nodes standing by.";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub history_capacity: usize,
    pub alert_capacity: usize,
    pub remediation_capacity: usize,
    pub log_capacity: usize,
    pub time_saved: TimeSavedRange,
    pub auto_pilot: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&SimulatorConfig::default())
    }
}

impl From<&SimulatorConfig> for EngineSettings {
    fn from(config: &SimulatorConfig) -> Self {
        Self {
            history_capacity: config.history_capacity,
            alert_capacity: config.alert_capacity,
            remediation_capacity: config.remediation_capacity,
            log_capacity: config.log_capacity,
            time_saved: config.time_saved_minutes,
            auto_pilot: config.auto_pilot,
        }
    }
}

/// What a single fluctuation tick changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub alerts_opened: Vec<String>,
    pub alerts_resolved: Vec<String>,
    /// Remediation id admitted during this tick.
    pub admitted: Option<String>,
}

/// Owned read-only copy of everything a presentation layer may show.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineView {
    pub metrics: MetricState,
    pub history: Vec<HistorySample>,
    pub alerts: Vec<Alert>,
    pub remediations: Vec<Remediation>,
    pub active: Option<ActiveRemediation>,
    /// Newest first.
    pub logs: Vec<Event>,
    pub stats: Stats,
    pub last_postmortem: Option<Postmortem>,
    pub auto_pilot: bool,
}

pub struct Engine {
    catalog: Catalog,
    settings: EngineSettings,
    ports: PortSet,
    rng: SimRng,
    metrics: MetricState,
    history: HistoryBuffer,
    alerts: AlertLog,
    remediations: RemediationLog,
    events: EventBus,
    stats: Stats,
    scheduler: RemediationScheduler,
    ids: IdSequence,
    last_postmortem: Option<Postmortem>,
    auto_pilot: bool,
}

impl Engine {
    /// Load state from the snapshot port, seeding fresh state when nothing is
    /// stored or the stored snapshot is unreadable.
    pub fn load(catalog: Catalog, settings: EngineSettings, ports: PortSet, rng: SimRng) -> Self {
        let mut engine = Self {
            history: HistoryBuffer::new(settings.history_capacity),
            alerts: AlertLog::new(settings.alert_capacity),
            remediations: RemediationLog::new(settings.remediation_capacity),
            events: EventBus::new(settings.log_capacity),
            auto_pilot: settings.auto_pilot,
            catalog,
            settings,
            ports,
            rng,
            metrics: MetricState::new(),
            stats: Stats::default(),
            scheduler: RemediationScheduler::new(),
            ids: IdSequence::default(),
            last_postmortem: None,
        };

        match engine.ports.store.load() {
            Ok(Some(snapshot)) => engine.restore(snapshot),
            Ok(None) => engine.seed_fresh(),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "discarding unreadable snapshot");
                if let Err(clear_err) = engine.ports.store.clear() {
                    tracing::error!(error = %format!("{clear_err:#}"), "failed to clear snapshot");
                }
                engine.seed_fresh();
                engine.emit(
                    EventLevel::Warn,
                    "Persisted state was unreadable and has been discarded.",
                );
            }
        }

        engine.persist();
        engine
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &MetricState {
        &self.metrics
    }

    pub fn value(&self, metric_id: &str) -> Option<f64> {
        self.metrics.get(metric_id).copied()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn remediations(&self) -> &RemediationLog {
        &self.remediations
    }

    pub fn active_remediation(&self) -> Option<&ActiveRemediation> {
        self.scheduler.active()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn last_postmortem(&self) -> Option<&Postmortem> {
        self.last_postmortem.as_ref()
    }

    pub fn is_auto_pilot(&self) -> bool {
        self.auto_pilot
    }

    pub fn view(&self) -> EngineView {
        EngineView {
            metrics: self.metrics.clone(),
            history: self.history.to_vec(),
            alerts: self.alerts.to_vec(),
            remediations: self.remediations.to_vec(),
            active: self.scheduler.active().cloned(),
            logs: self.events.to_vec(),
            stats: self.stats.clone(),
            last_postmortem: self.last_postmortem.clone(),
            auto_pilot: self.auto_pilot,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            metrics: self.metrics.clone(),
            history: self.history.to_vec(),
            alerts: self.alerts.to_vec(),
            remediations: self.remediations.to_vec(),
            logs: self.events.to_vec(),
            stats: self.stats.clone(),
            active: self.scheduler.active().cloned(),
            next_seq: self.ids.peek(),
        }
    }

    pub fn tick(&mut self) -> TickReport {
        let now = self.now();
        self.fluctuate(now);

        let detection = detector::evaluate(
            &self.catalog,
            &self.metrics,
            &mut self.alerts,
            &mut self.ids,
            now,
        );
        for event in detection.events {
            self.record(event);
        }

        let admitted = self.schedule(now);
        self.persist();

        TickReport {
            alerts_opened: detection.opened,
            alerts_resolved: detection.resolved,
            admitted,
        }
    }

    /// Advance the active remediation by one progress step. Returns the
    /// postmortem when this step completed it.
    pub fn advance_remediation(&mut self, step_ms: u64) -> Option<Postmortem> {
        let now = self.now();
        let done = self
            .scheduler
            .advance(step_ms, &mut self.remediations, now)?;
        let def = self.catalog.metric(&done.metric_id).cloned();

        if let Some(def) = &def {
            let current = self.metrics.get(&def.id).copied().unwrap_or(def.min);
            self.metrics
                .insert(def.id.clone(), fluctuation::settle(def, current));
        }
        self.emit(
            EventLevel::Success,
            format!("SUCCESS: {} execution finished.", done.tool_name),
        );

        let resolved_here = self
            .alerts
            .get_mut(&done.alert_id)
            .map(|alert| alert.resolve(now))
            .unwrap_or(false);
        if resolved_here && let Some(def) = &def {
            let value = self.metrics.get(&def.id).copied().unwrap_or(def.min);
            self.emit(
                EventLevel::Success,
                format!("NORMAL: {} recovered to {}", def.label, def.format_value(value)),
            );
        }

        let report = postmortem::build(&done, def.as_ref(), self.alerts.get(&done.alert_id), now);
        let saved = postmortem::record_resolution(
            &mut self.stats,
            &mut self.rng,
            self.settings.time_saved,
            now,
        );
        tracing::info!(
            postmortem = %report.id,
            incident = %report.incident_id,
            tool = %report.remediation,
            minutes_saved = saved,
            "incident resolved"
        );
        self.last_postmortem = Some(report.clone());

        self.schedule(now);
        self.persist();
        Some(report)
    }

    /// Force `metric_id` to its maximum and open an alert immediately.
    /// Returns the id of the alert now tracking the incident.
    pub fn trigger_incident(
        &mut self,
        metric_id: &str,
        scenario: Option<Scenario>,
    ) -> Result<String, EngineError> {
        let def = self
            .catalog
            .metric(metric_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownMetric(metric_id.to_string()))?;
        let now = self.now();

        if let Some(scenario) = &scenario
            && scenario.metric != def.id
        {
            tracing::debug!(
                scenario = %scenario.name,
                scenario_metric = %scenario.metric,
                metric = %def.id,
                "scenario attached to a different metric than it names"
            );
        }

        self.metrics.insert(def.id.clone(), def.max);
        let headline = scenario
            .as_ref()
            .map(|scenario| scenario.name.clone())
            .unwrap_or_else(|| def.label.clone());

        let existing = self.alerts.active_for(&def.id).map(|alert| alert.id.clone());
        let alert_id = match existing {
            Some(id) => {
                if let Some(scenario) = scenario
                    && let Some(alert) = self.alerts.get_mut(&id)
                {
                    alert.scenario = Some(scenario);
                }
                id
            }
            None => {
                let alert = Alert {
                    id: self.ids.alert_id(&def.id),
                    metric_id: def.id.clone(),
                    label: def.label.clone(),
                    value: def.max,
                    threshold: def.threshold,
                    status: AlertStatus::Active,
                    timestamp: now,
                    resolved_at: None,
                    scenario,
                };
                let id = alert.id.clone();
                self.alerts.push(alert);
                id
            }
        };

        self.emit(
            EventLevel::Error,
            format!("INCIDENT_TRIGGERED: {headline} failure simulation started."),
        );
        self.last_postmortem = None;

        self.schedule(now);
        self.persist();
        Ok(alert_id)
    }

    pub fn set_auto_pilot(&mut self, enabled: bool) {
        if self.auto_pilot == enabled {
            return;
        }
        self.auto_pilot = enabled;
        let state = if enabled { "engaged" } else { "disengaged" };
        self.emit(EventLevel::Info, format!("AUTOPILOT: {state}."));
        self.persist();
    }

    /// Wipe all state and the persisted snapshot, then reseed as a fresh start.
    /// The wiped snapshot is not rewritten until the next mutation.
    pub fn reset(&mut self) {
        if let Err(err) = self.ports.store.clear() {
            tracing::error!(error = %format!("{err:#}"), "failed to clear snapshot");
        }
        self.metrics.clear();
        self.history.clear();
        self.alerts.clear();
        self.remediations.clear();
        self.events.clear();
        self.stats = Stats::default();
        self.scheduler.clear();
        self.last_postmortem = None;
        self.seed_fresh();
        tracing::info!("engine state cleared");
    }

    fn fluctuate(&mut self, now: i64) {
        let remediating = self.scheduler.remediating_metric().map(str::to_owned);
        for def in self.catalog.metrics() {
            let current = self.metrics.get(&def.id).copied().unwrap_or(def.min);
            let mode = FluctuationMode::select(
                remediating.as_deref() == Some(def.id.as_str()),
                self.auto_pilot,
            );
            let next = fluctuation::next_value(def, current, mode, &mut self.rng);
            self.metrics.insert(def.id.clone(), next);
        }
        self.history.push(HistorySample {
            timestamp: now,
            values: self.metrics.clone(),
        });
    }

    fn schedule(&mut self, now: i64) -> Option<String> {
        let event = self.scheduler.admit(
            &self.catalog,
            &self.alerts,
            &mut self.remediations,
            &mut self.ids,
            now,
        )?;
        self.record(event);
        self.scheduler
            .active()
            .map(|active| active.remediation_id.clone())
    }

    fn seed_fresh(&mut self) {
        for def in self.catalog.metrics() {
            let value = seed_value(def, &mut self.rng);
            self.metrics.insert(def.id.clone(), value);
        }
        self.emit(EventLevel::Success, INIT_MESSAGE);
    }

    fn restore(&mut self, snapshot: Snapshot) {
        let Snapshot {
            metrics,
            history,
            alerts,
            remediations,
            logs,
            stats,
            active,
            next_seq,
            ..
        } = snapshot;

        for def in self.catalog.metrics() {
            let value = match metrics.get(&def.id) {
                Some(value) if value.is_finite() => def.clamp(*value),
                _ => seed_value(def, &mut self.rng),
            };
            self.metrics.insert(def.id.clone(), value);
        }
        self.history = HistoryBuffer::from_samples(history, self.settings.history_capacity);
        self.alerts = AlertLog::from_alerts(alerts, self.settings.alert_capacity);
        self.remediations =
            RemediationLog::from_entries(remediations, self.settings.remediation_capacity);
        self.events = EventBus::from_events(logs, self.settings.log_capacity);
        self.stats = stats;

        self.ids = IdSequence::new(next_seq);
        for alert in self.alerts.iter() {
            self.ids.observe(&alert.id);
        }
        for entry in self.remediations.iter() {
            self.ids.observe(&entry.id);
        }

        self.reconcile_alerts();
        self.reconcile_remediations(active);
        tracing::info!(
            alerts = self.alerts.len(),
            remediations = self.remediations.len(),
            resumed = self.scheduler.active().is_some(),
            "restored snapshot"
        );
    }

    /// Keep at most one active alert per metric: the oldest survives, later
    /// duplicates are resolved.
    fn reconcile_alerts(&mut self) {
        let now = self.now();
        let mut seen = BTreeSet::new();
        let duplicates: Vec<String> = self
            .alerts
            .iter()
            .filter(|alert| alert.is_active())
            .filter(|alert| !seen.insert(alert.metric_id.clone()))
            .map(|alert| alert.id.clone())
            .collect();

        for id in duplicates {
            if let Some(alert) = self.alerts.get_mut(&id) {
                alert.resolve(now);
            }
            self.emit(
                EventLevel::Warn,
                format!("Duplicate active alert {id} was resolved on restore."),
            );
        }
    }

    /// Keep the single-in-progress invariant across restarts: resume the
    /// persisted run, else restart the first resumable in-progress entry from
    /// zero, and close everything else.
    fn reconcile_remediations(&mut self, active: Option<ActiveRemediation>) {
        let now = self.now();
        let resumed = active.filter(|run| {
            self.remediations
                .iter()
                .any(|entry| entry.id == run.remediation_id && entry.is_in_progress())
        });
        let resumed_id = resumed.as_ref().map(|run| run.remediation_id.clone());

        let mut restarted: Option<ActiveRemediation> = None;
        let mut closed = Vec::new();
        for entry in self
            .remediations
            .iter_mut()
            .filter(|entry| entry.is_in_progress())
        {
            if resumed_id.as_deref() == Some(entry.id.as_str()) {
                continue;
            }
            if resumed_id.is_none()
                && restarted.is_none()
                && let Some(run) = rebuild_run(&self.catalog, &self.alerts, entry)
            {
                restarted = Some(run);
                continue;
            }
            entry.complete(now);
            closed.push(entry.id.clone());
        }

        if let Some(run) = resumed {
            self.scheduler = RemediationScheduler::restore(Some(run));
        } else if let Some(run) = restarted {
            let tool = run.tool_name.clone();
            self.scheduler = RemediationScheduler::restore(Some(run));
            self.emit(EventLevel::Info, format!("REMEDIATING: Restarting {tool}..."));
        }
        for id in closed {
            self.emit(
                EventLevel::Warn,
                format!("Remediation {id} could not be resumed and was closed."),
            );
        }
    }

    fn now(&self) -> i64 {
        self.ports.clock.now_millis()
    }

    fn emit(&mut self, level: EventLevel, message: impl Into<String>) {
        let now = self.now();
        self.record(Event::at(level, message, now));
    }

    fn record(&mut self, event: Event) {
        match event.level {
            EventLevel::Info | EventLevel::Success => {
                tracing::info!(level = event.level.as_str(), "{}", event.message)
            }
            EventLevel::Warn => tracing::warn!("{}", event.message),
            EventLevel::Error => tracing::error!("{}", event.message),
        }
        self.events.push(event);
    }

    fn persist(&self) {
        if let Err(err) = self.ports.store.save(&self.snapshot()) {
            tracing::error!(error = %format!("{err:#}"), "failed to persist snapshot");
        }
    }
}

/// Random integer in `[min, threshold - 10]`, bounded below by `min`.
fn seed_value(def: &MetricDefinition, rng: &mut SimRng) -> f64 {
    let low = def.min.ceil() as i64;
    let high = (def.threshold - 10.0).max(def.min).floor() as i64;
    def.clamp(rng.int_inclusive(low, high) as f64)
}

fn rebuild_run(
    catalog: &Catalog,
    alerts: &AlertLog,
    entry: &Remediation,
) -> Option<ActiveRemediation> {
    let alert = alerts.get(&entry.alert_id)?;
    catalog.metric(&alert.metric_id)?;
    let tool = catalog.tool(&entry.tool_name)?;
    Some(ActiveRemediation {
        remediation_id: entry.id.clone(),
        alert_id: alert.id.clone(),
        metric_id: alert.metric_id.clone(),
        tool_name: tool.name.clone(),
        description: tool.description.clone(),
        duration_ms: tool.duration_ms,
        progress: 0.0,
        breach_value: alert.value,
        alert_timestamp: alert.timestamp,
    })
}
