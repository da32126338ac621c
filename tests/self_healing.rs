use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use autosre::domain::{AlertStatus, EventLevel, builtin_scenarios};
use autosre::ports::{ManualClock, SnapshotPort};
use autosre::{Catalog, Engine, EngineSettings, JsonFileSnapshotStore, PortSet, SimRng};

struct Rig {
    _dir: TempDir,
    store: JsonFileSnapshotStore,
    clock: ManualClock,
}

impl Rig {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("autosre").join("snapshot.json"));
        Self {
            _dir: dir,
            store,
            clock: ManualClock::new(1_700_000_000_000),
        }
    }

    fn engine(&self, seed: u64) -> Engine {
        let ports = PortSet::with_store(Arc::new(self.store.clone()))
            .with_clock(Arc::new(self.clock.clone()));
        Engine::load(
            Catalog::default(),
            EngineSettings::default(),
            ports,
            SimRng::seeded(seed),
        )
    }
}

fn heal(engine: &mut Engine, clock: &ManualClock) -> autosre::domain::Postmortem {
    for step in 1..=5_000 {
        clock.advance(50);
        if step % 30 == 0 {
            engine.tick();
        }
        if let Some(report) = engine.advance_remediation(50) {
            return report;
        }
    }
    panic!("remediation did not finish");
}

#[test]
fn cpu_spike_is_detected_healed_and_persisted() {
    let rig = Rig::new();
    let mut engine = rig.engine(1);
    let scenario = builtin_scenarios()
        .into_iter()
        .find(|s| s.name == "CPU_SPIKE")
        .unwrap();

    let alert_id = engine.trigger_incident("cpu", Some(scenario.clone())).unwrap();
    assert_eq!(engine.value("cpu"), Some(100.0));
    assert_eq!(
        engine.active_remediation().map(|a| a.tool_name.as_str()),
        Some("Service Restarter")
    );

    let report = heal(&mut engine, &rig.clock);
    assert_eq!(report.rca, scenario.rca);
    assert_eq!(report.remediation, "Service Restarter");
    assert_eq!(engine.stats().incidents_resolved, 1);

    let stored = rig.store.load().unwrap().unwrap();
    let alert = stored.alerts.iter().find(|a| a.id == alert_id).unwrap();
    assert_eq!(alert.status, AlertStatus::Resolved);
    assert!(stored.alerts.iter().all(|a| a.resolved_at.is_none_or(|at| at >= a.timestamp)));
    assert_eq!(stored.stats.incidents_resolved, 1);
    assert!(stored.active.is_none());

    let messages: Vec<&str> = stored.logs.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.contains(&"SUCCESS: Service Restarter execution finished."));
    assert!(messages.contains(&"INCIDENT_TRIGGERED: CPU_SPIKE failure simulation started."));
}

#[test]
fn second_breach_waits_for_the_first_remediation() {
    let rig = Rig::new();
    let mut engine = rig.engine(2);
    let cpu = engine.trigger_incident("cpu", None).unwrap();
    let memory = engine.trigger_incident("memory", None).unwrap();

    assert_eq!(engine.remediations().len(), 1);
    assert_eq!(engine.remediations().in_progress_count(), 1);

    let first = heal(&mut engine, &rig.clock);
    assert_eq!(first.incident_id, cpu);
    assert_eq!(
        engine.active_remediation().map(|a| a.alert_id.clone()),
        Some(memory.clone())
    );

    let second = heal(&mut engine, &rig.clock);
    assert_eq!(second.incident_id, memory);
    assert_eq!(second.remediation, "Cache Cleaner");
    assert_eq!(engine.stats().incidents_resolved, 2);
}

#[test]
fn clear_all_leaves_a_fresh_start() {
    let rig = Rig::new();
    let mut engine = rig.engine(3);
    engine.trigger_incident("disk", None).unwrap();
    heal(&mut engine, &rig.clock);
    engine.reset();
    assert!(!rig.store.path().exists());
    drop(engine);

    let engine = rig.engine(4);
    assert!(engine.alerts().is_empty());
    assert!(engine.remediations().is_empty());
    assert_eq!(engine.events().len(), 1);
    assert_eq!(engine.events().latest().map(|e| e.level), Some(EventLevel::Success));
    for def in engine.catalog().metrics() {
        assert!(engine.value(&def.id).unwrap() < def.threshold);
    }
}

#[test]
fn corrupt_snapshot_file_is_replaced() {
    let rig = Rig::new();
    fs::create_dir_all(rig.store.path().parent().unwrap()).unwrap();
    fs::write(rig.store.path(), "{ definitely not a snapshot").unwrap();

    let engine = rig.engine(5);
    assert!(engine.alerts().is_empty());
    assert_eq!(engine.events().latest().map(|e| e.level), Some(EventLevel::Warn));

    let stored = rig.store.load().unwrap().unwrap();
    assert_eq!(stored.metrics.len(), engine.catalog().metrics().len());
}

#[test]
fn in_flight_remediation_survives_restart() {
    let rig = Rig::new();
    let mut engine = rig.engine(6);
    let alert_id = engine.trigger_incident("traffic", None).unwrap();
    drop(engine);

    let mut engine = rig.engine(7);
    assert_eq!(
        engine.active_remediation().map(|a| a.alert_id.clone()),
        Some(alert_id.clone())
    );
    let report = heal(&mut engine, &rig.clock);
    assert_eq!(report.remediation, "Auto-Scaler");
    assert_eq!(report.incident_id, alert_id);
}
