use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use autosre_adapter_storage::JsonFileSnapshotStore;
use autosre_application::{DriverConfig, DriverHandle, Engine, EngineSettings, EngineView, SimRng};
use autosre_domain::{Catalog, Scenario, SimulatorConfig, builtin_scenarios};
use autosre_ports::PortSet;
use autosre_ui_presentation::{
    alert_line, event_line, metric_rows, postmortem_lines, remediation_line, stats_line,
};

use crate::cli::{RunArgs, TriggerArgs};

const RECENT_LOGS: usize = 5;

fn load_engine(
    config: &SimulatorConfig,
    snapshot_path: &Path,
    seed: Option<u64>,
    auto_pilot: bool,
) -> Result<Engine> {
    let catalog = config.catalog()?;
    let mut settings = EngineSettings::from(config);
    settings.auto_pilot |= auto_pilot;
    let ports = PortSet::with_store(Arc::new(JsonFileSnapshotStore::new(snapshot_path)));
    let rng = SimRng::from_seed(seed.or(config.seed));
    Ok(Engine::load(catalog, settings, ports, rng))
}

fn find_scenario(name: &str) -> Result<Scenario> {
    let scenarios = builtin_scenarios();
    if let Some(scenario) = scenarios
        .iter()
        .find(|scenario| scenario.name.eq_ignore_ascii_case(name))
    {
        return Ok(scenario.clone());
    }
    let known: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    bail!("unknown scenario {name}; expected one of {}", known.join(", "))
}

pub async fn run(
    config: &SimulatorConfig,
    snapshot_path: &Path,
    args: &RunArgs,
    json: bool,
) -> Result<()> {
    let engine = load_engine(config, snapshot_path, args.seed, args.autopilot)?;
    let catalog = engine.catalog().clone();
    let scenario = args.scenario.as_deref().map(find_scenario).transpose()?;
    let trigger = args
        .trigger
        .clone()
        .or_else(|| scenario.as_ref().map(|scenario| scenario.metric.clone()));

    let handle = DriverHandle::spawn(engine, DriverConfig::from(config));
    if let Some(metric) = trigger {
        let alert_id = handle.trigger_incident(metric, scenario).await?;
        tracing::info!(alert = %alert_id, "incident injected");
    }

    let mut views = handle.subscribe();
    let initial = views.borrow_and_update().clone();
    let mut last_tick = initial.history.last().map(|sample| sample.timestamp);
    let mut last_report = initial.last_postmortem.map(|report| report.id);
    let mut ticks = 0u64;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();

                let report = view.last_postmortem.as_ref().map(|report| report.id.clone());
                if report.is_some() && report != last_report {
                    if let Some(postmortem) = &view.last_postmortem {
                        print_lines(&postmortem_lines(postmortem));
                    }
                    last_report = report;
                }

                let latest = view.history.last().map(|sample| sample.timestamp);
                if latest == last_tick {
                    continue;
                }
                last_tick = latest;
                ticks += 1;
                print_view(&view, &catalog, json)?;
                if args.ticks.is_some_and(|limit| ticks >= limit) {
                    break;
                }
            }
            result = &mut interrupt => {
                result.context("failed to listen for interrupt")?;
                tracing::info!("interrupt received, stopping");
                break;
            }
        }
    }

    let engine = handle.shutdown().await?;
    tracing::info!(
        ticks,
        incidents_resolved = engine.stats().incidents_resolved,
        "simulation stopped"
    );
    Ok(())
}

pub fn status(config: &SimulatorConfig, snapshot_path: &Path, json: bool) -> Result<()> {
    let engine = load_engine(config, snapshot_path, None, false)?;
    print_view(&engine.view(), engine.catalog(), json)
}

pub fn trigger(
    config: &SimulatorConfig,
    snapshot_path: &Path,
    args: &TriggerArgs,
    json: bool,
) -> Result<()> {
    let mut engine = load_engine(config, snapshot_path, None, false)?;
    let scenario = args.scenario.as_deref().map(find_scenario).transpose()?;
    let alert_id = engine.trigger_incident(&args.metric, scenario)?;
    if json {
        let view = engine.view();
        let alert = view.alerts.iter().find(|alert| alert.id == alert_id);
        println!("{}", serde_json::to_string_pretty(&alert)?);
        return Ok(());
    }
    if let Some(alert) = engine.alerts().get(&alert_id) {
        println!("{}", alert_line(alert, engine.catalog()));
    }
    if let Some(active) = engine.active_remediation() {
        println!("{}", remediation_line(active));
    }
    Ok(())
}

pub fn reset(config: &SimulatorConfig, snapshot_path: &Path) -> Result<()> {
    let mut engine = load_engine(config, snapshot_path, None, false)?;
    engine.reset();
    println!("State cleared ({}).", snapshot_path.display());
    Ok(())
}

pub fn scenarios(json: bool) -> Result<()> {
    let scenarios = builtin_scenarios();
    if json {
        println!("{}", serde_json::to_string_pretty(&scenarios)?);
        return Ok(());
    }
    for scenario in scenarios {
        println!("{:<10} {:<8} {}", scenario.name, scenario.metric, scenario.rca);
    }
    Ok(())
}

fn print_view(view: &EngineView, catalog: &Catalog, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(view)?);
    } else {
        print_lines(&status_block(view, catalog));
    }
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

pub(crate) fn status_block(view: &EngineView, catalog: &Catalog) -> Vec<String> {
    let mode = if view.auto_pilot { "AUTOPILOT" } else { "MANUAL" };
    let mut lines = vec![format!("== autosre [{mode}] ==")];

    for row in metric_rows(catalog, &view.metrics, &view.history) {
        lines.push(format!(
            "{:<14} {:>10} / {:<8} {:<8} {}",
            row.label,
            row.value,
            row.threshold,
            row.status.label(),
            row.sparkline
        ));
    }

    match &view.active {
        Some(active) => lines.push(format!("Remediating: {}", remediation_line(active))),
        None => lines.push("Remediating: idle".into()),
    }
    for alert in view.alerts.iter().filter(|alert| alert.is_active()) {
        lines.push(alert_line(alert, catalog));
    }
    lines.push(stats_line(&view.stats));
    lines.extend(view.logs.iter().take(RECENT_LOGS).map(event_line));
    lines
}
