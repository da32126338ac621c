//! Timer-driven engine task.
//!
//! One tokio task owns the [`Engine`]. Fluctuation ticks, remediation progress
//! steps and external commands are serialized through a single `select!` so
//! every mutation runs to completion before the next begins. Observers read a
//! `watch` of [`EngineView`] published after each mutation.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use autosre_domain::{Scenario, SimulatorConfig};

use crate::engine::{Engine, EngineView};
use crate::error::EngineError;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub tick_interval: Duration,
    pub progress_step: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from(&SimulatorConfig::default())
    }
}

impl From<&SimulatorConfig> for DriverConfig {
    fn from(config: &SimulatorConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            progress_step: Duration::from_millis(config.progress_step_ms.max(1)),
        }
    }
}

#[derive(Debug)]
pub enum EngineCommand {
    TriggerIncident {
        metric_id: String,
        scenario: Option<Scenario>,
        reply: Option<oneshot::Sender<Result<String, EngineError>>>,
    },
    SetAutoPilot(bool),
    Reset,
}

pub struct DriverHandle {
    commands: mpsc::Sender<EngineCommand>,
    view: watch::Receiver<EngineView>,
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<Engine>,
}

impl DriverHandle {
    pub fn spawn(engine: Engine, config: DriverConfig) -> Self {
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view) = watch::channel(engine.view());
        let (shutdown, shutdown_rx) = oneshot::channel();
        let join = tokio::spawn(drive(engine, config, command_rx, view_tx, shutdown_rx));
        tracing::info!(
            tick_ms = config.tick_interval.as_millis() as u64,
            step_ms = config.progress_step.as_millis() as u64,
            "engine driver started"
        );
        Self {
            commands,
            view,
            shutdown,
            join,
        }
    }

    pub async fn trigger_incident(
        &self,
        metric_id: impl Into<String>,
        scenario: Option<Scenario>,
    ) -> Result<String, EngineError> {
        let (reply, response) = oneshot::channel();
        self.send(EngineCommand::TriggerIncident {
            metric_id: metric_id.into(),
            scenario,
            reply: Some(reply),
        })
        .await?;
        response.await.map_err(|_| EngineError::DriverStopped)?
    }

    pub async fn set_auto_pilot(&self, enabled: bool) -> Result<(), EngineError> {
        self.send(EngineCommand::SetAutoPilot(enabled)).await
    }

    pub async fn reset(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Reset).await
    }

    pub async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::DriverStopped)
    }

    /// Latest published view.
    pub fn view(&self) -> EngineView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineView> {
        self.view.clone()
    }

    /// Stop the loop and hand back the engine in its final state.
    pub async fn shutdown(self) -> Result<Engine> {
        let _ = self.shutdown.send(());
        self.join.await.context("engine driver task failed")
    }
}

async fn drive(
    mut engine: Engine,
    config: DriverConfig,
    mut commands: mpsc::Receiver<EngineCommand>,
    view: watch::Sender<EngineView>,
    mut shutdown: oneshot::Receiver<()>,
) -> Engine {
    let start = Instant::now();
    let mut ticker = interval_at(start + config.tick_interval, config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut progress = interval_at(start + config.progress_step, config.progress_step);
    progress.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let step_ms = config.progress_step.as_millis() as u64;

    let mut was_active = engine.active_remediation().is_some();
    loop {
        let active = engine.active_remediation().is_some();
        if active && !was_active {
            // Newly admitted runs take their first step one full period later.
            progress.reset();
        }
        was_active = active;

        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                engine.tick();
            }
            _ = progress.tick(), if active => {
                engine.advance_remediation(step_ms);
            }
            command = commands.recv() => match command {
                Some(command) => apply(&mut engine, command),
                None => break,
            },
        }

        view.send_replace(engine.view());
    }

    tracing::info!("engine driver stopped");
    engine
}

fn apply(engine: &mut Engine, command: EngineCommand) {
    match command {
        EngineCommand::TriggerIncident {
            metric_id,
            scenario,
            reply,
        } => {
            let result = engine.trigger_incident(&metric_id, scenario);
            if let Err(err) = &result {
                tracing::warn!(metric = %metric_id, error = %err, "incident trigger rejected");
            }
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        }
        EngineCommand::SetAutoPilot(enabled) => engine.set_auto_pilot(enabled),
        EngineCommand::Reset => engine.reset(),
    }
}
