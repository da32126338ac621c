use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "autosre",
    version,
    about = "Synthetic SRE telemetry with automated self-healing"
)]
pub struct Cli {
    /// Path to the YAML config file.
    #[arg(long, global = true, env = "AUTOSRE_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Path to the persisted snapshot.
    #[arg(long, global = true, env = "AUTOSRE_SNAPSHOT_PATH")]
    pub snapshot: Option<PathBuf>,

    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Drive the engine in real time.
    Run(RunArgs),
    /// Print the persisted state.
    Status,
    /// Inject an incident into the persisted state.
    Trigger(TriggerArgs),
    /// Wipe all state and the persisted snapshot.
    Reset,
    /// List built-in incident scenarios.
    Scenarios,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Let metrics drift and spike on their own.
    #[arg(long)]
    pub autopilot: bool,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many fluctuation ticks.
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Metric to force into breach at startup.
    #[arg(long)]
    pub trigger: Option<String>,

    /// Scenario to attach to the forced incident. Implies `--trigger` of the
    /// scenario's metric when no metric is given.
    #[arg(long)]
    pub scenario: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TriggerArgs {
    pub metric: String,

    #[arg(long)]
    pub scenario: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "autosre",
            "run",
            "--autopilot",
            "--ticks",
            "5",
            "--scenario",
            "MEM_LEAK",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.autopilot);
        assert_eq!(args.ticks, Some(5));
        assert_eq!(args.scenario.as_deref(), Some("MEM_LEAK"));
        assert!(args.trigger.is_none());
    }

    #[test]
    fn trigger_requires_metric() {
        assert!(Cli::try_parse_from(["autosre", "trigger"]).is_err());
        let cli = Cli::try_parse_from(["autosre", "--json", "trigger", "disk"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Trigger(TriggerArgs { ref metric, .. }) if metric == "disk"));
    }
}
