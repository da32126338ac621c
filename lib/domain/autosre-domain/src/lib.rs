//! Domain models and invariants.

pub mod alert;
pub mod catalog;
pub mod config;
pub mod events;
pub mod metrics;
pub mod remediation;
pub mod report;
pub mod snapshot;

pub use alert::{Alert, AlertLog, AlertStatus, Scenario, builtin_scenarios};
pub use catalog::{Catalog, MetricDefinition, MetricId, Tool};
pub use config::{DEFAULT_CONFIG_FILE, SimulatorConfig, TimeSavedRange};
pub use events::{Event, EventBus, EventLevel};
pub use metrics::{HistoryBuffer, HistorySample, MetricState};
pub use remediation::{ActiveRemediation, Remediation, RemediationLog, RemediationStatus};
pub use report::{Postmortem, Stats};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot};
