//! Synthetic SRE telemetry with automated self-healing.
//!
//! The root crate re-exports the workspace layers; the `cli` feature adds the
//! `autosre` binary.

pub use autosre_adapter_storage as storage;
pub use autosre_application as application;
pub use autosre_domain as domain;
pub use autosre_ports as ports;
pub use autosre_ui_presentation as presentation;

pub use autosre_adapter_storage::JsonFileSnapshotStore;
pub use autosre_application::{DriverConfig, DriverHandle, Engine, EngineError, EngineSettings, SimRng};
pub use autosre_domain::{Catalog, SimulatorConfig};
pub use autosre_ports::PortSet;
