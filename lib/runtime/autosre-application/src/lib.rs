//! Simulation engine: fluctuate → detect → schedule → report.

pub mod detector;
pub mod driver;
pub mod engine;
pub mod error;
pub mod fluctuation;
pub mod postmortem;
pub mod rng;
pub mod scheduler;
pub mod sequence;

pub use driver::{DriverConfig, DriverHandle, EngineCommand};
pub use engine::{Engine, EngineSettings, EngineView, TickReport};
pub use error::EngineError;
pub use fluctuation::FluctuationMode;
pub use rng::SimRng;
pub use scheduler::RemediationScheduler;
