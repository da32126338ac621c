use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error("engine driver has stopped")]
    DriverStopped,
}
