use std::io;
use thiserror::Error;

/// Custom error type for sense
#[derive(Error, Debug)]
pub enum SenseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Sensor read failed: {0}")]
    SensorRead(String),

    #[error("Register read failed: {0}")]
    Register(String),

    #[error("GPU not available: {0}")]
    GpuNotAvailable(String),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),
}

/// Result type alias for sense
pub type Result<T> = std::result::Result<T, SenseError>;

impl SenseError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SenseError::Config(msg.into())
    }

    pub fn sensor_read<S: Into<String>>(msg: S) -> Self {
        SenseError::SensorRead(msg.into())
    }

    pub fn register<S: Into<String>>(msg: S) -> Self {
        SenseError::Register(msg.into())
    }

    pub fn gpu_not_available<S: Into<String>>(msg: S) -> Self {
        SenseError::GpuNotAvailable(msg.into())
    }

    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        SenseError::MetricCollection(msg.into())
    }
}
