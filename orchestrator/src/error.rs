//! Orchestrator-specific error types

use shared::SharedError;
use std::time::Duration;
use thiserror::Error;

use crate::core::InvalidTransition;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Device rejected configuration {combination}: {message}")]
    DeviceError { combination: String, message: String },

    #[error("Adapter call '{operation}' timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("Device session lost: {message}")]
    SessionLost { message: String },

    #[error("Measurement transport failed: {message}")]
    MetricsTransport { message: String },

    #[error("Progress file {path} is corrupt: {message}")]
    ProgressCorrupt { path: String, message: String },

    #[error("Progress persistence failed: {operation} on {path}")]
    PersistenceError {
        operation: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Progress could not be saved {failures} times in a row")]
    PersistenceExhausted { failures: u32 },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Report generation failed: {message}")]
    ReportError { message: String },

    #[error("Attempt state machine error: {0}")]
    StateMachine(#[from] InvalidTransition),

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl OrchestratorError {
    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }

    /// Errors the per-combination retry protocol absorbs
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DeviceError { .. } | Self::Timeout { .. })
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
