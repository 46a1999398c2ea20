//! Band combination campaign orchestrator
//!
//! Enumerates band combinations for a cellular modem, applies each one
//! through a device adapter, measures signal and throughput, prunes
//! combinations that cannot succeed, and persists progress so an
//! interrupted campaign resumes where it stopped.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::CampaignConfig;
pub use core::{CampaignReport, FailureState, SkipReason};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
pub use traits::{DeviceAdapter, MetricsAdapter, ProgressStore};
