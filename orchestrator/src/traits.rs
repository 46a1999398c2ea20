//! Trait definitions with mockall annotations for testing
//!
//! The orchestrator talks to the device, the measurement tools and the
//! progress file only through these traits, so every campaign path can be
//! driven by mocks or scripted fakes.

use shared::{Combination, Progress, SignalMetrics, ThroughputMetrics};

use crate::error::OrchestratorResult;

/// Applies band configurations to the device
///
/// Every method must be safe to call again after a failure; the retry
/// protocol relies on re-application being idempotent.
#[mockall::automock]
#[async_trait::async_trait]
pub trait DeviceAdapter: Send + Sync {
    /// Lock the device to the bands of `combination` (or automatic selection)
    ///
    /// # Returns
    /// `Ok(())` once applied. A transient error (`is_transient()`) is retried
    /// by the orchestrator; any other error aborts the campaign.
    async fn apply_configuration(&self, combination: &Combination) -> OrchestratorResult<()>;

    /// Whether the device currently reports no radio service
    async fn read_no_service_indicator(&self) -> OrchestratorResult<bool>;

    /// Re-establish the device session before a retry
    async fn reset_session(&self) -> OrchestratorResult<()>;
}

/// Reads signal quality and measures throughput
///
/// "No data" is never an error: unavailable signal fields are `"N/A"` and
/// an unmeasurable throughput is zero. Errors mean transport failure.
#[mockall::automock]
#[async_trait::async_trait]
pub trait MetricsAdapter: Send + Sync {
    async fn read_signal_metrics(&self) -> OrchestratorResult<SignalMetrics>;

    async fn measure_throughput(&self) -> OrchestratorResult<ThroughputMetrics>;
}

/// Durable storage for campaign progress
#[mockall::automock]
#[async_trait::async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the last complete snapshot
    ///
    /// # Returns
    /// `Ok(None)` when nothing was saved yet, `ProgressCorrupt` when the
    /// snapshot cannot be parsed.
    async fn load(&self) -> OrchestratorResult<Option<Progress>>;

    /// Atomically replace the snapshot with `progress`
    async fn save(&self, progress: &Progress) -> OrchestratorResult<()>;

    /// Remove the snapshot after a clean, complete campaign
    async fn delete(&self) -> OrchestratorResult<()>;
}
