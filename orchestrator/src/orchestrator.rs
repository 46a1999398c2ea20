//! Main campaign orchestrator
//!
//! Drives one combination at a time through the attempt state machine:
//! consult the failure tracker, apply the configuration with bounded
//! retries, wait for the radio to settle, measure, then record the outcome
//! and persist progress before moving on. The device can only hold one
//! configuration, so the loop is strictly sequential.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use shared::{combo_debug, combo_error, combo_info, combo_warn, logging, AttemptResult, Combination, Progress};

use crate::{
    config::CampaignConfig,
    core::{
        plan_work, transition, AttemptEvent, AttemptState, CampaignReport, Classification, FailureState, SkipReason,
        SkippedCombination, WorkPlan,
    },
    error::{OrchestratorError, OrchestratorResult},
    traits::{DeviceAdapter, MetricsAdapter, ProgressStore},
};

/// Main orchestrator that runs a band combination campaign
pub struct Orchestrator<D, M, S>
where
    D: DeviceAdapter + 'static,
    M: MetricsAdapter + 'static,
    S: ProgressStore + 'static,
{
    config: CampaignConfig,

    /// Injected services
    device: D,
    metrics: M,
    store: S,

    /// Campaign state, exclusively owned by this orchestrator
    progress: Progress,
    failures: FailureState,
    abandoned: Vec<Combination>,
    skipped: Vec<SkippedCombination>,
    planned: usize,
    consecutive_save_failures: u32,
    rng: StdRng,

    /// Shutdown signal
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
    shutdown_requested: bool,
}

impl<D, M, S> Orchestrator<D, M, S>
where
    D: DeviceAdapter + 'static,
    M: MetricsAdapter + 'static,
    S: ProgressStore + 'static,
{
    /// Create new orchestrator with injected dependencies
    pub fn new(config: CampaignConfig, device: D, metrics: M, store: S) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let failures = FailureState::with_skipped(config.skip.iter().cloned());

        Self {
            config,
            device,
            metrics,
            store,
            progress: Progress::new(),
            failures,
            abandoned: Vec::new(),
            skipped: Vec::new(),
            planned: 0,
            consecutive_save_failures: 0,
            rng: StdRng::from_entropy(),
            shutdown_tx,
            shutdown_rx,
            shutdown_requested: false,
        }
    }

    /// Use a fixed seed for order randomization
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Get shutdown sender for external shutdown requests
    pub fn get_shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn failure_state(&self) -> &FailureState {
        &self.failures
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Snapshot of everything produced so far, usable after a failed run
    pub fn report(&self) -> CampaignReport {
        CampaignReport {
            campaign_id: self.progress.campaign_id,
            started_at: self.progress.started_at,
            finished_at: Utc::now(),
            results: self.progress.results.clone(),
            abandoned: self.abandoned.clone(),
            skipped: self.skipped.clone(),
            failures: self.failures.clone(),
            planned: self.planned,
            interrupted: self.shutdown_requested,
        }
    }

    /// Run the campaign to completion, interruption, or a fatal error
    ///
    /// Every fatal path flushes progress before the error is returned.
    pub async fn run(&mut self) -> OrchestratorResult<CampaignReport> {
        self.config.validate()?;

        let plan = self.initialize().await?;

        match self.execute(&plan).await {
            Ok(()) => {
                self.finalize(&plan).await?;
                Ok(self.report())
            }
            Err(e) => {
                logging::log_error("Campaign", &e);
                self.flush().await;
                Err(e)
            }
        }
    }

    /// Load or create progress, plan the work and seed failure knowledge
    async fn initialize(&mut self) -> OrchestratorResult<WorkPlan> {
        if self.config.resume {
            match self.store.load().await {
                Ok(Some(progress)) => {
                    logging::log_success(&format!(
                        "Resuming campaign {}: {} combinations done, {} results",
                        progress.campaign_id,
                        progress.completed_combinations.len(),
                        progress.results.len()
                    ));
                    self.progress = progress;
                }
                Ok(None) => {
                    tracing::info!("📭 No progress to resume, starting a fresh campaign");
                }
                Err(e @ OrchestratorError::ProgressCorrupt { .. }) => {
                    tracing::warn!(error = %e, "⚠️ Ignoring corrupt progress, starting a fresh campaign");
                }
                // An unreadable file may still hold a valid campaign; never overwrite it
                Err(e) => return Err(e),
            }
        }

        let completed = self.progress.completed_set();
        let plan = plan_work(&self.config, &completed, &mut self.rng);
        self.failures.replay(&self.progress, &plan.universe);
        self.planned = plan.queue.len();

        let exhaustive = !self.config.is_filtered() && plan.covers_universe(&completed);
        tracing::info!(
            universe = plan.universe.len(),
            already_done = completed.len(),
            planned = plan.queue.len(),
            exhaustive,
            "🗂️ Planned campaign {}",
            self.progress.campaign_id
        );
        tracing::debug!(
            no_service = self.failures.no_service.len(),
            speedtest_failed = self.failures.speedtest_failed.len(),
            skipped = self.failures.skipped.len(),
            "Seeded failure state"
        );

        // Overwrite any stale snapshot right away so a later resume sees this campaign
        self.persist().await?;

        Ok(plan)
    }

    async fn execute(&mut self, plan: &WorkPlan) -> OrchestratorResult<()> {
        let total = plan.queue.len();

        for (idx, combination) in plan.queue.iter().enumerate() {
            if self.poll_shutdown() {
                break;
            }

            logging::log_progress(idx + 1, total, &format!("Testing combination {combination}"));

            let Some(outcome) = self.evaluate(combination).await? else {
                combo_warn!(combination, "⏹️ Interrupted before the attempt completed");
                break;
            };

            self.resolve(combination, outcome, &plan.universe);
            self.persist().await?;
        }

        Ok(())
    }

    /// Drive one combination through the state machine until it is terminal
    ///
    /// Returns `None` when a shutdown request interrupted the attempt.
    async fn evaluate(&mut self, combination: &Combination) -> OrchestratorResult<Option<AttemptState>> {
        let started = Instant::now();
        let budget = self.config.retry_budget;
        let mut state = AttemptState::Pending;

        while !state.is_terminal() {
            let event = match &state {
                AttemptState::Pending => match self.failures.should_skip(combination) {
                    Some(reason) => AttemptEvent::Skip(reason),
                    None => AttemptEvent::Dequeue,
                },

                AttemptState::Configuring { attempt } => {
                    let attempt = *attempt;
                    if attempt > 1 {
                        combo_info!(combination, "🔄 Retry {}/{}", attempt - 1, budget);
                        if !self.pause(self.config.settle_wait).await {
                            return Ok(None);
                        }
                    }
                    self.configure(combination, attempt).await?
                }

                AttemptState::Measuring { attempt } => {
                    let attempt = *attempt;
                    let wait = self.config.stabilization_wait;
                    combo_debug!(combination, "⏳ Waiting {:?} for the radio to stabilize", wait);
                    if !self.pause(wait).await {
                        return Ok(None);
                    }
                    match self.measure(combination, started).await {
                        Ok(result) => AttemptEvent::Measured(result),
                        Err(e) if e.is_transient() => {
                            combo_warn!(combination, "⚠️ Measurement attempt {} failed: {}", attempt, e);
                            AttemptEvent::Failed
                        }
                        Err(e) => return Err(e),
                    }
                }

                AttemptState::Recorded(_) | AttemptState::Skipped(_) | AttemptState::Abandoned { .. } => break,
            };

            state = transition(state, event, budget)?;
        }

        Ok(Some(state))
    }

    /// Apply the configuration once, re-establishing the session on retries
    async fn configure(&self, combination: &Combination, attempt: u32) -> OrchestratorResult<AttemptEvent> {
        let limit = self.config.apply_timeout;

        if attempt > 1 {
            if let Err(e) = bounded("reset session", limit, self.device.reset_session()).await {
                if !e.is_transient() {
                    return Err(e);
                }
                combo_warn!(combination, "⚠️ Session reset failed: {}", e);
                return Ok(AttemptEvent::Failed);
            }
        }

        match bounded("apply configuration", limit, self.device.apply_configuration(combination)).await {
            Ok(()) => {
                combo_debug!(combination, "📡 Configuration applied (attempt {})", attempt);
                Ok(AttemptEvent::Applied)
            }
            Err(e) if e.is_transient() => {
                combo_warn!(combination, "⚠️ Apply attempt {} failed: {}", attempt, e);
                Ok(AttemptEvent::Failed)
            }
            Err(e) => Err(e),
        }
    }

    /// Read signal and throughput; a no-service indication short-circuits
    async fn measure(&self, combination: &Combination, started: Instant) -> OrchestratorResult<AttemptResult> {
        let signal_limit = self.config.signal_timeout;

        if bounded("no-service check", signal_limit, self.device.read_no_service_indicator()).await? {
            combo_warn!(combination, "📵 No service");
            return Ok(AttemptResult::no_service(combination.clone(), started.elapsed()));
        }

        let signal = bounded("signal read", signal_limit, self.metrics.read_signal_metrics()).await?;
        combo_debug!(
            combination,
            "📶 Band {} RSRP {} RSRQ {} SINR {}",
            signal.band,
            signal.rsrp,
            signal.rsrq,
            signal.sinr
        );

        let throughput = bounded(
            "throughput measurement",
            self.config.throughput_timeout,
            self.metrics.measure_throughput(),
        )
        .await?;

        Ok(AttemptResult::measured(combination.clone(), signal, throughput, started.elapsed()))
    }

    /// Record a terminal outcome and update failure knowledge
    fn resolve(&mut self, combination: &Combination, outcome: AttemptState, universe: &[Combination]) {
        match outcome {
            AttemptState::Recorded(result) => {
                combo_info!(
                    combination,
                    "✅ ↓{:.1} Mbps ↑{:.1} Mbps ping {:.0} ms ({:.0}s)",
                    result.download_mbps,
                    result.upload_mbps,
                    result.ping_ms,
                    result.duration_secs
                );

                self.progress.record(result.clone());
                let completed = self.progress.completed_set();
                let pending = universe.iter().filter(|c| !completed.contains(c));
                let (classification, newly_skipped) = self.failures.apply(&result, pending);

                match classification {
                    Classification::NoService(band) => {
                        combo_warn!(
                            combination,
                            "🚫 Band {} has no service, pruned {} combinations",
                            band,
                            newly_skipped.len()
                        );
                    }
                    Classification::SpeedtestFailed(band) => {
                        combo_warn!(
                            combination,
                            "🐢 Band {} gave no throughput, pruned {} combinations",
                            band,
                            newly_skipped.len()
                        );
                    }
                    Classification::Healthy | Classification::NotClassified => {}
                }
            }

            AttemptState::Skipped(reason) => {
                combo_info!(combination, "⏭️ Skipped: {}", reason);
                self.record_skip(combination, &reason);
            }

            AttemptState::Abandoned { attempts } => {
                combo_error!(combination, "💥 Abandoned after {} attempts", attempts);
                self.progress.mark_completed(combination.clone());
                self.abandoned.push(combination.clone());
            }

            // evaluate only returns terminal states
            AttemptState::Pending | AttemptState::Configuring { .. } | AttemptState::Measuring { .. } => {}
        }
    }

    fn record_skip(&mut self, combination: &Combination, reason: &SkipReason) {
        if reason.records_result() {
            self.progress.record(AttemptResult::no_service(combination.clone(), Duration::ZERO));
        } else {
            self.progress.mark_completed(combination.clone());
        }

        self.skipped.push(SkippedCombination {
            combination: combination.clone(),
            reason: reason.to_string(),
        });
    }

    /// Delete progress after a clean exhaustive run, keep it otherwise
    async fn finalize(&mut self, plan: &WorkPlan) -> OrchestratorResult<()> {
        let exhausted = plan.universe.iter().all(|c| self.progress.is_completed(c));

        if self.shutdown_requested {
            logging::log_shutdown("campaign interrupted, progress kept for --resume");
            return self.persist().await;
        }

        if exhausted && !self.config.is_filtered() {
            if let Err(e) = self.store.delete().await {
                tracing::warn!(error = %e, "⚠️ Could not remove progress file");
            }
            logging::log_success("Campaign complete, progress file removed");
        } else {
            logging::log_success("Campaign run complete, progress kept (filtered or partial run)");
        }

        Ok(())
    }

    /// Save progress, tolerating a bounded number of consecutive failures
    async fn persist(&mut self) -> OrchestratorResult<()> {
        match self.store.save(&self.progress).await {
            Ok(()) => {
                self.consecutive_save_failures = 0;
                Ok(())
            }
            Err(e) => {
                self.consecutive_save_failures += 1;
                logging::log_error("Progress save", &e);

                if self.consecutive_save_failures >= self.config.max_save_failures {
                    Err(OrchestratorError::PersistenceExhausted {
                        failures: self.consecutive_save_failures,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Best-effort save on the way out of a fatal error
    async fn flush(&mut self) {
        match self.store.save(&self.progress).await {
            Ok(()) => tracing::info!(results = self.progress.results.len(), "💾 Progress flushed"),
            Err(e) => logging::log_error("Final progress flush", &e),
        }
    }

    fn poll_shutdown(&mut self) -> bool {
        if !self.shutdown_requested && self.shutdown_rx.try_recv().is_ok() {
            logging::log_shutdown("shutdown requested");
            self.shutdown_requested = true;
        }
        self.shutdown_requested
    }

    /// Scheduling delay that yields early on shutdown; false when interrupted
    async fn pause(&mut self, duration: Duration) -> bool {
        if self.poll_shutdown() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            Some(_) = self.shutdown_rx.recv() => {
                logging::log_shutdown("shutdown requested");
                self.shutdown_requested = true;
                false
            }
        }
    }
}

/// Bound an adapter call; exceeding the limit is a transient failure
async fn bounded<T, F>(operation: &str, limit: Duration, call: F) -> OrchestratorResult<T>
where
    F: Future<Output = OrchestratorResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(OrchestratorError::Timeout {
            operation: operation.to_string(),
            timeout: limit,
        }),
    }
}
