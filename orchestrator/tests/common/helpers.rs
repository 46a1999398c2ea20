//! Scripted adapters and builder patterns for orchestrator tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use band_orchestrator::{
    CampaignConfig, DeviceAdapter, MetricsAdapter, Orchestrator, OrchestratorError, OrchestratorResult, ProgressStore,
};
use shared::{AttemptResult, Combination, Progress, SignalMetrics, ThroughputMetrics};

use super::fixtures::FakeRadio;

/// Device fake that records every call
#[derive(Clone)]
pub struct ScriptedDevice {
    radio: Arc<FakeRadio>,
    applied: Arc<Mutex<Vec<String>>>,
    resets: Arc<AtomicUsize>,
    interrupt: Arc<Mutex<Option<(String, mpsc::Sender<()>)>>>,
}

impl ScriptedDevice {
    pub fn new(radio: Arc<FakeRadio>) -> Self {
        Self {
            radio,
            applied: Arc::new(Mutex::new(Vec::new())),
            resets: Arc::new(AtomicUsize::new(0)),
            interrupt: Arc::new(Mutex::new(None)),
        }
    }

    /// Request shutdown right after `identity` is applied
    pub fn interrupt_after(&self, identity: &str, sender: mpsc::Sender<()>) {
        *self.interrupt.lock().unwrap() = Some((identity.to_string(), sender));
    }

    /// Identities of every apply call, failed ones included
    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }

    pub fn apply_count(&self, identity: &str) -> usize {
        self.applied().iter().filter(|applied| *applied == identity).count()
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceAdapter for ScriptedDevice {
    async fn apply_configuration(&self, combination: &Combination) -> OrchestratorResult<()> {
        let identity = combination.identity();
        self.applied.lock().unwrap().push(identity.clone());

        if self.radio.fatal.as_deref() == Some(identity.as_str()) {
            return Err(OrchestratorError::SessionLost {
                message: "router rebooted".to_string(),
            });
        }
        if self.radio.take_hang(&identity) {
            std::future::pending::<()>().await;
        }
        if self.radio.take_failure(&identity) {
            return Err(OrchestratorError::DeviceError {
                combination: identity,
                message: "band lock form did not submit".to_string(),
            });
        }

        self.radio.set_current(combination);
        if let Some((trigger, sender)) = self.interrupt.lock().unwrap().as_ref() {
            if *trigger == identity {
                let _ = sender.try_send(());
            }
        }
        Ok(())
    }

    async fn read_no_service_indicator(&self) -> OrchestratorResult<bool> {
        Ok(self.radio.no_service())
    }

    async fn reset_session(&self) -> OrchestratorResult<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Metrics fake reading from the shared radio
pub struct ScriptedMetrics {
    radio: Arc<FakeRadio>,
    speedtests: AtomicUsize,
}

impl ScriptedMetrics {
    pub fn new(radio: Arc<FakeRadio>) -> Self {
        Self {
            radio,
            speedtests: AtomicUsize::new(0),
        }
    }

    pub fn speedtests(&self) -> usize {
        self.speedtests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsAdapter for ScriptedMetrics {
    async fn read_signal_metrics(&self) -> OrchestratorResult<SignalMetrics> {
        Ok(self.radio.signal())
    }

    async fn measure_throughput(&self) -> OrchestratorResult<ThroughputMetrics> {
        self.speedtests.fetch_add(1, Ordering::SeqCst);
        Ok(self.radio.throughput())
    }
}

/// In-memory progress store; clones share the same snapshot
#[derive(Clone, Default)]
pub struct MemoryStore {
    snapshot: Arc<Mutex<Option<Progress>>>,
    saves: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<Progress> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn load(&self) -> OrchestratorResult<Option<Progress>> {
        Ok(self.snapshot())
    }

    async fn save(&self, progress: &Progress) -> OrchestratorResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock().unwrap() = Some(progress.clone());
        Ok(())
    }

    async fn delete(&self) -> OrchestratorResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock().unwrap() = None;
        Ok(())
    }
}

/// Type alias for test orchestrator with scripted adapters
pub type TestOrchestrator<S = MemoryStore> = Orchestrator<ScriptedDevice, ScriptedMetrics, S>;

/// Builder pattern for creating test orchestrators with sensible defaults
pub struct OrchestratorBuilder {
    config: CampaignConfig,
    radio: FakeRadio,
    seed: u64,
}

impl OrchestratorBuilder {
    pub fn new(config: CampaignConfig) -> Self {
        Self {
            config,
            radio: FakeRadio::new(),
            seed: 7,
        }
    }

    pub fn with_radio(mut self, radio: FakeRadio) -> Self {
        self.radio = radio;
        self
    }

    pub fn with_config<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut CampaignConfig),
    {
        setup(&mut self.config);
        self
    }

    pub fn build(self) -> TestOrchestrator {
        self.build_with_store(MemoryStore::new())
    }

    pub fn build_with_store<S: ProgressStore + 'static>(self, store: S) -> TestOrchestrator<S> {
        let radio = Arc::new(self.radio);
        Orchestrator::new(
            self.config,
            ScriptedDevice::new(radio.clone()),
            ScriptedMetrics::new(radio),
            store,
        )
        .with_seed(self.seed)
    }
}

/// Helper functions for common test assertions
pub struct TestHelpers;

impl TestHelpers {
    /// Results without timing fields, sorted, for multiset comparison
    pub fn outcome_multiset(results: &[AttemptResult]) -> Vec<String> {
        let mut outcomes: Vec<String> = results
            .iter()
            .map(|r| {
                format!(
                    "{} {} {} {:.2} {:.2} {:.2}",
                    r.combination, r.band, r.rsrp, r.download_mbps, r.upload_mbps, r.ping_ms
                )
            })
            .collect();
        outcomes.sort();
        outcomes
    }

    pub fn identities<'a, I>(combinations: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a Combination>,
    {
        combinations.into_iter().map(Combination::identity).collect()
    }
}
