//! Test fixtures and a simulated radio
//!
//! `FakeRadio` decides what the device reports for whichever combination is
//! currently applied, so device and metrics fakes stay consistent.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use band_orchestrator::CampaignConfig;
use shared::{Band, Combination, SignalMetrics, ThroughputMetrics};
use std::time::Duration;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const SMALL_CATALOG: &'static [u16] = &[1, 3, 20];
    pub const WIDE_CATALOG: &'static [u16] = &[1, 3, 7, 20, 28];

    /// Campaign config with no waits and generous call bounds
    pub fn config(bands: &[u16], max_group_size: usize) -> CampaignConfig {
        CampaignConfig {
            catalog: Self::bands(bands),
            max_group_size,
            stabilization_wait: Duration::ZERO,
            settle_wait: Duration::ZERO,
            apply_timeout: Duration::from_secs(5),
            signal_timeout: Duration::from_secs(5),
            throughput_timeout: Duration::from_secs(5),
            ..CampaignConfig::default()
        }
    }

    pub fn bands(numbers: &[u16]) -> Vec<Band> {
        numbers.iter().copied().map(Band::new).collect()
    }

    pub fn combination(identity: &str) -> Combination {
        identity.parse().unwrap()
    }
}

/// Simulated radio environment
#[derive(Default)]
pub struct FakeRadio {
    /// Bands without any coverage
    pub dead: BTreeSet<Band>,
    /// Bands with coverage but no usable data path
    pub stalled: BTreeSet<Band>,
    /// Remaining apply failures per combination identity
    pub flaky: Mutex<HashMap<String, u32>>,
    /// Remaining apply calls per identity that never return
    pub hanging: Mutex<HashMap<String, u32>>,
    /// Identity whose apply loses the session for good
    pub fatal: Option<String>,
    current: Mutex<Option<Combination>>,
}

impl FakeRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dead(mut self, bands: &[u16]) -> Self {
        self.dead.extend(TestFixtures::bands(bands));
        self
    }

    pub fn with_stalled(mut self, bands: &[u16]) -> Self {
        self.stalled.extend(TestFixtures::bands(bands));
        self
    }

    pub fn with_flaky(self, identity: &str, failures: u32) -> Self {
        self.flaky.lock().unwrap().insert(identity.to_string(), failures);
        self
    }

    pub fn with_hanging(self, identity: &str, times: u32) -> Self {
        self.hanging.lock().unwrap().insert(identity.to_string(), times);
        self
    }

    pub fn with_fatal(mut self, identity: &str) -> Self {
        self.fatal = Some(identity.to_string());
        self
    }

    /// Whether the next apply of `identity` should fail, consuming one failure
    pub fn take_failure(&self, identity: &str) -> bool {
        Self::take(&self.flaky, identity)
    }

    /// Whether the next apply of `identity` should hang, consuming one hang
    pub fn take_hang(&self, identity: &str) -> bool {
        Self::take(&self.hanging, identity)
    }

    fn take(remaining_by_identity: &Mutex<HashMap<String, u32>>, identity: &str) -> bool {
        let mut remaining_by_identity = remaining_by_identity.lock().unwrap();
        match remaining_by_identity.get_mut(identity) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn set_current(&self, combination: &Combination) {
        *self.current.lock().unwrap() = Some(combination.clone());
    }

    fn live_bands(&self) -> Vec<Band> {
        let current = self.current.lock().unwrap();
        match current.as_ref() {
            Some(c) if c.is_auto() => vec![Band::new(3)],
            Some(c) => c.bands().iter().copied().filter(|b| !self.dead.contains(b)).collect(),
            None => Vec::new(),
        }
    }

    pub fn no_service(&self) -> bool {
        self.live_bands().is_empty()
    }

    pub fn signal(&self) -> SignalMetrics {
        match self.live_bands().first() {
            Some(band) => SignalMetrics {
                band: format!("B{band}"),
                rsrp: format!("-{}dBm", 80 + band.number() % 20),
                rsrq: "-10dB".to_string(),
                sinr: "12dB".to_string(),
                cell_id: "4242".to_string(),
                enodeb_id: "99".to_string(),
            },
            None => SignalMetrics::unavailable(),
        }
    }

    /// Download grows with the sum of working band numbers
    pub fn throughput(&self) -> ThroughputMetrics {
        let working: Vec<u16> = self
            .live_bands()
            .into_iter()
            .filter(|b| !self.stalled.contains(b))
            .map(|b| b.number())
            .collect();
        if working.is_empty() {
            return ThroughputMetrics::default();
        }
        let sum: u16 = working.iter().sum();
        ThroughputMetrics {
            download_mbps: f64::from(sum) * 2.0,
            upload_mbps: f64::from(sum) / 2.0,
            ping_ms: 30.0,
        }
    }
}
