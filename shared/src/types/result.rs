//! Measurement records produced by each evaluated combination

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::combination::Combination;

/// Placeholder for device-reported fields that could not be read
pub const NOT_AVAILABLE: &str = "N/A";

/// Band label recorded when the device reported no radio service
pub const NO_SERVICE_LABEL: &str = "NO_SERVICE";

/// Signal quality as reported by the device
///
/// Values are kept as the device's own strings (e.g. `"-95dBm"`); they are
/// not guaranteed to be numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalMetrics {
    pub band: String,
    pub rsrp: String,
    pub rsrq: String,
    pub sinr: String,
    pub cell_id: String,
    pub enodeb_id: String,
}

impl SignalMetrics {
    pub fn unavailable() -> Self {
        Self {
            band: NOT_AVAILABLE.to_string(),
            rsrp: NOT_AVAILABLE.to_string(),
            rsrq: NOT_AVAILABLE.to_string(),
            sinr: NOT_AVAILABLE.to_string(),
            cell_id: NOT_AVAILABLE.to_string(),
            enodeb_id: NOT_AVAILABLE.to_string(),
        }
    }
}

impl Default for SignalMetrics {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Throughput measurement; zero means "not measured"
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputMetrics {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: f64,
}

impl ThroughputMetrics {
    pub fn is_zero(&self) -> bool {
        self.download_mbps <= 0.0 && self.upload_mbps <= 0.0
    }
}

/// One resolved evaluation of a combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub timestamp: DateTime<Utc>,
    pub combination: Combination,
    pub band: String,
    pub rsrp: String,
    pub rsrq: String,
    pub sinr: String,
    pub cell_id: String,
    pub enodeb_id: String,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: f64,
    pub duration_secs: f64,
}

impl AttemptResult {
    pub fn measured(
        combination: Combination,
        signal: SignalMetrics,
        throughput: ThroughputMetrics,
        duration: Duration,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            combination,
            band: signal.band,
            rsrp: signal.rsrp,
            rsrq: signal.rsrq,
            sinr: signal.sinr,
            cell_id: signal.cell_id,
            enodeb_id: signal.enodeb_id,
            download_mbps: throughput.download_mbps,
            upload_mbps: throughput.upload_mbps,
            ping_ms: throughput.ping_ms,
            duration_secs: duration.as_secs_f64(),
        }
    }

    /// Zero-valued record for a combination without radio service
    pub fn no_service(combination: Combination, duration: Duration) -> Self {
        let mut signal = SignalMetrics::unavailable();
        signal.band = NO_SERVICE_LABEL.to_string();
        Self::measured(combination, signal, ThroughputMetrics::default(), duration)
    }

    pub fn is_no_service(&self) -> bool {
        self.band == NO_SERVICE_LABEL
    }

    pub fn throughput(&self) -> ThroughputMetrics {
        ThroughputMetrics {
            download_mbps: self.download_mbps,
            upload_mbps: self.upload_mbps,
            ping_ms: self.ping_ms,
        }
    }

    /// Service was present but nothing could be measured
    pub fn is_speedtest_failure(&self) -> bool {
        !self.is_no_service() && self.throughput().is_zero()
    }
}
