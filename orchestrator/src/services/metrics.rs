//! Metrics adapter backed by a signal script and a speedtest tool
//!
//! Neither tool failing to produce data is an error: missing signal fields
//! become `"N/A"` and a failed speedtest reads as zero throughput, which the
//! failure tracker then classifies. Only a program that cannot be started at
//! all is reported as a transport error.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use shared::{SignalMetrics, ThroughputMetrics, NOT_AVAILABLE};

use super::command::{stderr_summary, ExternalCommand};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::MetricsAdapter;

/// Ookla CLI (`speedtest --format=json`): bandwidth in bytes per second
#[derive(Debug, Deserialize)]
struct OoklaReport {
    download: OoklaTransfer,
    upload: OoklaTransfer,
    #[serde(default)]
    ping: Option<OoklaPing>,
}

#[derive(Debug, Deserialize)]
struct OoklaTransfer {
    bandwidth: f64,
}

#[derive(Debug, Deserialize)]
struct OoklaPing {
    latency: f64,
}

/// speedtest-cli (`speedtest-cli --json`): rates in bits per second
#[derive(Debug, Deserialize)]
struct LegacyReport {
    download: f64,
    upload: f64,
    #[serde(default)]
    ping: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpeedtestReport {
    Ookla(OoklaReport),
    Legacy(LegacyReport),
}

impl From<SpeedtestReport> for ThroughputMetrics {
    fn from(report: SpeedtestReport) -> Self {
        match report {
            SpeedtestReport::Ookla(r) => ThroughputMetrics {
                download_mbps: r.download.bandwidth * 8.0 / 1_000_000.0,
                upload_mbps: r.upload.bandwidth * 8.0 / 1_000_000.0,
                ping_ms: r.ping.map(|p| p.latency).unwrap_or(0.0),
            },
            SpeedtestReport::Legacy(r) => ThroughputMetrics {
                download_mbps: r.download / 1_000_000.0,
                upload_mbps: r.upload / 1_000_000.0,
                ping_ms: r.ping,
            },
        }
    }
}

/// Parse speedtest output, zero on anything unreadable
pub fn parse_speedtest(stdout: &str) -> ThroughputMetrics {
    // Some builds print progress lines before the JSON document
    let json = stdout.lines().rev().map(str::trim).find(|line| line.starts_with('{'));

    match json.map(serde_json::from_str::<SpeedtestReport>) {
        Some(Ok(report)) => {
            let mut metrics = ThroughputMetrics::from(report);
            metrics.download_mbps = round2(metrics.download_mbps.max(0.0));
            metrics.upload_mbps = round2(metrics.upload_mbps.max(0.0));
            metrics.ping_ms = round2(metrics.ping_ms.max(0.0));
            metrics
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "⚠️ Unreadable speedtest output, recording zero throughput");
            ThroughputMetrics::default()
        }
        None => {
            tracing::warn!("⚠️ Speedtest produced no JSON, recording zero throughput");
            ThroughputMetrics::default()
        }
    }
}

/// Parse signal script output; values may be strings or numbers
pub fn parse_signal(stdout: &str) -> SignalMetrics {
    let value: Value = match serde_json::from_str(stdout.trim()) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "⚠️ Unreadable signal output");
            return SignalMetrics::unavailable();
        }
    };

    let field = |name: &str| match value.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    };

    SignalMetrics {
        band: field("band"),
        rsrp: field("rsrp"),
        rsrq: field("rsrq"),
        sinr: field("sinr"),
        cell_id: field("cell_id"),
        enodeb_id: field("enodeb_id"),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Real metrics adapter
pub struct CommandMetrics {
    signal: Option<ExternalCommand>,
    speedtest: ExternalCommand,
}

impl CommandMetrics {
    pub fn new(speedtest: ExternalCommand) -> Self {
        Self { signal: None, speedtest }
    }

    /// Read signal quality through `script` (fluent API)
    pub fn with_signal_script(mut self, script: Option<ExternalCommand>) -> Self {
        self.signal = script;
        self
    }

    async fn run(&self, command: &ExternalCommand) -> OrchestratorResult<Option<String>> {
        let output = command
            .build()
            .output()
            .await
            .map_err(|e| OrchestratorError::MetricsTransport {
                message: format!("cannot run '{}': {e}", command.program()),
            })?;

        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
        } else {
            tracing::warn!(
                program = command.program(),
                error = %stderr_summary(&output),
                "⚠️ Measurement tool failed"
            );
            Ok(None)
        }
    }
}

#[async_trait]
impl MetricsAdapter for CommandMetrics {
    async fn read_signal_metrics(&self) -> OrchestratorResult<SignalMetrics> {
        let Some(script) = &self.signal else {
            return Ok(SignalMetrics::unavailable());
        };
        Ok(self
            .run(script)
            .await?
            .map(|stdout| parse_signal(&stdout))
            .unwrap_or_else(SignalMetrics::unavailable))
    }

    async fn measure_throughput(&self) -> OrchestratorResult<ThroughputMetrics> {
        Ok(self
            .run(&self.speedtest)
            .await?
            .map(|stdout| parse_speedtest(&stdout))
            .unwrap_or_default())
    }
}
