//! CSV and JSON campaign reports

use serde::Serialize;
use std::path::{Path, PathBuf};

use shared::AttemptResult;

use crate::config::CampaignConfig;
use crate::core::CampaignReport;
use crate::error::{OrchestratorError, OrchestratorResult};

/// Column order of the tabular report
pub const CSV_COLUMNS: [&str; 12] = [
    "timestamp",
    "band",
    "combination",
    "rsrp",
    "rsrq",
    "sinr",
    "cell_id",
    "enodeb_id",
    "download_mbps",
    "upload_mbps",
    "ping_ms",
    "duration_secs",
];

#[derive(Serialize)]
struct JsonReport<'a> {
    config: &'a CampaignConfig,
    #[serde(flatten)]
    report: &'a CampaignReport,
    elapsed_secs: i64,
}

/// Writes `<base>.csv` and `<base>.json` for a campaign
pub struct ReportWriter {
    base: PathBuf,
}

impl ReportWriter {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn csv_path(&self) -> PathBuf {
        self.with_extension("csv")
    }

    pub fn json_path(&self) -> PathBuf {
        self.with_extension("json")
    }

    fn with_extension(&self, extension: &str) -> PathBuf {
        let mut name = self.base.clone().into_os_string();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }

    /// Write both report files, returning their paths
    pub fn write(&self, report: &CampaignReport, config: &CampaignConfig) -> OrchestratorResult<(PathBuf, PathBuf)> {
        if let Some(parent) = self.base.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let csv_path = self.csv_path();
        write_csv(&csv_path, &report.results)?;

        let json_path = self.json_path();
        let document = JsonReport {
            config,
            report,
            elapsed_secs: report.elapsed().num_seconds(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;
        std::fs::write(&json_path, bytes).map_err(|e| OrchestratorError::ReportError {
            message: format!("{}: {e}", json_path.display()),
        })?;

        tracing::info!(
            csv = %csv_path.display(),
            json = %json_path.display(),
            results = report.results.len(),
            "📝 Reports written"
        );
        Ok((csv_path, json_path))
    }
}

fn write_csv(path: &Path, results: &[AttemptResult]) -> OrchestratorResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_COLUMNS)?;
    for result in results {
        writer.write_record([
            result.timestamp.to_rfc3339(),
            result.band.clone(),
            result.combination.identity(),
            result.rsrp.clone(),
            result.rsrq.clone(),
            result.sinr.clone(),
            result.cell_id.clone(),
            result.enodeb_id.clone(),
            format!("{:.2}", result.download_mbps),
            format!("{:.2}", result.upload_mbps),
            format!("{:.2}", result.ping_ms),
            format!("{:.1}", result.duration_secs),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Log the best `n` combinations and the campaign totals
pub fn log_summary(report: &CampaignReport, n: usize) {
    tracing::info!(
        campaign_id = %report.campaign_id,
        results = report.results.len(),
        skipped = report.skipped.len(),
        abandoned = report.abandoned.len(),
        no_service_bands = report.failures.no_service.len(),
        speedtest_failed_bands = report.failures.speedtest_failed.len(),
        interrupted = report.interrupted,
        elapsed_secs = report.elapsed().num_seconds(),
        "📊 Campaign summary"
    );

    let top = report.top(n);
    if top.is_empty() {
        tracing::warn!("⚠️ No combination produced a usable measurement");
        return;
    }

    for (rank, result) in top.iter().enumerate() {
        tracing::info!(
            rank = rank + 1,
            combination = %result.combination,
            band = %result.band,
            download_mbps = result.download_mbps,
            upload_mbps = result.upload_mbps,
            ping_ms = result.ping_ms,
            rsrp = %result.rsrp,
            sinr = %result.sinr,
            "🏆 Top combination"
        );
    }
}
