//! Campaign outcome and best-of ranking

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

use shared::{AttemptResult, Combination};

use super::failure::FailureState;

/// A combination pruned without touching the device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCombination {
    pub combination: Combination,
    pub reason: String,
}

/// Everything a finished (or interrupted) campaign produced
#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub campaign_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// All results, including those loaded from a resumed progress file
    pub results: Vec<AttemptResult>,
    /// Combinations abandoned in this run
    pub abandoned: Vec<Combination>,
    /// Combinations skipped in this run
    pub skipped: Vec<SkippedCombination>,
    pub failures: FailureState,
    /// Combinations scheduled for this run
    pub planned: usize,
    pub interrupted: bool,
}

impl CampaignReport {
    /// Results with service, best first
    ///
    /// Ordered by download, then upload, then lower ping. A ping of zero
    /// means not measured and ranks last.
    pub fn ranked(&self) -> Vec<&AttemptResult> {
        let mut ranked: Vec<&AttemptResult> = self.results.iter().filter(|r| !r.is_no_service()).collect();
        ranked.sort_by(|a, b| compare_results(a, b));
        ranked
    }

    pub fn top(&self, n: usize) -> Vec<&AttemptResult> {
        self.ranked().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&AttemptResult> {
        self.ranked().into_iter().next()
    }

    /// Wall-clock time since the campaign first started, across resumes
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

fn compare_results(a: &AttemptResult, b: &AttemptResult) -> Ordering {
    b.download_mbps
        .total_cmp(&a.download_mbps)
        .then_with(|| b.upload_mbps.total_cmp(&a.upload_mbps))
        .then_with(|| ping_key(a.ping_ms).total_cmp(&ping_key(b.ping_ms)))
}

fn ping_key(ping_ms: f64) -> f64 {
    if ping_ms > 0.0 {
        ping_ms
    } else {
        f64::INFINITY
    }
}
