//! Resolved campaign configuration
//!
//! The command line is parsed in `main.rs`; the core only ever sees this
//! record.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use shared::{Band, Combination};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Bands offered by the device when no catalog override is given
pub const DEFAULT_CATALOG: &[u16] = &[1, 3, 7, 8, 20, 28, 32, 38];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Ordered band catalog the combinations are drawn from
    pub catalog: Vec<Band>,
    /// Largest combination size to generate
    pub max_group_size: usize,
    /// When non-empty, only these bands are used
    pub include: Vec<Band>,
    pub exclude: Vec<Band>,
    /// Combinations excluded by hand
    pub skip: Vec<Combination>,
    /// Maximum number of combinations to test in this run
    pub limit: Option<usize>,
    pub include_auto: bool,
    pub randomize: bool,
    pub resume: bool,
    pub progress_path: PathBuf,
    /// Report path without extension; `.csv` and `.json` are appended
    pub output_path: PathBuf,
    pub stabilization_wait: Duration,
    pub settle_wait: Duration,
    /// Additional apply attempts after the first failure
    pub retry_budget: u32,
    pub apply_timeout: Duration,
    pub signal_timeout: Duration,
    pub throughput_timeout: Duration,
    pub top_n: usize,
    /// Consecutive progress save failures tolerated before aborting
    pub max_save_failures: u32,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG.iter().copied().map(Band::new).collect(),
            max_group_size: 2,
            include: Vec::new(),
            exclude: Vec::new(),
            skip: Vec::new(),
            limit: None,
            include_auto: false,
            randomize: false,
            resume: false,
            progress_path: PathBuf::from("band_test_progress.json"),
            output_path: PathBuf::from("band_test_results"),
            stabilization_wait: Duration::from_secs(30),
            settle_wait: Duration::from_secs(5),
            retry_budget: 2,
            apply_timeout: Duration::from_secs(120),
            signal_timeout: Duration::from_secs(30),
            throughput_timeout: Duration::from_secs(180),
            top_n: 5,
            max_save_failures: 3,
        }
    }
}

impl CampaignConfig {
    /// Catalog after include/exclude filters, catalog order preserved
    pub fn effective_catalog(&self) -> Vec<Band> {
        self.catalog
            .iter()
            .copied()
            .filter(|band| self.include.is_empty() || self.include.contains(band))
            .filter(|band| !self.exclude.contains(band))
            .collect()
    }

    /// Whether this run covers less than the full generated space
    pub fn is_filtered(&self) -> bool {
        !self.include.is_empty() || !self.exclude.is_empty() || !self.skip.is_empty() || self.limit.is_some()
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        if let Some(band) = self.include.iter().find(|band| !self.catalog.contains(band)) {
            return Err(OrchestratorError::config(format!("include band {band} is not in the catalog")));
        }

        if let Some(band) = self.include.iter().find(|band| self.exclude.contains(band)) {
            return Err(OrchestratorError::config(format!("band {band} is both included and excluded")));
        }

        if self.apply_timeout.is_zero() || self.signal_timeout.is_zero() || self.throughput_timeout.is_zero() {
            return Err(OrchestratorError::config("adapter timeouts must be non-zero"));
        }

        if self.effective_catalog().is_empty() && !self.include_auto {
            return Err(OrchestratorError::config("filters leave no bands to test"));
        }

        Ok(())
    }
}
