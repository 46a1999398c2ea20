//! Durable campaign progress snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::combination::Combination;
use super::result::AttemptResult;

/// Everything needed to resume an interrupted campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub campaign_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Every combination already resolved, skipped and abandoned ones included
    pub completed_combinations: Vec<Combination>,
    pub results: Vec<AttemptResult>,
    pub last_updated: DateTime<Utc>,
}

impl Progress {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            campaign_id: Uuid::new_v4(),
            started_at: now,
            completed_combinations: Vec::new(),
            results: Vec::new(),
            last_updated: now,
        }
    }

    pub fn is_completed(&self, combination: &Combination) -> bool {
        self.completed_combinations.contains(combination)
    }

    pub fn completed_set(&self) -> HashSet<Combination> {
        self.completed_combinations.iter().cloned().collect()
    }

    /// Mark a combination as resolved without a result
    pub fn mark_completed(&mut self, combination: Combination) {
        if !self.is_completed(&combination) {
            self.completed_combinations.push(combination);
        }
        self.last_updated = Utc::now();
    }

    /// Append a result and mark its combination resolved
    pub fn record(&mut self, result: AttemptResult) {
        let combination = result.combination.clone();
        self.results.push(result);
        self.mark_completed(combination);
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}
