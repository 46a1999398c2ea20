//! Work list construction for a campaign run

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use shared::Combination;

use super::generator;
use crate::config::CampaignConfig;

/// The combinations a run considers and the order it will attempt them in
#[derive(Debug, Clone, PartialEq)]
pub struct WorkPlan {
    /// Every combination the filtered catalog generates, in generation order
    pub universe: Vec<Combination>,
    /// Not-yet-attempted combinations, ascending group size, limit applied
    pub queue: Vec<Combination>,
}

impl WorkPlan {
    /// Whether this run will exhaust the whole universe
    pub fn covers_universe(&self, completed: &HashSet<Combination>) -> bool {
        self.universe
            .iter()
            .all(|combination| completed.contains(combination) || self.queue.contains(combination))
    }
}

/// Scheduling key: group size, with `AUTO` after everything else
pub fn schedule_key(combination: &Combination) -> usize {
    combination.group_size().unwrap_or(usize::MAX)
}

/// Build the work plan for a run
///
/// Already attempted combinations are removed first, then the queue is
/// optionally shuffled and stably sorted by group size so every singleton
/// is attempted before any larger combination containing its band. The
/// limit is applied last.
pub fn plan_work<R: Rng + ?Sized>(config: &CampaignConfig, completed: &HashSet<Combination>, rng: &mut R) -> WorkPlan {
    let universe = generator::generate(&config.effective_catalog(), config.max_group_size, config.include_auto);

    let mut queue: Vec<Combination> = universe
        .iter()
        .filter(|combination| !completed.contains(combination))
        .cloned()
        .collect();

    if config.randomize {
        queue.shuffle(rng);
    }
    queue.sort_by_key(schedule_key);

    if let Some(limit) = config.limit {
        queue.truncate(limit);
    }

    WorkPlan { universe, queue }
}
