//! Adaptive failure classification
//!
//! Keeps three disjoint pieces of knowledge about the search space and
//! decides whether a combination can be skipped before touching the device:
//!
//! - bands that alone give no radio service; every combination containing
//!   one of them is poisoned
//! - bands that alone give service but no throughput; only combinations
//!   with two or more of them are poisoned, a single one is still tried
//! - combinations explicitly skipped, either propagated or excluded by hand
//!
//! The state only grows during a run. Seeding from a progress file replays
//! the recorded results in the order they were resolved, so a resumed run
//! reaches the same state a continuous run would have.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use shared::{AttemptResult, Band, Combination, Progress};

/// Why a combination was skipped without being attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoServiceMember(Band),
    MultipleSpeedtestFailed(Vec<Band>),
    ExplicitlySkipped,
}

impl SkipReason {
    /// Human-readable reason tag
    pub fn tag(&self) -> &'static str {
        match self {
            SkipReason::NoServiceMember(_) => "no-service member",
            SkipReason::MultipleSpeedtestFailed(_) => "multiple speedtest-failed members",
            SkipReason::ExplicitlySkipped => "explicitly skipped",
        }
    }

    /// Only no-service skips produce a synthesized zero result
    pub fn records_result(&self) -> bool {
        matches!(self, SkipReason::NoServiceMember(_))
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoServiceMember(band) => write!(f, "{} (band {band})", self.tag()),
            SkipReason::MultipleSpeedtestFailed(bands) => {
                let list: Vec<String> = bands.iter().map(Band::to_string).collect();
                write!(f, "{} ({})", self.tag(), list.join(", "))
            }
            SkipReason::ExplicitlySkipped => f.write_str(self.tag()),
        }
    }
}

/// What a singleton result taught us about its band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    NoService(Band),
    SpeedtestFailed(Band),
    Healthy,
    /// Multi-band and `AUTO` results carry no per-band knowledge
    NotClassified,
}

impl Classification {
    pub fn of(result: &AttemptResult) -> Self {
        let Some(band) = result.combination.sole_band() else {
            return Classification::NotClassified;
        };

        if result.is_no_service() {
            Classification::NoService(band)
        } else if result.is_speedtest_failure() {
            Classification::SpeedtestFailed(band)
        } else {
            Classification::Healthy
        }
    }
}

/// Process-lifetime failure knowledge, owned by the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureState {
    pub no_service: BTreeSet<Band>,
    pub speedtest_failed: BTreeSet<Band>,
    pub skipped: BTreeSet<Combination>,
}

impl FailureState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded with hand-excluded combinations
    pub fn with_skipped<I>(skipped: I) -> Self
    where
        I: IntoIterator<Item = Combination>,
    {
        Self {
            skipped: skipped.into_iter().filter(|c| !c.is_auto()).collect(),
            ..Self::default()
        }
    }

    /// Decide whether `combination` can be skipped; first matching rule wins
    pub fn should_skip(&self, combination: &Combination) -> Option<SkipReason> {
        if combination.is_auto() {
            return None;
        }

        if let Some(band) = combination.bands().iter().find(|band| self.no_service.contains(band)) {
            return Some(SkipReason::NoServiceMember(*band));
        }

        let failed = self.speedtest_failed_members(combination);
        if failed.len() >= 2 {
            return Some(SkipReason::MultipleSpeedtestFailed(failed));
        }

        if self.skipped.contains(combination) {
            return Some(SkipReason::ExplicitlySkipped);
        }

        None
    }

    fn speedtest_failed_members(&self, combination: &Combination) -> Vec<Band> {
        combination
            .bands()
            .iter()
            .copied()
            .filter(|band| self.speedtest_failed.contains(band))
            .collect()
    }

    /// Learn from a recorded result and proactively skip affected combinations
    ///
    /// `pending` must be the combinations not yet attempted. Returns the
    /// classification and the combinations newly added to the skip set.
    pub fn apply<'a, I>(&mut self, result: &AttemptResult, pending: I) -> (Classification, Vec<Combination>)
    where
        I: IntoIterator<Item = &'a Combination>,
    {
        let classification = Classification::of(result);

        let newly_skipped = match classification {
            Classification::NoService(band) => {
                self.no_service.insert(band);
                self.extend_skipped(pending, |c| c.contains(band))
            }
            Classification::SpeedtestFailed(band) => {
                self.speedtest_failed.insert(band);
                let failed = self.speedtest_failed.clone();
                self.extend_skipped(pending, |c| c.bands().iter().filter(|b| failed.contains(b)).count() >= 2)
            }
            Classification::Healthy | Classification::NotClassified => Vec::new(),
        };

        (classification, newly_skipped)
    }

    fn extend_skipped<'a, I, F>(&mut self, pending: I, poisoned: F) -> Vec<Combination>
    where
        I: IntoIterator<Item = &'a Combination>,
        F: Fn(&Combination) -> bool,
    {
        let mut added = Vec::new();
        for combination in pending {
            if combination.is_auto() || !poisoned(combination) {
                continue;
            }
            if self.skipped.insert(combination.clone()) {
                added.push(combination.clone());
            }
        }
        added
    }

    /// Rebuild failure knowledge from a loaded progress snapshot
    ///
    /// Results are replayed in the order their combinations were resolved.
    /// At each step the pending set is `universe` minus everything resolved
    /// so far, which is exactly what a continuous run saw at that point.
    pub fn replay(&mut self, progress: &Progress, universe: &[Combination]) {
        let results: HashMap<&Combination, &AttemptResult> =
            progress.results.iter().map(|r| (&r.combination, r)).collect();

        let mut resolved: HashSet<&Combination> = HashSet::new();
        for combination in &progress.completed_combinations {
            resolved.insert(combination);
            if let Some(result) = results.get(combination) {
                let pending = universe.iter().filter(|c| !resolved.contains(c));
                self.apply(result, pending);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{SignalMetrics, ThroughputMetrics};
    use std::time::Duration;

    fn combo(identity: &str) -> Combination {
        identity.parse().unwrap()
    }

    fn healthy(identity: &str) -> AttemptResult {
        let signal = SignalMetrics { band: "B1".to_string(), ..SignalMetrics::unavailable() };
        let throughput = ThroughputMetrics { download_mbps: 50.0, upload_mbps: 10.0, ping_ms: 25.0 };
        AttemptResult::measured(combo(identity), signal, throughput, Duration::ZERO)
    }

    fn speedtest_failed(identity: &str) -> AttemptResult {
        let signal = SignalMetrics { band: "B1".to_string(), ..SignalMetrics::unavailable() };
        AttemptResult::measured(combo(identity), signal, ThroughputMetrics::default(), Duration::ZERO)
    }

    fn no_service(identity: &str) -> AttemptResult {
        AttemptResult::no_service(combo(identity), Duration::ZERO)
    }

    fn universe() -> Vec<Combination> {
        ["1", "3", "7", "20", "1+3", "1+7", "1+20", "3+7", "3+20", "7+20", "AUTO"]
            .iter()
            .map(|s| combo(s))
            .collect()
    }

    #[test]
    fn test_no_service_propagates_to_every_pending_member() {
        let mut state = FailureState::new();
        let pending: Vec<Combination> = universe().into_iter().skip(1).collect();

        let (classification, added) = state.apply(&no_service("7"), pending.iter().filter(|c| c.identity() != "7"));

        assert_eq!(classification, Classification::NoService(Band::new(7)));
        let added: Vec<String> = added.iter().map(Combination::identity).collect();
        assert_eq!(added, vec!["1+7", "3+7", "7+20"]);
        assert_eq!(state.should_skip(&combo("3+7")), Some(SkipReason::NoServiceMember(Band::new(7))));
        assert_eq!(state.should_skip(&combo("1+3")), None);
    }

    #[test]
    fn test_single_speedtest_failure_does_not_poison() {
        let mut state = FailureState::new();
        let pending = universe();

        let (_, added) = state.apply(&speedtest_failed("1"), pending.iter());
        assert!(added.is_empty());
        assert_eq!(state.should_skip(&combo("1+3")), None);

        let (_, added) = state.apply(&speedtest_failed("3"), pending.iter());
        let added: Vec<String> = added.iter().map(Combination::identity).collect();
        assert_eq!(added, vec!["1+3"]);
        assert_eq!(
            state.should_skip(&combo("1+3")),
            Some(SkipReason::MultipleSpeedtestFailed(vec![Band::new(1), Band::new(3)]))
        );
        assert_eq!(state.should_skip(&combo("1+7")), None);
    }

    #[test]
    fn test_rule_order_prefers_no_service() {
        let mut state = FailureState::with_skipped(vec![combo("1+3+7")]);
        state.speedtest_failed.extend([Band::new(1), Band::new(3)]);
        state.no_service.insert(Band::new(7));

        assert_eq!(state.should_skip(&combo("1+3+7")), Some(SkipReason::NoServiceMember(Band::new(7))));

        state.no_service.clear();
        assert_eq!(state.should_skip(&combo("1+3+7")).map(|r| r.tag()), Some("multiple speedtest-failed members"));

        state.speedtest_failed.clear();
        assert_eq!(state.should_skip(&combo("1+3+7")), Some(SkipReason::ExplicitlySkipped));
    }

    #[test]
    fn test_auto_is_never_pruned() {
        let mut state = FailureState::with_skipped(vec![Combination::auto()]);
        state.no_service.insert(Band::new(1));
        assert!(state.skipped.is_empty());
        assert_eq!(state.should_skip(&Combination::auto()), None);

        let (classification, added) = state.apply(&no_service("AUTO"), universe().iter());
        assert_eq!(classification, Classification::NotClassified);
        assert!(added.is_empty());
    }

    #[test]
    fn test_only_no_service_skips_record_results() {
        assert!(SkipReason::NoServiceMember(Band::new(1)).records_result());
        assert!(!SkipReason::MultipleSpeedtestFailed(vec![]).records_result());
        assert!(!SkipReason::ExplicitlySkipped.records_result());
    }

    #[test]
    fn test_multi_band_results_are_not_classified() {
        assert_eq!(Classification::of(&no_service("1+3")), Classification::NotClassified);
        assert_eq!(Classification::of(&healthy("3")), Classification::Healthy);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut state = FailureState::new();
        state.apply(&no_service("7"), universe().iter());
        let snapshot = state.clone();

        let (_, added) = state.apply(&no_service("7"), universe().iter());
        assert!(added.is_empty());
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_replay_matches_live_application() {
        let universe = universe();
        let outcomes = vec![healthy("1"), speedtest_failed("3"), no_service("7"), speedtest_failed("20")];

        // Live: apply each singleton with everything unresolved as pending
        let mut live = FailureState::new();
        let mut progress = Progress::new();
        for result in &outcomes {
            progress.record(result.clone());
            let resolved = progress.completed_set();
            let pending: Vec<&Combination> = universe.iter().filter(|c| !resolved.contains(c)).collect();
            live.apply(result, pending);
        }
        // An explicit skip resolved without a result
        progress.mark_completed(combo("3+20"));

        let mut replayed = FailureState::new();
        replayed.replay(&progress, &universe);

        assert_eq!(replayed, live);
        assert!(replayed.skipped.contains(&combo("3+20")));
        assert!(replayed.skipped.contains(&combo("1+7")));
        assert!(!replayed.skipped.contains(&combo("1+3")));
    }
}
