//! Core campaign logic
//!
//! Pure business logic with no I/O dependencies. Everything here is
//! deterministic for fixed inputs and testable without a device.

pub mod attempt;
pub mod failure;
pub mod generator;
pub mod planner;
pub mod report;

pub use attempt::{transition, AttemptEvent, AttemptState, InvalidTransition};
pub use failure::{Classification, FailureState, SkipReason};
pub use planner::{plan_work, WorkPlan};
pub use report::{CampaignReport, SkippedCombination};
