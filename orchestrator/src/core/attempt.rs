//! Per-combination attempt state machine
//!
//! ```text
//! Pending ──skip──▶ Skipped
//! Pending ──dequeue──▶ Configuring(1) ──applied──▶ Measuring(1) ──measured──▶ Recorded
//!                      Configuring(n) ──failed───▶ Configuring(n+1)   (n <= budget)
//!                      Measuring(n)   ──failed───▶ Configuring(n+1)   (n <= budget)
//!                      Configuring(n) / Measuring(n) ──failed──▶ Abandoned (n > budget)
//! ```
//!
//! The transition function is pure; the orchestrator performs the I/O for
//! each state and feeds the outcome back in as an event.

use std::fmt;
use thiserror::Error;

use shared::AttemptResult;

use super::failure::SkipReason;

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    Pending,
    /// Applying the configuration; `attempt` starts at 1
    Configuring { attempt: u32 },
    /// Configuration applied, waiting for stabilization and measuring
    Measuring { attempt: u32 },
    Recorded(AttemptResult),
    Skipped(SkipReason),
    Abandoned { attempts: u32 },
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Recorded(_) | AttemptState::Skipped(_) | AttemptState::Abandoned { .. }
        )
    }

    fn name(&self) -> &'static str {
        match self {
            AttemptState::Pending => "pending",
            AttemptState::Configuring { .. } => "configuring",
            AttemptState::Measuring { .. } => "measuring",
            AttemptState::Recorded(_) => "recorded",
            AttemptState::Skipped(_) => "skipped",
            AttemptState::Abandoned { .. } => "abandoned",
        }
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptState::Configuring { attempt } | AttemptState::Measuring { attempt } => {
                write!(f, "{} (attempt {attempt})", self.name())
            }
            AttemptState::Abandoned { attempts } => write!(f, "abandoned after {attempts} attempts"),
            _ => f.write_str(self.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptEvent {
    /// The failure tracker pruned the combination
    Skip(SkipReason),
    /// Not pruned, start configuring
    Dequeue,
    Applied,
    /// Apply rejected, transient error, or a timed out adapter call
    Failed,
    /// Measurement finished (a no-service record included)
    Measured(AttemptResult),
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid attempt transition from {state} on {event}")]
pub struct InvalidTransition {
    pub state: String,
    pub event: String,
}

/// Advance the state machine by one event
pub fn transition(
    state: AttemptState,
    event: AttemptEvent,
    retry_budget: u32,
) -> Result<AttemptState, InvalidTransition> {
    let next = match (&state, event) {
        (AttemptState::Pending, AttemptEvent::Skip(reason)) => AttemptState::Skipped(reason),
        (AttemptState::Pending, AttemptEvent::Dequeue) => AttemptState::Configuring { attempt: 1 },

        (AttemptState::Configuring { attempt }, AttemptEvent::Applied) => AttemptState::Measuring { attempt: *attempt },
        (AttemptState::Configuring { attempt } | AttemptState::Measuring { attempt }, AttemptEvent::Failed) => {
            retry_or_abandon(*attempt, retry_budget)
        }

        (AttemptState::Measuring { .. }, AttemptEvent::Measured(result)) => AttemptState::Recorded(result),

        (_, event) => {
            return Err(InvalidTransition {
                state: state.to_string(),
                event: event_name(&event).to_string(),
            })
        }
    };

    Ok(next)
}

fn retry_or_abandon(attempt: u32, retry_budget: u32) -> AttemptState {
    if attempt <= retry_budget {
        AttemptState::Configuring { attempt: attempt + 1 }
    } else {
        AttemptState::Abandoned { attempts: attempt }
    }
}

fn event_name(event: &AttemptEvent) -> &'static str {
    match event {
        AttemptEvent::Skip(_) => "skip",
        AttemptEvent::Dequeue => "dequeue",
        AttemptEvent::Applied => "applied",
        AttemptEvent::Failed => "failed",
        AttemptEvent::Measured(_) => "measured",
    }
}
