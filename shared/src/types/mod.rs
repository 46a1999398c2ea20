//! Core value types used throughout the campaign

pub mod band;
pub mod combination;
pub mod progress;
pub mod result;

pub use band::Band;
pub use combination::Combination;
pub use progress::Progress;
pub use result::{AttemptResult, SignalMetrics, ThroughputMetrics, NOT_AVAILABLE, NO_SERVICE_LABEL};
