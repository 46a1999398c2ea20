//! Common test utilities and infrastructure
//!
//! Scripted in-memory adapters and a builder shared by the campaign and
//! resume suites.
#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::{FakeRadio, TestFixtures};
pub use helpers::{MemoryStore, OrchestratorBuilder, ScriptedDevice, ScriptedMetrics, TestHelpers, TestOrchestrator};
