//! End-to-end test support for Cadence
//!
//! Integration tests live under `tests/`; this library holds the shared
//! harness and fixtures they use.

pub mod harness;

pub use harness::TestDeckStore;
pub use mocks::{BatchConfig, TestDataFactory, TestScenario};
