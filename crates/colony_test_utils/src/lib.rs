//! # Colony Test Utilities
//!
//! Shared testing utilities for the colony crates:
//! - Determinism test harness
//! - Fixture maps and scenarios
//! - Property-based testing strategies
//! - Test logging setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod logging;

/// Re-export proptest for convenience.
pub use proptest;
