//! Property-based tests for the cluster client building blocks.
//!
//! Run with: cargo test --test property_tests

pub mod backoff;
pub mod budgets;
pub mod throttling;
