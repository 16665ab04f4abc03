//! Integration tests for the porter scheduler.
//!
//! Wired as a single test target (see `Cargo.toml`) so the `test-utils` feature can
//! be required for everything in this tree.

mod scheduler_test;
