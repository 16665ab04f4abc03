//! Concurrency primitives for coordinating migration jobs.
//!
//! The scheduler drives a job from a single coordinating task; these primitives carry
//! the signals that reach it from the outside: task completions (see
//! [`crate::execute`]) and stop requests.

pub mod stop;
