//! Telemetry initialization for porter services and tests.

pub mod tracing;
