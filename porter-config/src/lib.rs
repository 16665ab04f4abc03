//! Configuration for the porter migration system.
//!
//! Provides the shared configuration structures consumed by migration jobs as well as
//! hierarchical loading from configuration files and environment variables.

pub mod environment;
pub mod load;
pub mod shared;
