use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Maximum inventory workers cannot be zero.
    #[error("`max_inventory_workers` cannot be zero")]
    MaxInventoryWorkersZero,
    /// Maximum incremental workers cannot be zero.
    #[error("`max_incremental_workers` cannot be zero")]
    MaxIncrementalWorkersZero,
}
