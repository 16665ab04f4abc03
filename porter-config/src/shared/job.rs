use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

const fn default_max_inventory_workers() -> u16 {
    4
}

const fn default_max_incremental_workers() -> u16 {
    1
}

/// Configuration for a migration job.
///
/// Contains the settings required to schedule one migration job: the job identifier and
/// the sizes of the two execution engines. The engines are sized independently so that
/// incremental change capture never starves inventory throughput or vice versa.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobConfig {
    /// The unique identifier for this migration job.
    pub id: u64,
    /// Maximum number of inventory tasks that can run at a time.
    #[serde(default = "default_max_inventory_workers")]
    pub max_inventory_workers: u16,
    /// Maximum number of incremental tasks that can run at a time.
    #[serde(default = "default_max_incremental_workers")]
    pub max_incremental_workers: u16,
}

impl JobConfig {
    /// Validates job configuration settings.
    ///
    /// Ensures both engine worker counts are non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_inventory_workers == 0 {
            return Err(ValidationError::MaxInventoryWorkersZero);
        }

        if self.max_incremental_workers == 0 {
            return Err(ValidationError::MaxIncrementalWorkersZero);
        }

        Ok(())
    }
}
