use serde::{Deserialize, Serialize};

use crate::job::context::JobId;
use crate::job::status::JobStatus;
use crate::task::{IncrementalTaskProgress, InventoryTaskProgress};

/// Aggregated snapshot of one migration job for operator read-out.
///
/// Combines the job status with the progress of every task in both phases, in
/// collection order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub job_id: JobId,
    pub status: JobStatus,
    pub inventory: Vec<InventoryTaskProgress>,
    pub incremental: Vec<IncrementalTaskProgress>,
}
