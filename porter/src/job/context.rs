use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::job::progress::JobProgress;
use crate::job::status::{JobEvent, JobStatus};
use crate::task::{
    IncrementalTask, IncrementalTaskProgress, InventoryTask, InventoryTaskProgress,
};

/// Unique identifier of one migration job.
pub type JobId = u64;

/// The mutable record of one migration job.
///
/// Holds the job identity, the current status, and the two ordered task collections.
/// The collections are fixed in membership once the context is created; the scheduler
/// only reads them and calls lifecycle methods on their elements. The status is
/// mutated exclusively by the scheduler through [`JobContext::transition`].
#[derive(Debug)]
pub struct JobContext {
    job_id: JobId,
    status: RwLock<JobStatus>,
    inventory_tasks: Vec<Arc<InventoryTask>>,
    incremental_tasks: Vec<Arc<IncrementalTask>>,
}

impl JobContext {
    /// Creates the context for a new job in [`JobStatus::Pending`].
    pub fn new(
        job_id: JobId,
        inventory_tasks: Vec<Arc<InventoryTask>>,
        incremental_tasks: Vec<Arc<IncrementalTask>>,
    ) -> Self {
        Self {
            job_id,
            status: RwLock::new(JobStatus::Pending),
            inventory_tasks,
            incremental_tasks,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Returns the current job status.
    pub fn status(&self) -> JobStatus {
        *self.status.read().unwrap()
    }

    /// Applies `event` to the job status under the status lock and returns the result.
    ///
    /// The read-modify-write is a single lock acquisition, so racing events from the
    /// coordinator and external stop callers serialize here.
    pub(crate) fn transition(&self, event: JobEvent) -> JobStatus {
        let mut status = self.status.write().unwrap();
        let next = status.transition(event);
        if next != *status {
            debug!(job_id = self.job_id, from = %status, to = %next, "job status changed");
            *status = next;
        }
        next
    }

    pub fn inventory_tasks(&self) -> &[Arc<InventoryTask>] {
        &self.inventory_tasks
    }

    pub fn incremental_tasks(&self) -> &[Arc<IncrementalTask>] {
        &self.incremental_tasks
    }

    /// Returns `true` once every inventory task reports a finished snapshot.
    ///
    /// Vacuously true for a job without inventory tasks, which is what lets the
    /// scheduler skip straight to the incremental phase.
    pub fn all_inventory_tasks_finished(&self) -> bool {
        self.inventory_tasks
            .iter()
            .all(|task| task.progress().is_finished())
    }

    /// Maps every inventory task to its current progress, preserving collection order.
    pub fn inventory_progress(&self) -> Vec<InventoryTaskProgress> {
        self.inventory_tasks
            .iter()
            .map(|task| task.progress())
            .collect()
    }

    /// Maps every incremental task to its current progress, preserving collection order.
    pub fn incremental_progress(&self) -> Vec<IncrementalTaskProgress> {
        self.incremental_tasks
            .iter()
            .map(|task| task.progress())
            .collect()
    }

    /// Returns one aggregated snapshot of the whole job.
    pub fn progress(&self) -> JobProgress {
        JobProgress {
            job_id: self.job_id,
            status: self.status(),
            inventory: self.inventory_progress(),
            incremental: self.incremental_progress(),
        }
    }
}
