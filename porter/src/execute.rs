//! Execution engines for migration tasks.
//!
//! An [`ExecuteEngine`] accepts a task together with a completion sender and runs the
//! task on its own worker, bounded by the engine's permit pool. Each job uses two
//! engine instances, one per phase, so the phases can be sized independently and an
//! incremental task can never starve inventory throughput or vice versa.
//!
//! Completions are reported as explicit [`TaskCompletion`] messages (phase tag, task
//! id, outcome) over an mpsc channel consumed by the job coordinator. Workers never
//! touch job state directly.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tracing::{Instrument, debug};

use crate::error::PorterError;
use crate::job::JobId;
use crate::task::Task;

/// Identifies which migration phase a task belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum JobPhase {
    Inventory,
    Incremental,
}

impl JobPhase {
    pub fn as_static_str(&self) -> &'static str {
        match self {
            JobPhase::Inventory => "inventory",
            JobPhase::Incremental => "incremental",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_static_str())
    }
}

/// Outcome of one finished task.
#[derive(Debug)]
pub enum TaskOutcome {
    /// The task's `start` returned normally.
    Succeeded,
    /// The task's `start` returned an error.
    Failed(PorterError),
}

/// Completion message reported by an engine worker, exactly once per submitted task.
#[derive(Debug)]
pub struct TaskCompletion {
    pub phase: JobPhase,
    pub task_id: String,
    pub outcome: TaskOutcome,
}

/// Transmitter side of the completion channel, cloned into every submission.
pub type CompletionTx = mpsc::UnboundedSender<TaskCompletion>;

/// Receiver side of the completion channel, consumed by the job coordinator.
pub type CompletionRx = mpsc::UnboundedReceiver<TaskCompletion>;

/// Creates the completion channel for one job.
///
/// The channel is unbounded: completions are small, their number is bounded by the
/// job's task count, and an engine worker must never block on reporting.
pub fn create_completion_channel() -> (CompletionTx, CompletionRx) {
    mpsc::unbounded_channel()
}

/// Runs submitted tasks asynchronously, bounded by a permit pool.
///
/// Submission is fire-and-forget: it never blocks the submitter and reports nothing
/// back to it. A task submitted while all permits are taken waits on a worker slot,
/// which is the only throttling the engine applies.
#[derive(Debug, Clone)]
pub struct ExecuteEngine {
    phase: JobPhase,
    permits: Arc<Semaphore>,
}

impl ExecuteEngine {
    /// Creates an engine for `phase` with `max_workers` concurrent worker slots.
    pub fn new(phase: JobPhase, max_workers: u16) -> Self {
        Self {
            phase,
            permits: Arc::new(Semaphore::new(max_workers as usize)),
        }
    }

    /// Submits `task` for asynchronous execution.
    ///
    /// The task's `start` runs on a spawned worker, never on the calling task.
    /// Exactly one [`TaskCompletion`] is sent on `completion_tx` when `start`
    /// returns; a dropped receiver means the job already wound down and the
    /// completion is discarded.
    pub fn submit<P: 'static>(
        &self,
        job_id: JobId,
        task: Arc<dyn Task<P>>,
        completion_tx: CompletionTx,
    ) {
        let phase = self.phase;
        let permits = self.permits.clone();
        let span = tracing::info_span!(
            "task_worker",
            job_id,
            phase = %phase,
            task_id = %task.task_id()
        );

        tokio::spawn(
            async move {
                // The engine never closes its semaphore, so acquisition only fails
                // when the whole runtime is shutting down.
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };

                debug!("task started");
                let outcome = match task.start().await {
                    Ok(()) => TaskOutcome::Succeeded,
                    Err(err) => TaskOutcome::Failed(err),
                };
                debug!("task finished");

                let completion = TaskCompletion {
                    phase,
                    task_id: task.task_id().to_string(),
                    outcome,
                };
                let _ = completion_tx.send(completion);
            }
            .instrument(span),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::InventoryTask;
    use crate::test_utils::task::TestInventoryTask;

    #[tokio::test]
    async fn submit_reports_success_completion() {
        let engine = ExecuteEngine::new(JobPhase::Inventory, 2);
        let (tx, mut rx) = create_completion_channel();

        let task = TestInventoryTask::completing("inv-0");
        engine.submit(1, task.clone() as Arc<InventoryTask>, tx);

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.phase, JobPhase::Inventory);
        assert_eq!(completion.task_id, "inv-0");
        assert!(matches!(completion.outcome, TaskOutcome::Succeeded));
        assert!(task.progress().is_finished());
    }

    #[tokio::test]
    async fn submit_reports_failure_completion() {
        let engine = ExecuteEngine::new(JobPhase::Incremental, 1);
        let (tx, mut rx) = create_completion_channel();

        let task = TestInventoryTask::failing("inv-err");
        engine.submit(1, task as Arc<InventoryTask>, tx);

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.phase, JobPhase::Incremental);
        assert_eq!(completion.task_id, "inv-err");
        assert!(matches!(completion.outcome, TaskOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn submission_does_not_block_on_a_full_engine() {
        let engine = ExecuteEngine::new(JobPhase::Inventory, 1);
        let (tx, mut rx) = create_completion_channel();

        let blocked = TestInventoryTask::gated("inv-gated");
        let queued = TestInventoryTask::completing("inv-queued");

        engine.submit(1, blocked.clone() as Arc<InventoryTask>, tx.clone());
        blocked.wait_until_started().await;

        // With a single permit the second submission must queue, not run.
        engine.submit(1, queued.clone() as Arc<InventoryTask>, tx);
        assert_eq!(queued.start_count(), 0);

        blocked.release();
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.task_id, "inv-gated");
        assert_eq!(second.task_id, "inv-queued");
    }
}
