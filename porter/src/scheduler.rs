//! The migration job scheduler.
//!
//! [`JobScheduler`] drives a single migration job through its two phases: a bounded
//! full-snapshot inventory phase followed by an unbounded live change-capture
//! incremental phase. Each phase is fanned out across many independently running
//! tasks; phase advance is decided purely from asynchronous completion messages.
//!
//! The scheduler owns one coordinating task per job. All status mutation and all
//! phase decisions happen on that task; engine workers only report
//! [`TaskCompletion`] messages. The inventory barrier is the re-evaluation of the
//! "every inventory task finished" predicate on each inventory success: whichever
//! completion observes the predicate true triggers the phase advance, and an
//! idempotency guard keeps a second queued observation from re-submitting the
//! incremental batch.

use std::sync::Arc;

use porter_config::shared::JobConfig;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info};

use crate::concurrency::stop::{StopRx, StopTx, create_stop_channel};
use crate::error::{ErrorKind, PorterResult};
use crate::execute::{
    CompletionTx, ExecuteEngine, JobPhase, TaskCompletion, TaskOutcome, create_completion_channel,
};
use crate::job::{JobContext, JobEvent, JobProgress, JobStatus};
use crate::task::{IncrementalTaskProgress, InventoryTaskProgress};
use crate::{bail, porter_error};

#[derive(Debug)]
enum SchedulerState {
    NotStarted,
    Started { coordinator: JoinHandle<()> },
}

/// Scheduler for one migration job.
///
/// The public surface is intentionally small: [`start`](JobScheduler::start),
/// [`stop`](JobScheduler::stop), [`wait`](JobScheduler::wait), and the progress
/// accessors. Failures are never returned from these operations; the only way to
/// observe them is to poll [`status`](JobScheduler::status) or the progress
/// snapshots.
#[derive(Debug)]
pub struct JobScheduler {
    ctx: Arc<JobContext>,
    inventory_engine: ExecuteEngine,
    incremental_engine: ExecuteEngine,
    stop_tx: StopTx,
    state: SchedulerState,
}

impl JobScheduler {
    /// Creates a scheduler for the job described by `ctx`, with engine pools sized
    /// from `config`.
    pub fn new(ctx: Arc<JobContext>, config: &JobConfig) -> Self {
        let (stop_tx, _) = create_stop_channel();

        Self {
            inventory_engine: ExecuteEngine::new(JobPhase::Inventory, config.max_inventory_workers),
            incremental_engine: ExecuteEngine::new(
                JobPhase::Incremental,
                config.max_incremental_workers,
            ),
            ctx,
            stop_tx,
            state: SchedulerState::NotStarted,
        }
    }

    /// Launches the job coordinator on the runtime and returns immediately.
    ///
    /// At most one coordinator runs per scheduler; a second call is rejected.
    pub fn start(&mut self) -> PorterResult<()> {
        if matches!(self.state, SchedulerState::Started { .. }) {
            bail!(
                ErrorKind::InvalidState,
                "Scheduler already started",
                format!("job {} already has a coordinator", self.ctx.job_id())
            );
        }

        info!(job_id = self.ctx.job_id(), "starting migration job");

        let coordinator = Coordinator {
            ctx: self.ctx.clone(),
            inventory_engine: self.inventory_engine.clone(),
            incremental_engine: self.incremental_engine.clone(),
            stop_rx: self.stop_tx.subscribe(),
        };
        let span = tracing::info_span!("job_coordinator", job_id = self.ctx.job_id());
        let handle = tokio::spawn(coordinator.run().instrument(span));

        self.state = SchedulerState::Started { coordinator: handle };

        Ok(())
    }

    /// Stops the whole job.
    ///
    /// Transitions a running job to [`JobStatus::Stopping`], then sweeps `stop()`
    /// over every task of both phases regardless of the previous status, and signals
    /// the coordinator to wind down. Callable at any time, including before
    /// [`start`](JobScheduler::start) and repeatedly.
    pub fn stop(&self) {
        stop_job(&self.ctx);

        // Send fails only when the coordinator is already gone, which is fine: the
        // status transition and the task sweep above have already happened.
        let _ = self.stop_tx.send(());
    }

    /// Waits for the job coordinator to finish.
    ///
    /// Returns immediately for a scheduler that was never started. The final job
    /// outcome is observed through [`status`](JobScheduler::status), not through the
    /// returned result, which only reports coordinator panics.
    pub async fn wait(self) -> PorterResult<()> {
        // Destructured so the stop channel stays alive while we wait: dropping the
        // last sender is itself a wind-down signal for the coordinator.
        let JobScheduler { state, stop_tx, .. } = self;

        let SchedulerState::Started { coordinator } = state else {
            info!("scheduler was not started, nothing to wait for");
            return Ok(());
        };

        let result = coordinator.await.map_err(|err| {
            porter_error!(
                ErrorKind::CoordinatorPanic,
                "Job coordinator failed",
                err
            )
        });

        drop(stop_tx);
        result
    }

    /// Returns the current job status.
    pub fn status(&self) -> JobStatus {
        self.ctx.status()
    }

    /// Returns the progress of every inventory task, in collection order.
    pub fn inventory_progress(&self) -> Vec<InventoryTaskProgress> {
        self.ctx.inventory_progress()
    }

    /// Returns the progress of every incremental task, in collection order.
    pub fn incremental_progress(&self) -> Vec<IncrementalTaskProgress> {
        self.ctx.incremental_progress()
    }

    /// Returns one aggregated snapshot of the whole job.
    pub fn progress(&self) -> JobProgress {
        self.ctx.progress()
    }
}

/// Stops the job recorded in `ctx`: status transition plus best-effort task sweep.
///
/// Every task's `stop()` is called independently and in collection order, inventory
/// first; one task's no-op never prevents stopping the rest. Also used by the
/// coordinator's failure handling to cancel siblings after one task fails.
fn stop_job(ctx: &JobContext) {
    info!(job_id = ctx.job_id(), "stopping migration job");

    ctx.transition(JobEvent::StopRequested);

    for task in ctx.inventory_tasks() {
        info!(
            job_id = ctx.job_id(),
            task_id = task.task_id(),
            "stopping inventory task"
        );
        task.stop();
    }
    for task in ctx.incremental_tasks() {
        info!(
            job_id = ctx.job_id(),
            task_id = task.task_id(),
            "stopping incremental task"
        );
        task.stop();
    }
}

/// The single coordinating task of one job.
///
/// Owns the completion receiver; every phase decision and status mutation happens
/// here, which is what makes the evaluate-predicate-then-act sequences atomic with
/// respect to racing completions.
struct Coordinator {
    ctx: Arc<JobContext>,
    inventory_engine: ExecuteEngine,
    incremental_engine: ExecuteEngine,
    stop_rx: StopRx,
}

impl Coordinator {
    async fn run(mut self) {
        if !self.ctx.status().is_running() {
            info!("job is not in a runnable state, coordinator exiting");
            return;
        }

        let (completion_tx, mut completion_rx) = create_completion_channel();

        // Number of submitted tasks whose completion has not been processed yet.
        // Used only to decide when a stopping job has drained.
        let mut outstanding: usize = 0;

        if self.execute_inventory_tasks(&completion_tx, &mut outstanding) {
            self.execute_incremental_tasks(&completion_tx, &mut outstanding);
        }

        let mut stop_requested = false;

        loop {
            if self.ctx.status().is_terminal() {
                break;
            }
            if stop_requested && outstanding == 0 {
                break;
            }

            tokio::select! {
                completion = completion_rx.recv() => {
                    // The coordinator holds a sender, so the channel cannot close
                    // underneath us; treat it as wind-down anyway.
                    let Some(completion) = completion else {
                        break;
                    };
                    outstanding -= 1;
                    self.on_task_completion(completion, &completion_tx, &mut outstanding);
                }
                _ = self.stop_rx.changed(), if !stop_requested => {
                    info!("stop requested, winding down job coordination");
                    stop_requested = true;
                }
            }
        }

        info!(status = %self.ctx.status(), "job coordination finished");
    }

    /// Attempts the inventory phase.
    ///
    /// Returns `true` if every inventory task already reports a finished snapshot —
    /// including the degenerate case of a job without inventory tasks — in which
    /// case nothing is (re-)submitted and the caller proceeds to the incremental
    /// phase. Otherwise fans out every inventory task and returns `false`.
    fn execute_inventory_tasks(
        &self,
        completion_tx: &CompletionTx,
        outstanding: &mut usize,
    ) -> bool {
        if self.ctx.all_inventory_tasks_finished() {
            info!("all inventory tasks finished");
            return true;
        }

        info!("starting inventory phase");
        self.ctx.transition(JobEvent::InventoryStarted);

        for task in self.ctx.inventory_tasks() {
            self.inventory_engine
                .submit(self.ctx.job_id(), task.clone(), completion_tx.clone());
            *outstanding += 1;
        }

        false
    }

    /// Enters the incremental phase.
    ///
    /// Guarded for idempotency: two queued inventory completions can both observe
    /// the finished predicate true, and only the first may submit the batch.
    fn execute_incremental_tasks(&self, completion_tx: &CompletionTx, outstanding: &mut usize) {
        if self.ctx.status() == JobStatus::ExecutingIncremental {
            return;
        }

        info!("starting incremental phase");
        self.ctx.transition(JobEvent::IncrementalStarted);

        for task in self.ctx.incremental_tasks() {
            self.incremental_engine
                .submit(self.ctx.job_id(), task.clone(), completion_tx.clone());
            *outstanding += 1;
        }
    }

    fn on_task_completion(
        &self,
        completion: TaskCompletion,
        completion_tx: &CompletionTx,
        outstanding: &mut usize,
    ) {
        match (completion.phase, completion.outcome) {
            (JobPhase::Inventory, TaskOutcome::Succeeded) => {
                if self.ctx.all_inventory_tasks_finished() {
                    info!("all inventory tasks finished");
                    self.execute_incremental_tasks(completion_tx, outstanding);
                }
            }
            (JobPhase::Inventory, TaskOutcome::Failed(err)) => {
                error!(
                    task_id = %completion.task_id,
                    error = %err,
                    "inventory task execution failed"
                );
                stop_job(&self.ctx);
                self.ctx.transition(JobEvent::InventoryFailed);
            }
            (JobPhase::Incremental, TaskOutcome::Succeeded) => {
                self.ctx.transition(JobEvent::IncrementalCompleted);
            }
            (JobPhase::Incremental, TaskOutcome::Failed(err)) => {
                error!(
                    task_id = %completion.task_id,
                    error = %err,
                    "incremental task execution failed"
                );
                stop_job(&self.ctx);
                self.ctx.transition(JobEvent::IncrementalFailed);
            }
        }
    }
}
