use std::sync::Arc;
use std::time::Duration;

use porter::error::ErrorKind;
use porter::job::{JobContext, JobStatus};
use porter::scheduler::JobScheduler;
use porter::task::{IncrementalTask, InventoryTask};
use porter::test_utils::task::{TestIncrementalTask, TestInventoryTask};
use porter_config::shared::JobConfig;
use tokio::time::sleep;

/// Settle time for asserting that something did NOT happen.
const SETTLE: Duration = Duration::from_millis(50);

fn job_config() -> JobConfig {
    JobConfig {
        id: 1,
        max_inventory_workers: 4,
        max_incremental_workers: 2,
    }
}

fn scheduler_for(
    inventory: Vec<Arc<InventoryTask>>,
    incremental: Vec<Arc<IncrementalTask>>,
) -> (JobScheduler, Arc<JobContext>) {
    porter_telemetry::tracing::init_tracing("porter-tests");

    let ctx = Arc::new(JobContext::new(1, inventory, incremental));
    let scheduler = JobScheduler::new(ctx.clone(), &job_config());
    (scheduler, ctx)
}

#[tokio::test]
async fn fast_path_skips_inventory_phase() {
    let inc = TestIncrementalTask::running("inc-0");
    let (mut scheduler, ctx) = scheduler_for(vec![], vec![inc.clone()]);

    scheduler.start().unwrap();
    inc.wait_until_started().await;

    assert_eq!(scheduler.status(), JobStatus::ExecutingIncremental);
    assert!(scheduler.inventory_progress().is_empty());

    inc.release();
    scheduler.wait().await.unwrap();

    assert_eq!(ctx.status(), JobStatus::Stopped);
}

#[tokio::test]
async fn barrier_advances_only_after_last_inventory_task() {
    let inv_a = TestInventoryTask::gated("inv-a");
    let inv_b = TestInventoryTask::gated("inv-b");
    let inc = TestIncrementalTask::running("inc-0");
    let (mut scheduler, ctx) = scheduler_for(
        vec![inv_a.clone(), inv_b.clone()],
        vec![inc.clone()],
    );

    scheduler.start().unwrap();
    inv_a.wait_until_started().await;
    inv_b.wait_until_started().await;
    assert_eq!(scheduler.status(), JobStatus::ExecutingInventory);

    // One finished task out of two must not advance the phase.
    inv_a.release();
    sleep(SETTLE).await;
    assert_eq!(inc.start_count(), 0);
    assert_eq!(scheduler.status(), JobStatus::ExecutingInventory);

    // The last completion is the one that triggers the advance.
    inv_b.release();
    inc.wait_until_started().await;
    assert_eq!(scheduler.status(), JobStatus::ExecutingIncremental);
    assert_eq!(inc.start_count(), 1);

    inc.release();
    scheduler.wait().await.unwrap();
    assert_eq!(ctx.status(), JobStatus::Stopped);
}

#[tokio::test]
async fn incremental_phase_is_entered_exactly_once() {
    // Two inventory tasks that finish almost simultaneously: both completions can
    // observe the finished predicate true, yet only one batch may be submitted.
    let inv_a = TestInventoryTask::completing("inv-a");
    let inv_b = TestInventoryTask::completing("inv-b");
    let inc = TestIncrementalTask::running("inc-0");
    let (mut scheduler, ctx) = scheduler_for(
        vec![inv_a.clone(), inv_b.clone()],
        vec![inc.clone()],
    );

    scheduler.start().unwrap();
    inc.wait_until_started().await;

    sleep(SETTLE).await;
    assert_eq!(inc.start_count(), 1);

    inc.release();
    scheduler.wait().await.unwrap();
    assert_eq!(ctx.status(), JobStatus::Stopped);
}

#[tokio::test]
async fn inventory_failure_stops_the_whole_job() {
    let inv_ok = TestInventoryTask::gated("inv-ok");
    let inv_bad = TestInventoryTask::failing("inv-bad");
    let inc = TestIncrementalTask::running("inc-0");
    let (mut scheduler, ctx) = scheduler_for(
        vec![inv_ok.clone(), inv_bad.clone()],
        vec![inc.clone()],
    );

    scheduler.start().unwrap();
    scheduler.wait().await.unwrap();

    assert_eq!(ctx.status(), JobStatus::InventoryFailure);
    // The sweep reaches every task of both phases, even ones never started.
    assert!(inv_ok.stop_count() >= 1);
    assert!(inv_bad.stop_count() >= 1);
    assert!(inc.stop_count() >= 1);
    assert_eq!(inc.start_count(), 0);
}

#[tokio::test]
async fn incremental_failure_stops_the_whole_job() {
    let inc_bad = TestIncrementalTask::failing("inc-bad");
    let inc_ok = TestIncrementalTask::running("inc-ok");
    let (mut scheduler, ctx) = scheduler_for(vec![], vec![inc_bad.clone(), inc_ok.clone()]);

    scheduler.start().unwrap();
    inc_ok.wait_until_stopped().await;
    scheduler.wait().await.unwrap();

    assert_eq!(ctx.status(), JobStatus::IncrementalFailure);
    assert!(inc_ok.stop_count() >= 1);
}

#[tokio::test]
async fn stop_before_start_sweeps_every_task() {
    let inv = TestInventoryTask::gated("inv-0");
    let inc = TestIncrementalTask::running("inc-0");
    let (scheduler, ctx) = scheduler_for(vec![inv.clone()], vec![inc.clone()]);

    scheduler.stop();

    assert_eq!(ctx.status(), JobStatus::Stopping);
    assert_eq!(inv.stop_count(), 1);
    assert_eq!(inc.stop_count(), 1);

    // Never started: nothing to wait for.
    scheduler.wait().await.unwrap();
}

#[tokio::test]
async fn stop_during_inventory_winds_down_without_advancing() {
    let inv = TestInventoryTask::gated("inv-0");
    let inc = TestIncrementalTask::running("inc-0");
    let (mut scheduler, ctx) = scheduler_for(vec![inv.clone()], vec![inc.clone()]);

    scheduler.start().unwrap();
    inv.wait_until_started().await;

    scheduler.stop();
    scheduler.wait().await.unwrap();

    // The stopped snapshot never finished, so the job winds down in `Stopping`
    // and the incremental phase is never entered.
    assert_eq!(ctx.status(), JobStatus::Stopping);
    assert_eq!(inc.start_count(), 0);
    assert!(!ctx.inventory_progress()[0].is_finished());
}

#[tokio::test]
async fn stop_during_incremental_reaches_stopped() {
    let inc = TestIncrementalTask::running("inc-0");
    let (mut scheduler, ctx) = scheduler_for(vec![], vec![inc.clone()]);

    scheduler.start().unwrap();
    inc.wait_until_started().await;

    scheduler.stop();
    scheduler.wait().await.unwrap();

    assert_eq!(ctx.status(), JobStatus::Stopped);
    assert!(inc.stop_count() >= 1);
}

#[tokio::test]
async fn start_twice_is_rejected() {
    let inc = TestIncrementalTask::running("inc-0");
    let (mut scheduler, ctx) = scheduler_for(vec![], vec![inc.clone()]);

    scheduler.start().unwrap();
    let second = scheduler.start();
    assert_eq!(second.unwrap_err().kind(), ErrorKind::InvalidState);

    inc.wait_until_started().await;
    inc.release();
    scheduler.wait().await.unwrap();
    assert_eq!(ctx.status(), JobStatus::Stopped);
}

#[tokio::test]
async fn progress_reads_are_stable_across_phases() {
    let inv_a = TestInventoryTask::gated("inv-a");
    let inv_b = TestInventoryTask::gated("inv-b");
    let inc = TestIncrementalTask::running("inc-0");
    let (mut scheduler, ctx) = scheduler_for(
        vec![inv_a.clone(), inv_b.clone()],
        vec![inc.clone()],
    );

    // Before start.
    let inventory = scheduler.inventory_progress();
    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory[0].task_id, "inv-a");
    assert_eq!(inventory[1].task_id, "inv-b");
    assert_eq!(scheduler.incremental_progress().len(), 1);

    scheduler.start().unwrap();
    inv_a.wait_until_started().await;

    // Mid-phase, concurrently with running tasks.
    let snapshot = scheduler.progress();
    assert_eq!(snapshot.status, JobStatus::ExecutingInventory);
    assert_eq!(snapshot.inventory.len(), 2);
    assert_eq!(snapshot.incremental.len(), 1);

    inv_a.release();
    inv_b.release();
    inc.wait_until_started().await;
    inc.release();
    scheduler.wait().await.unwrap();

    // After the job completed.
    let progress = ctx.progress();
    assert_eq!(progress.status, JobStatus::Stopped);
    assert_eq!(progress.inventory.len(), 2);
    assert_eq!(progress.incremental.len(), 1);
}

/// The end-to-end scenario: two inventory tasks and one incremental task, driven
/// through both phases to the terminal stopped/complete state.
#[tokio::test]
async fn full_job_runs_inventory_then_incremental_to_completion() {
    let inv_1 = TestInventoryTask::gated("inv-1");
    let inv_2 = TestInventoryTask::gated("inv-2");
    let inc_1 = TestIncrementalTask::running("inc-1");
    let (mut scheduler, ctx) = scheduler_for(
        vec![inv_1.clone(), inv_2.clone()],
        vec![inc_1.clone()],
    );

    scheduler.start().unwrap();
    inv_1.wait_until_started().await;
    inv_2.wait_until_started().await;

    inv_1.release();
    inv_2.release();

    inc_1.wait_until_started().await;
    inc_1.release();
    scheduler.wait().await.unwrap();

    assert_eq!(ctx.status(), JobStatus::Stopped);

    let inventory = ctx.inventory_progress();
    assert_eq!(inventory.len(), 2);
    assert!(inventory.iter().all(|progress| progress.is_finished()));

    let incremental = ctx.incremental_progress();
    assert_eq!(incremental.len(), 1);
    assert_eq!(incremental[0].task_id, "inc-1");
    assert_eq!(incremental[0].transferred_events, 1);
}
