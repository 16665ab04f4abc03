use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::bail;
use crate::error::{ErrorKind, PorterResult};
use crate::task::{IncrementalTaskProgress, InventoryTaskProgress, Task};
use crate::test_utils::notify::TimedNotify;

/// What a test task does once started.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Behavior {
    /// Finish successfully right away.
    Complete,
    /// Fail right away.
    Fail,
    /// Wait until released (success) or stopped (return without finishing).
    AwaitRelease,
}

/// Waits until `counter` becomes non-zero, re-checking on every notification.
///
/// The permit stored by `notify` makes this race-free even when the notification
/// fires before the wait begins; [`TimedNotify`] bounds each wait.
async fn wait_for(counter: &AtomicUsize, notify: &TimedNotify) {
    loop {
        if counter.load(Ordering::SeqCst) > 0 {
            return;
        }
        notify.notified().await;
    }
}

/// Controllable inventory task for scheduler tests.
///
/// The task records every `start` and `stop` call and exposes knobs for scripting
/// completion order: gated tasks only finish once [`release`](Self::release) is
/// called, and a stop request makes them return without reaching the finished state,
/// mimicking cooperative cancellation of a real snapshot transfer.
#[derive(Debug)]
pub struct TestInventoryTask {
    task_id: String,
    behavior: Behavior,
    estimated_rows: u64,
    transferred_rows: AtomicU64,
    finished: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
    release: Notify,
    stop_signal: Notify,
    started_notify: TimedNotify,
    stopped_notify: TimedNotify,
}

impl TestInventoryTask {
    fn new(task_id: &str, behavior: Behavior, finished: bool) -> Arc<Self> {
        Arc::new(Self {
            task_id: task_id.to_string(),
            behavior,
            estimated_rows: 100,
            transferred_rows: AtomicU64::new(if finished { 100 } else { 0 }),
            finished: AtomicBool::new(finished),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            release: Notify::new(),
            stop_signal: Notify::new(),
            started_notify: TimedNotify::new(),
            stopped_notify: TimedNotify::new(),
        })
    }

    /// A task that finishes its snapshot as soon as it is started.
    pub fn completing(task_id: &str) -> Arc<Self> {
        Self::new(task_id, Behavior::Complete, false)
    }

    /// A task that fails as soon as it is started.
    pub fn failing(task_id: &str) -> Arc<Self> {
        Self::new(task_id, Behavior::Fail, false)
    }

    /// A task that only finishes once [`release`](Self::release) is called.
    pub fn gated(task_id: &str) -> Arc<Self> {
        Self::new(task_id, Behavior::AwaitRelease, false)
    }

    /// A task whose snapshot already finished before the job was scheduled.
    pub fn already_finished(task_id: &str) -> Arc<Self> {
        Self::new(task_id, Behavior::Complete, true)
    }

    /// Lets a gated task finish successfully.
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub async fn wait_until_started(&self) {
        wait_for(&self.starts, &self.started_notify).await;
    }

    pub async fn wait_until_stopped(&self) {
        wait_for(&self.stops, &self.stopped_notify).await;
    }
}

#[async_trait]
impl Task<InventoryTaskProgress> for TestInventoryTask {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn start(&self) -> PorterResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.started_notify.notify();

        match self.behavior {
            Behavior::Complete => {}
            Behavior::Fail => {
                bail!(
                    ErrorKind::SourceError,
                    "Snapshot transfer failed",
                    format!("task {}", self.task_id)
                );
            }
            Behavior::AwaitRelease => {
                tokio::select! {
                    _ = self.release.notified() => {}
                    _ = self.stop_signal.notified() => {
                        // Cooperative cancellation: return without finishing.
                        return Ok(());
                    }
                }
            }
        }

        self.transferred_rows
            .store(self.estimated_rows, Ordering::SeqCst);
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stop_signal.notify_one();
        self.stopped_notify.notify();
    }

    fn progress(&self) -> InventoryTaskProgress {
        InventoryTaskProgress {
            task_id: self.task_id.clone(),
            estimated_rows: self.estimated_rows,
            transferred_rows: self.transferred_rows.load(Ordering::SeqCst),
            finished: self.finished.load(Ordering::SeqCst),
        }
    }
}

/// Controllable incremental task for scheduler tests.
///
/// Runs until stopped or released, like a real change-capture loop: a stop request
/// and a release both make `start` return successfully, a failure variant returns an
/// error as soon as it runs.
#[derive(Debug)]
pub struct TestIncrementalTask {
    task_id: String,
    fail_on_start: bool,
    transferred_events: AtomicU64,
    starts: AtomicUsize,
    stops: AtomicUsize,
    release: Notify,
    stop_signal: Notify,
    started_notify: TimedNotify,
    stopped_notify: TimedNotify,
}

impl TestIncrementalTask {
    fn new(task_id: &str, fail_on_start: bool) -> Arc<Self> {
        Arc::new(Self {
            task_id: task_id.to_string(),
            fail_on_start,
            transferred_events: AtomicU64::new(0),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            release: Notify::new(),
            stop_signal: Notify::new(),
            started_notify: TimedNotify::new(),
            stopped_notify: TimedNotify::new(),
        })
    }

    /// A task that captures changes until it is stopped or released.
    pub fn running(task_id: &str) -> Arc<Self> {
        Self::new(task_id, false)
    }

    /// A task that fails as soon as it is started.
    pub fn failing(task_id: &str) -> Arc<Self> {
        Self::new(task_id, true)
    }

    /// Makes a running task return successfully, as if its stream drained.
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub async fn wait_until_started(&self) {
        wait_for(&self.starts, &self.started_notify).await;
    }

    pub async fn wait_until_stopped(&self) {
        wait_for(&self.stops, &self.stopped_notify).await;
    }
}

#[async_trait]
impl Task<IncrementalTaskProgress> for TestIncrementalTask {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    async fn start(&self) -> PorterResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.started_notify.notify();

        if self.fail_on_start {
            bail!(
                ErrorKind::DestinationError,
                "Change capture failed",
                format!("task {}", self.task_id)
            );
        }

        self.transferred_events.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = self.release.notified() => {}
            _ = self.stop_signal.notified() => {}
        }

        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stop_signal.notify_one();
        self.stopped_notify.notify();
    }

    fn progress(&self) -> IncrementalTaskProgress {
        let transferred_events = self.transferred_events.load(Ordering::SeqCst);
        IncrementalTaskProgress {
            task_id: self.task_id.clone(),
            transferred_events,
            last_event_at: (transferred_events > 0).then(Utc::now),
        }
    }
}
