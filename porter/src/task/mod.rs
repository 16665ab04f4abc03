//! Task contracts for the two migration phases.
//!
//! A migration job is fanned out across many independently running tasks. Inventory
//! tasks perform one bounded full-snapshot transfer each; incremental tasks perform
//! ongoing, unbounded live change capture. Both flavors share the same lifecycle
//! contract and differ only in the progress payload they report.

mod progress;

use std::fmt;

use async_trait::async_trait;

use crate::error::PorterResult;

pub use progress::{IncrementalTaskProgress, InventoryTaskProgress};

/// Trait for a single unit of migration work.
///
/// The generic parameter `P` is the phase-specific progress payload reported by the
/// task. Tasks are owned by their job context for the duration of the job; the
/// scheduler only borrows them to call lifecycle methods.
#[async_trait]
pub trait Task<P>: Send + Sync + fmt::Debug {
    /// Returns the opaque identifier of this task, stable for the task's lifetime.
    fn task_id(&self) -> &str;

    /// Begins the task's work.
    ///
    /// May run for an unbounded duration. Completion is observed by the execution
    /// engine that drives this task, never by a direct return to the scheduler.
    async fn start(&self) -> PorterResult<()>;

    /// Requests cooperative, non-blocking cancellation.
    ///
    /// Idempotent: callable before the task ever started and after it finished. The
    /// task must itself observe the request; nothing is forcibly terminated.
    fn stop(&self);

    /// Returns an immutable snapshot of the task's progress.
    ///
    /// Safe to call concurrently with [`Task::start`] and [`Task::stop`].
    fn progress(&self) -> P;
}

/// Inventory-flavored task trait object.
pub type InventoryTask = dyn Task<InventoryTaskProgress>;

/// Incremental-flavored task trait object.
pub type IncrementalTask = dyn Task<IncrementalTaskProgress>;
