use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of one migration job.
///
/// The status gates all phase transitions and stop semantics. Transitions are applied
/// exclusively through [`JobStatus::transition`], which defines a total table over
/// every `(status, event)` pair; terminal states absorb all events.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The job was created but no phase has started yet.
    Pending,
    /// Inventory tasks have been fanned out and not all of them are finished.
    ExecutingInventory,
    /// Incremental tasks have been fanned out.
    ExecutingIncremental,
    /// A stop was requested while the job was in progress; tasks are winding down.
    Stopping,
    /// The job reached its terminal stopped/complete state.
    Stopped,
    /// An inventory task failed and the job was aborted.
    InventoryFailure,
    /// An incremental task failed and the job was aborted.
    IncrementalFailure,
}

/// Events that drive the [`JobStatus`] state machine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum JobEvent {
    /// The inventory phase fanned out its tasks.
    InventoryStarted,
    /// The incremental phase fanned out its tasks.
    IncrementalStarted,
    /// An incremental task completed normally.
    IncrementalCompleted,
    /// An inventory task reported failure.
    InventoryFailed,
    /// An incremental task reported failure.
    IncrementalFailed,
    /// An operator or failure handler requested the job to stop.
    StopRequested,
}

impl JobStatus {
    /// Applies `event` to this status and returns the resulting status.
    ///
    /// The table is total: pairs without a defined transition leave the status
    /// unchanged, and terminal states absorb every event.
    pub fn transition(self, event: JobEvent) -> JobStatus {
        use JobEvent::*;
        use JobStatus::*;

        if self.is_terminal() {
            return self;
        }

        match (self, event) {
            (Pending, InventoryStarted) => ExecutingInventory,
            (Pending | ExecutingInventory, IncrementalStarted) => ExecutingIncremental,
            (ExecutingInventory | ExecutingIncremental | Stopping, InventoryFailed) => {
                InventoryFailure
            }
            (ExecutingIncremental | Stopping, IncrementalCompleted) => Stopped,
            (ExecutingIncremental | Stopping, IncrementalFailed) => IncrementalFailure,
            (status, StopRequested) if status.is_running() => Stopping,
            (status, _) => status,
        }
    }

    /// Returns `true` if the job is in progress and a stop request would take effect.
    ///
    /// `Stopping` is deliberately excluded: a repeated stop request must not
    /// re-transition a job that is already winding down.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::ExecutingInventory | JobStatus::ExecutingIncremental
        )
    }

    /// Returns `true` if the job reached a state it can never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Stopped | JobStatus::InventoryFailure | JobStatus::IncrementalFailure
        )
    }

    pub fn as_static_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::ExecutingInventory => "executing_inventory",
            JobStatus::ExecutingIncremental => "executing_incremental",
            JobStatus::Stopping => "stopping",
            JobStatus::Stopped => "stopped",
            JobStatus::InventoryFailure => "inventory_failure",
            JobStatus::IncrementalFailure => "incremental_failure",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_static_str())
    }
}
