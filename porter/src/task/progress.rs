use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Progress snapshot of one inventory task.
///
/// An inventory task is finished once its bounded snapshot transfer has been fully
/// written out; the `finished` flag is what the scheduler's phase barrier evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTaskProgress {
    /// Identifier of the task this snapshot belongs to.
    pub task_id: String,
    /// Estimated total number of rows covered by this task.
    pub estimated_rows: u64,
    /// Number of rows transferred so far.
    pub transferred_rows: u64,
    /// Whether the snapshot transfer has completed.
    pub finished: bool,
}

impl InventoryTaskProgress {
    /// Returns `true` if the snapshot transfer has completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Progress snapshot of one incremental task.
///
/// Incremental tasks run unbounded, so there is no finished flag; lag against the
/// live change stream is the meaningful signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalTaskProgress {
    /// Identifier of the task this snapshot belongs to.
    pub task_id: String,
    /// Number of change events transferred so far.
    pub transferred_events: u64,
    /// Capture time of the most recently transferred event, if any was seen yet.
    pub last_event_at: Option<DateTime<Utc>>,
}

impl IncrementalTaskProgress {
    /// Returns the time elapsed since the last transferred event.
    ///
    /// `None` until the first event has been captured.
    pub fn lag(&self) -> Option<Duration> {
        self.last_event_at.map(|at| Utc::now() - at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_progress_reports_finished() {
        let progress = InventoryTaskProgress {
            task_id: "inv-0".into(),
            estimated_rows: 100,
            transferred_rows: 100,
            finished: true,
        };

        assert!(progress.is_finished());
    }

    #[test]
    fn incremental_lag_requires_an_event() {
        let mut progress = IncrementalTaskProgress {
            task_id: "inc-0".into(),
            transferred_events: 0,
            last_event_at: None,
        };
        assert!(progress.lag().is_none());

        progress.last_event_at = Some(Utc::now() - Duration::seconds(5));
        let lag = progress.lag().unwrap();
        assert!(lag >= Duration::seconds(5));
    }

    #[test]
    fn progress_snapshots_serialize() {
        let progress = InventoryTaskProgress {
            task_id: "inv-0".into(),
            estimated_rows: 10,
            transferred_rows: 3,
            finished: false,
        };

        let serialized = serde_json::to_string(&progress).unwrap();
        let deserialized: InventoryTaskProgress = serde_json::from_str(&serialized).unwrap();
        assert_eq!(progress, deserialized);
    }
}
