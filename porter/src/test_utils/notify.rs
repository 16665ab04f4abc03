use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::timeout;

/// Default timeout for test notifications.
///
/// Chosen empirically: nothing a test waits on should take more than a few seconds.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`Notify`] wrapper whose waits time out with a panic.
///
/// Prevents tests from hanging indefinitely when an expected state change never
/// occurs; the timeout makes them fail quickly with a clear message instead.
#[derive(Debug, Clone, Default)]
pub struct TimedNotify {
    notify: Arc<Notify>,
}

impl TimedNotify {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores one wake-up permit, releasing a current or future waiter.
    pub fn notify(&self) {
        self.notify.notify_one();
    }

    /// Waits for a notification.
    ///
    /// # Panics
    ///
    /// Panics if [`DEFAULT_NOTIFY_TIMEOUT`] elapses first. Intentional: tests should
    /// fail fast rather than hang.
    pub async fn notified(&self) {
        if timeout(DEFAULT_NOTIFY_TIMEOUT, self.notify.notified())
            .await
            .is_err()
        {
            panic!(
                "test notification timed out after {DEFAULT_NOTIFY_TIMEOUT:?}; \
                 the expected state was likely never reached"
            );
        }
    }
}
