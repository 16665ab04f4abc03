use tokio::sync::watch;

/// Transmitter side of the stop signal channel.
///
/// [`StopTx`] abstracts a watch channel transmitter used to tell the job coordinator
/// that a stop was requested. The signal carries no payload; the status transition
/// happens before the signal is sent.
pub type StopTx = watch::Sender<()>;

/// Receiver side of the stop signal channel.
pub type StopRx = watch::Receiver<()>;

/// Creates a new stop signal channel.
///
/// A watch channel is used so that the signal is observed even when it was sent
/// while the coordinator was busy processing a completion.
pub fn create_stop_channel() -> (StopTx, StopRx) {
    watch::channel(())
}
