use tokio::sync::watch;

/// Sending half of the shutdown signal, held by the signal listener task.
#[derive(Debug)]
pub struct ShutdownTx(watch::Sender<()>);

impl ShutdownTx {
    /// Signals shutdown to the receiver.
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }
}

/// Receiving half of the shutdown signal, observed by the scheduler's wait.
pub type ShutdownRx = watch::Receiver<()>;

/// Creates the shutdown channel pair.
///
/// A watch channel of unit values: the payload carries no information, the
/// change notification alone means "stop after the current step".
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(());
    (ShutdownTx(tx), rx)
}
