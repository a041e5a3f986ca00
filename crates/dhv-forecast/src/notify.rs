//! Data-changed notifications.

use tokio::sync::broadcast;
use tracing::trace;

/// Emitted after a new snapshot has been stored. Carries no payload;
/// receivers read the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataChanged;

/// Fire-and-forget broadcaster for [`DataChanged`]
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<DataChanged>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(16)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataChanged> {
        self.tx.subscribe()
    }

    /// Returns the number of receivers reached.
    pub fn notify(&self) -> usize {
        match self.tx.send(DataChanged) {
            Ok(n) => n,
            Err(_) => {
                trace!("No data-changed subscribers");
                0
            }
        }
    }
}
