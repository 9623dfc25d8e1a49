use crate::error::{RecallError, Result};
use crate::result::GameResult;
use crate::store::ResultStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hands finished results to the storage collaborator.
///
/// Writes the store rejects are kept in a pending buffer so they can be
/// retried; nothing is dropped silently. Cloning shares the same store and
/// buffer.
#[derive(Clone)]
pub struct ResultRecorder {
    store: Arc<dyn ResultStore>,
    pending: Arc<Mutex<Vec<GameResult>>>,
}

impl ResultRecorder {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self {
            store,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    pub fn record(&self, result: GameResult) -> Result<()> {
        match self.store.record_game_result(&result) {
            Ok(()) => {
                info!(
                    game = %result.game_type(),
                    score = result.score(),
                    "recorded game result"
                );
                Ok(())
            }
            Err(e) => {
                warn!(game = %result.game_type(), error = %e, "store rejected game result, keeping for retry");
                self.pending.lock().push(result);
                Err(RecallError::Recorder {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Retry every pending write in order. Stops at the first failure and
    /// keeps it and everything after it. Returns how many were flushed.
    pub fn retry_pending(&self) -> Result<usize> {
        let mut pending = self.pending.lock();
        let mut flushed = 0;

        while let Some(result) = pending.first() {
            if let Err(e) = self.store.record_game_result(result) {
                debug!(remaining = pending.len(), error = %e, "retry stopped");
                return Err(RecallError::Recorder {
                    reason: e.to_string(),
                });
            }
            pending.remove(0);
            flushed += 1;
        }

        Ok(flushed)
    }

    pub fn pending(&self) -> Vec<GameResult> {
        self.pending.lock().clone()
    }
}
