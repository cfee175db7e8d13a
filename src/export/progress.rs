//! Export progress reporting.
//!
//! Progress is a single integer percentage in `[0, 100]`, written only by the
//! orchestrator and observed through a [`tokio::sync::watch`] channel. Within
//! one run the value never decreases:
//!
//! | checkpoint                  | value                       |
//! |-----------------------------|-----------------------------|
//! | run started                 | 5                           |
//! | each settled fetch          | `5 + done * 80 / total`     |
//! | document assembly           | 85                          |
//! | artifact written            | 100                         |

use std::sync::Arc;
use tokio::sync::watch;

/// Progress value when a run starts
pub const PROGRESS_START: u8 = 5;
/// Progress value once every fetch has settled
pub const PROGRESS_FETCH_END: u8 = 85;
/// Progress value when document assembly begins
pub const PROGRESS_ASSEMBLY: u8 = 85;
/// Progress value when the artifact is finalized
pub const PROGRESS_COMPLETE: u8 = 100;

/// Progress within the fetch band after `completed` of `total` fetches settled.
pub fn fetch_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_FETCH_END;
    }
    let completed = completed.min(total);
    let band = (PROGRESS_FETCH_END - PROGRESS_START) as usize;
    PROGRESS_START + (completed * band / total) as u8
}

/// Single-writer progress channel for export runs.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    tx: Arc<watch::Sender<u8>>,
}

impl ExportProgress {
    /// Create a channel at 0%.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Observe progress updates.
    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    /// Current percentage.
    pub fn current(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Reset for a new run and publish [`PROGRESS_START`].
    pub fn begin(&self) {
        self.tx.send_replace(PROGRESS_START);
    }

    /// Raise progress to `percent`; lower values are ignored.
    ///
    /// Returns whether the published value changed.
    pub fn advance_to(&self, percent: u8) -> bool {
        let percent = percent.min(PROGRESS_COMPLETE);
        self.tx.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        })
    }
}

impl Default for ExportProgress {
    fn default() -> Self {
        Self::new()
    }
}
