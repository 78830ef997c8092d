// Background worker that runs a batch off the foreground thread

use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::error;

use super::batch::{BatchObserver, BatchOutcome, BatchReport, BatchRunner, CancelToken};
use super::core::MergeTool;

/// Message from the worker to the foreground
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchMessage {
    Status { text: String },
    Progress { percent: u8 },
    Finished,
}

/// Forwards observer notifications over a channel
pub struct ChannelObserver {
    tx: Sender<BatchMessage>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<BatchMessage>) -> Self {
        Self { tx }
    }
}

impl BatchObserver for ChannelObserver {
    fn on_status(&mut self, text: &str) {
        let _ = self.tx.send(BatchMessage::Status {
            text: text.to_string(),
        });
    }

    fn on_progress(&mut self, percent: u8) {
        let _ = self.tx.send(BatchMessage::Progress { percent });
    }

    fn on_finished(&mut self) {
        let _ = self.tx.send(BatchMessage::Finished);
    }
}

/// A batch running on its own thread.
///
/// The receiver yields every notification in order; it disconnects once the
/// worker thread has exited.
pub struct BatchWorker {
    handle: JoinHandle<BatchReport>,
    rx: Receiver<BatchMessage>,
    cancel: CancelToken,
}

impl BatchWorker {
    pub fn spawn<T: MergeTool + 'static>(runner: BatchRunner<T>) -> Self {
        let (tx, rx) = mpsc::channel();
        let cancel = runner.cancel_token();

        let handle = thread::spawn(move || {
            let mut observer = ChannelObserver::new(tx);
            runner.run(&mut observer)
        });

        Self { handle, rx, cancel }
    }

    /// Get the receiver for worker messages
    pub fn receiver(&self) -> &Receiver<BatchMessage> {
        &self.rx
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ask the worker to stop before the next video
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker thread. A panic inside it becomes a critical outcome.
    pub fn join(self) -> BatchReport {
        match self.handle.join() {
            Ok(report) => report,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "worker thread panicked".to_string());
                error!(%message, "Batch worker panicked");
                BatchReport {
                    outcome: BatchOutcome::Critical(message),
                    videos: Vec::new(),
                }
            }
        }
    }
}
