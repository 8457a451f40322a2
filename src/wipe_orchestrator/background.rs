// Background wipe - runs a Wiper on a blocking worker and streams progress

use super::{WipeReport, Wiper};
use crate::progress::{ChannelSink, Progress};
use crate::{WipeError, WipeResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a wipe running on a blocking worker thread
pub struct WipeHandle {
    progress: mpsc::Receiver<Progress>,
    cancel: Arc<AtomicBool>,
    task: JoinHandle<WipeResult<WipeReport>>,
}

/// Start `wiper` on tokio's blocking pool.
///
/// Must be called from within a Tokio runtime. Progress is delivered through a
/// bounded channel sized by `progress_capacity`; the channel closes when the
/// wipe ends.
pub fn spawn_wipe(wiper: Wiper) -> WipeHandle {
    let (tx, rx) = mpsc::channel(wiper.config().progress_capacity.max(1));
    let policy = wiper.config().progress_policy;
    let cancel = wiper.cancel_flag();

    let task = tokio::task::spawn_blocking(move || {
        let sink = ChannelSink::new(tx, policy);
        let result = wiper.wipe_free_space(&sink);

        if sink.dropped() > 0 {
            tracing::debug!(dropped = sink.dropped(), "Progress updates dropped on a full channel");
        }
        result
    });

    WipeHandle {
        progress: rx,
        cancel,
        task,
    }
}

impl WipeHandle {
    /// Next progress snapshot; `None` once the wipe has finished
    pub async fn recv(&mut self) -> Option<Progress> {
        self.progress.recv().await
    }

    /// Ask the worker to stop before its next chunk
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Wait for the final report. Undelivered progress is discarded.
    pub async fn join(self) -> WipeResult<WipeReport> {
        let WipeHandle { progress, task, .. } = self;
        drop(progress);

        match task.await {
            Ok(result) => result,
            Err(e) => Err(WipeError::Task(e.to_string())),
        }
    }
}
