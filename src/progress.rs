// Progress reporting for wipe passes
//
// The buffer writer emits a `Progress` after every chunk. Consumers subscribe
// through a `ProgressSink`; `ChannelSink` bridges to a tokio mpsc channel for
// background wipes.

use crate::config::ProgressPolicy;
use crate::WipePhase;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Point-in-time snapshot of a running pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub phase: WipePhase,
    /// Bytes written by the current pass (resets at every pass)
    pub bytes_written: u64,
    /// Bytes written by all passes of the current phase so far
    pub phase_bytes_written: u64,
    /// Phase target multiplied by the pass count
    pub total_bytes: u64,
    /// 1-based
    pub current_pass: usize,
    pub total_passes: usize,
    pub label: String,
    pub elapsed: Duration,
    pub estimated_remaining: Option<Duration>,
}

impl Progress {
    /// Completion of the current phase (0-100), from cumulative phase bytes
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.phase_bytes_written as f64 / self.total_bytes as f64 * 100.0).min(100.0)
    }

    /// Completion of the current pass alone (0-100)
    pub fn pass_percentage(&self) -> f64 {
        if self.total_bytes == 0 || self.total_passes == 0 {
            return 0.0;
        }
        let pass_target = self.total_bytes / self.total_passes as u64;
        if pass_target == 0 {
            return 0.0;
        }
        (self.bytes_written as f64 / pass_target as f64 * 100.0).min(100.0)
    }

    /// Average throughput since the phase started, in bytes/sec
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs < MIN_ELAPSED_SECS {
            return 0.0;
        }
        self.phase_bytes_written as f64 / secs
    }
}

/// Below this, elapsed time is treated as zero for rate calculations
const MIN_ELAPSED_SECS: f64 = 1e-3;

/// Remaining time at the observed rate; `None` until there is a rate to extrapolate
pub fn estimate_remaining(total: u64, done: u64, elapsed: Duration) -> Option<Duration> {
    let secs = elapsed.as_secs_f64();
    if done == 0 || secs < MIN_ELAPSED_SECS {
        return None;
    }

    let rate = done as f64 / secs;
    let remaining = total.saturating_sub(done) as f64 / rate;
    if remaining.is_finite() {
        Some(Duration::from_secs_f64(remaining))
    } else {
        None
    }
}

/// Receives progress snapshots from the writer
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: Progress);
}

/// Discards all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _progress: Progress) {}
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn report(&self, progress: Progress) {
        self(progress)
    }
}

/// Keeps every snapshot in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<Progress>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Progress> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, progress: Progress) {
        if let Ok(mut records) = self.records.lock() {
            records.push(progress);
        }
    }
}

/// Forwards progress into a bounded tokio channel.
///
/// Must be driven from a blocking thread when the policy is `Block`.
/// A closed receiver is ignored: losing the consumer never stops a wipe.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<Progress>,
    policy: ProgressPolicy,
    dropped: AtomicU64,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Progress>, policy: ProgressPolicy) -> Self {
        Self {
            tx,
            policy,
            dropped: AtomicU64::new(0),
        }
    }

    /// Number of updates discarded because the channel was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, progress: Progress) {
        match self.policy {
            ProgressPolicy::Block => {
                let _ = self.tx.blocking_send(progress);
            }
            ProgressPolicy::DropWhenFull => {
                if let Err(mpsc::error::TrySendError::Full(_)) = self.tx.try_send(progress) {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}
