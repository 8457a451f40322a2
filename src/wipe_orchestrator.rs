// Wipe Orchestrator - Two-phase safe free-space wipe
//
// Phase 1 fills the volume's free space down to a safety buffer, the reclaim
// step deletes just enough phase-1 files to free half of that buffer, and
// phase 2 overwrites the reclaimed space plus the buffer itself. The volume is
// only ever allowed to reach zero free space during phase 2.

mod background;
mod safety;
mod temp_dir;

pub use background::{spawn_wipe, WipeHandle};
pub use safety::SafetyPlan;

use crate::algorithms::{Algorithm, PhaseOutcome};
use crate::config::WipeConfig;
use crate::crypto::{default_entropy, EntropySource};
use crate::io::{list_wipe_files, phase_file_prefix, BufferWriter};
use crate::progress::ProgressSink;
use crate::volume::{NativeVolumeInfo, VolumeInfo, VolumeInfoProvider};
use crate::{WipeError, WipeMethod, WipePhase, WipeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use temp_dir::{remove_dir_if_present, TempDirGuard};
use uuid::Uuid;

/// Completion record of a successful wipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WipeReport {
    pub session_id: Uuid,
    pub method: WipeMethod,
    pub volume: PathBuf,
    pub free_space_before: u64,
    pub safety_buffer: u64,
    pub phase1_target: u64,
    /// Sum over every phase-1 pass
    pub phase1_written: u64,
    pub reclaimed_bytes: u64,
    pub reclaimed_files: usize,
    pub phase2_target: u64,
    /// Sum over every phase-2 pass
    pub phase2_written: u64,
    /// Some pass stopped early because the volume was full
    pub storage_exhausted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
}

/// Result of the reclaim step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Reclaimed {
    pub(crate) bytes: u64,
    pub(crate) files: usize,
}

/// Everything the two phases produced, before the temp dir is removed
#[derive(Debug, Clone, Copy)]
struct PhaseTotals {
    phase1: PhaseOutcome,
    reclaimed: Reclaimed,
    phase2_target: u64,
    phase2: PhaseOutcome,
}

/// Free-space wiper bound to one volume and method
pub struct Wiper {
    volume: PathBuf,
    method: WipeMethod,
    config: WipeConfig,
    volume_info: Arc<dyn VolumeInfoProvider>,
    entropy: Arc<dyn EntropySource>,
    cancel: Arc<AtomicBool>,
}

impl Wiper {
    /// Bind to `volume`, which must be an existing directory
    pub fn new(volume: impl Into<PathBuf>, method: WipeMethod) -> WipeResult<Self> {
        let volume = volume.into();

        let meta = fs::metadata(&volume).map_err(|e| WipeError::InvalidVolume {
            path: volume.clone(),
            reason: e.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(WipeError::InvalidVolume {
                path: volume,
                reason: "not a directory".to_string(),
            });
        }

        Ok(Self {
            volume,
            method,
            config: WipeConfig::default(),
            volume_info: Arc::new(NativeVolumeInfo),
            entropy: default_entropy(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_config(mut self, config: WipeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_volume_info(mut self, provider: Arc<dyn VolumeInfoProvider>) -> Self {
        self.volume_info = provider;
        self
    }

    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    /// Share an externally owned cancellation flag (e.g. one wired to signals)
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &WipeConfig {
        &self.config
    }

    pub fn method(&self) -> WipeMethod {
        self.method
    }

    pub fn volume_path(&self) -> &Path {
        &self.volume
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn temp_dir_path(&self) -> PathBuf {
        self.volume.join(&self.config.temp_dir_name)
    }

    pub fn volume_info(&self) -> WipeResult<VolumeInfo> {
        self.volume_info.query(&self.volume)
    }

    pub fn free_space(&self) -> WipeResult<u64> {
        Ok(self.volume_info()?.free_bytes)
    }

    /// Safety buffer and phase-1 target for the volume's current free space
    pub fn plan(&self) -> WipeResult<SafetyPlan> {
        SafetyPlan::new(self.free_space()?, &self.config)
    }

    /// Remove a temp directory left behind by a killed run.
    ///
    /// Returns whether there was anything to remove.
    pub fn clean_stale(&self) -> WipeResult<bool> {
        let path = self.temp_dir_path();
        if !path.exists() {
            return Ok(false);
        }
        tracing::info!(dir = %path.display(), "Removing stale temporary wipe directory");
        remove_dir_if_present(&path)?;
        Ok(true)
    }

    /// Run the full two-phase wipe, reporting progress to `sink`.
    ///
    /// The temporary directory is gone when this returns, whatever the outcome.
    pub fn wipe_free_space(&self, sink: &dyn ProgressSink) -> WipeResult<WipeReport> {
        let span = tracing::info_span!(
            "wipe",
            volume = %self.volume.display(),
            method = self.method.key()
        );
        let _enter = span.enter();

        self.config.validate()?;
        let started_at = Utc::now();
        let clock = Instant::now();

        let plan = self.plan()?;
        tracing::info!(
            free = plan.free_space,
            safety_buffer = plan.safety_buffer,
            phase1_target = plan.phase1_target,
            "Planned free-space wipe"
        );

        let guard = TempDirGuard::create(self.temp_dir_path())?;
        let result = self.run_phases(guard.path(), &plan, sink);
        let cleanup = guard.remove();

        let totals = settle_cleanup(result, cleanup)?;

        let report = WipeReport {
            session_id: Uuid::new_v4(),
            method: self.method,
            volume: self.volume.clone(),
            free_space_before: plan.free_space,
            safety_buffer: plan.safety_buffer,
            phase1_target: plan.phase1_target,
            phase1_written: totals.phase1.bytes_written,
            reclaimed_bytes: totals.reclaimed.bytes,
            reclaimed_files: totals.reclaimed.files,
            phase2_target: totals.phase2_target,
            phase2_written: totals.phase2.bytes_written,
            storage_exhausted: totals.phase1.exhausted || totals.phase2.exhausted,
            started_at,
            finished_at: Utc::now(),
            duration: clock.elapsed(),
        };

        tracing::info!(
            session = %report.session_id,
            duration = ?report.duration,
            "Free-space wipe completed"
        );
        Ok(report)
    }

    fn run_phases(
        &self,
        dir: &Path,
        plan: &SafetyPlan,
        sink: &dyn ProgressSink,
    ) -> WipeResult<PhaseTotals> {
        let algorithm = Algorithm::for_method(self.method);
        let mut writer = BufferWriter::new(&self.config, self.entropy.clone(), self.cancel.clone());
        let recycle = self.config.recycle_pass_files;

        tracing::info!(
            target_bytes = plan.phase1_target,
            passes = algorithm.pass_count(),
            "Phase 1 started"
        );
        let phase1 = algorithm.run(
            &mut writer,
            dir,
            WipePhase::Fill,
            plan.phase1_target,
            recycle,
            sink,
        )?;
        tracing::info!(
            written = phase1.bytes_written,
            exhausted = phase1.exhausted,
            "Phase 1 completed"
        );

        let reclaimed = reclaim(dir, plan.reclaim_target())?;
        tracing::info!(
            deleted = reclaimed.bytes,
            files = reclaimed.files,
            wanted = plan.reclaim_target(),
            "Reclaimed safety space"
        );

        let phase2_target = plan.phase2_target(reclaimed.bytes);
        tracing::info!(target_bytes = phase2_target, "Phase 2 started");
        let phase2 = algorithm.run(
            &mut writer,
            dir,
            WipePhase::Refill,
            phase2_target,
            recycle,
            sink,
        )?;
        tracing::info!(
            written = phase2.bytes_written,
            exhausted = phase2.exhausted,
            "Phase 2 completed"
        );

        Ok(PhaseTotals {
            phase1,
            reclaimed,
            phase2_target,
            phase2,
        })
    }
}

/// Combine the wipe result with the outcome of removing the temp dir.
///
/// A cleanup failure only surfaces when the wipe itself succeeded; otherwise
/// it is logged and the wipe error is returned.
pub(crate) fn settle_cleanup<T>(result: WipeResult<T>, cleanup: WipeResult<()>) -> WipeResult<T> {
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => {
            tracing::error!(error = %e, "Wipe failed, temporary files removed");
            Err(e)
        }
        (Err(e), Err(cleanup_err)) => {
            tracing::error!(error = %e, "Wipe failed");
            tracing::warn!(
                error = %cleanup_err,
                "Temporary wipe directory could not be removed"
            );
            Err(e)
        }
    }
}

/// Delete phase-1 files in name order until at least `target` bytes are freed.
///
/// Sizes are measured from the files themselves. Running out of files before
/// the target is reached is not an error.
pub(crate) fn reclaim(dir: &Path, target: u64) -> WipeResult<Reclaimed> {
    let files = list_wipe_files(dir, &phase_file_prefix(WipePhase::Fill)).map_err(|source| {
        WipeError::Reclaim {
            path: dir.to_path_buf(),
            source,
        }
    })?;

    let mut reclaimed = Reclaimed::default();
    for (path, size) in files {
        if reclaimed.bytes >= target {
            break;
        }
        fs::remove_file(&path).map_err(|source| WipeError::Reclaim {
            path: path.clone(),
            source,
        })?;
        reclaimed.bytes += size;
        reclaimed.files += 1;
        tracing::debug!(file = %path.display(), size, "Reclaimed wipe file");
    }

    if reclaimed.bytes < target {
        tracing::warn!(
            deleted = reclaimed.bytes,
            target,
            "Phase 1 left fewer bytes than the reclaim target"
        );
    }

    Ok(reclaimed)
}
