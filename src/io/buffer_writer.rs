// Buffer writer - streams one overwrite pass into successive temp wipe files
//
// A pass ends when its byte target is reached or when the storage reports it
// is full. Only the latter is expected to happen in practice during phase 2.

use super::{is_storage_exhausted, wipe_file_name};
use crate::algorithms::PassFill;
use crate::config::WipeConfig;
use crate::crypto::EntropySource;
use crate::progress::{estimate_remaining, Progress, ProgressSink};
use crate::{WipeError, WipePhase, WipeResult};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Where a pass sits inside its phase
#[derive(Debug, Clone)]
pub struct PassContext<'a> {
    pub phase: WipePhase,
    /// 1-based
    pub pass: usize,
    pub total_passes: usize,
    pub label: &'a str,
    pub phase_start: Instant,
    /// Bytes written by earlier passes of the same phase
    pub phase_bytes_before: u64,
}

impl PassContext<'_> {
    fn progress(&self, bytes_written: u64, total_bytes: u64) -> Progress {
        let elapsed = self.phase_start.elapsed();
        let phase_bytes_written = self.phase_bytes_before + bytes_written;

        Progress {
            phase: self.phase,
            bytes_written,
            phase_bytes_written,
            total_bytes,
            current_pass: self.pass,
            total_passes: self.total_passes,
            label: self.label.to_string(),
            elapsed,
            estimated_remaining: estimate_remaining(total_bytes, phase_bytes_written, elapsed),
        }
    }

    fn write_failure(&self, path: &Path, source: std::io::Error) -> WipeError {
        WipeError::WriteFailure {
            phase: self.phase,
            pass: self.pass,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    pub bytes_written: u64,
    pub files_created: usize,
    /// The storage filled up before the target was reached
    pub exhausted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileFill {
    pub(crate) written: u64,
    pub(crate) exhausted: bool,
}

pub struct BufferWriter {
    buffer: Vec<u8>,
    max_file_size: u64,
    sync_files: bool,
    entropy: Arc<dyn EntropySource>,
    cancel: Arc<AtomicBool>,
}

impl BufferWriter {
    pub fn new(
        config: &WipeConfig,
        entropy: Arc<dyn EntropySource>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            buffer: vec![0u8; config.chunk_size.max(1)],
            max_file_size: config.max_file_size.max(1),
            sync_files: config.sync_files,
            entropy,
            cancel,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }

    /// Write `target` bytes of `fill` into new files under `dir`.
    ///
    /// Emits a progress snapshot after every chunk. Storage exhaustion ends
    /// the pass successfully with `exhausted` set; any other I/O error is fatal.
    pub fn write_pass(
        &mut self,
        dir: &Path,
        target: u64,
        fill: PassFill,
        ctx: &PassContext<'_>,
        sink: &dyn ProgressSink,
    ) -> WipeResult<PassOutcome> {
        let mut outcome = PassOutcome::default();
        if target == 0 {
            return Ok(outcome);
        }

        // Pattern passes fill the buffer once; random passes refill per chunk
        if let PassFill::Pattern(byte) = fill {
            self.buffer.fill(byte);
        }

        let total_bytes = target.saturating_mul(ctx.total_passes as u64);
        let mut index = 0usize;

        while outcome.bytes_written < target {
            let path = dir.join(wipe_file_name(ctx.phase, ctx.pass, index));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if is_storage_exhausted(&e) => {
                    outcome.exhausted = true;
                    break;
                }
                Err(source) => return Err(ctx.write_failure(&path, source)),
            };
            outcome.files_created += 1;

            let base = outcome.bytes_written;
            let budget = (target - base).min(self.max_file_size);
            let filled = self.fill_file(&mut file, &path, budget, fill, ctx, |file_written| {
                sink.report(ctx.progress(base + file_written, total_bytes));
            })?;
            outcome.bytes_written += filled.written;

            let mut exhausted = filled.exhausted;
            if self.sync_files {
                match file.sync_all() {
                    Ok(()) => {}
                    Err(e) if is_storage_exhausted(&e) => exhausted = true,
                    Err(source) => return Err(ctx.write_failure(&path, source)),
                }
            }

            tracing::debug!(
                file = %path.display(),
                bytes = filled.written,
                exhausted,
                "Closed wipe file"
            );

            if exhausted {
                outcome.exhausted = true;
                break;
            }
            index += 1;
        }

        if outcome.exhausted {
            tracing::info!(
                phase = %ctx.phase,
                pass = ctx.pass,
                written = outcome.bytes_written,
                target,
                "Storage full, pass ended early"
            );
        }

        Ok(outcome)
    }

    /// Write up to `budget` bytes into `out`, chunk by chunk
    pub(crate) fn fill_file<W: Write>(
        &mut self,
        out: &mut W,
        path: &Path,
        budget: u64,
        fill: PassFill,
        ctx: &PassContext<'_>,
        mut on_chunk: impl FnMut(u64),
    ) -> WipeResult<FileFill> {
        let mut written = 0u64;

        while written < budget {
            if self.cancel.load(Ordering::SeqCst) {
                return Err(WipeError::Interrupted);
            }

            let len = (budget - written).min(self.buffer.len() as u64) as usize;
            if fill == PassFill::Random {
                self.entropy
                    .fill_bytes(&mut self.buffer[..len])
                    .map_err(|e| WipeError::RandomSourceFailure {
                        phase: ctx.phase,
                        pass: ctx.pass,
                        reason: e.to_string(),
                    })?;
            }

            match out.write(&self.buffer[..len]) {
                Ok(0) => {
                    return Ok(FileFill {
                        written,
                        exhausted: true,
                    })
                }
                Ok(n) => {
                    written += n as u64;
                    on_chunk(written);
                    // A short write means the device ran out of room mid-chunk
                    if n < len {
                        return Ok(FileFill {
                            written,
                            exhausted: true,
                        });
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if is_storage_exhausted(&e) => {
                    return Ok(FileFill {
                        written,
                        exhausted: true,
                    })
                }
                Err(source) => return Err(ctx.write_failure(path, source)),
            }
        }

        Ok(FileFill {
            written,
            exhausted: false,
        })
    }
}
