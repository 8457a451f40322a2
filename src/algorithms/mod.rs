pub mod dod;
pub mod gutmann;
pub mod zero;

#[cfg(test)]
mod dod_test;

// Re-export the pass tables
pub use dod::DoDWipe;
pub use gutmann::GutmannWipe;
pub use zero::ZeroWipe;

use crate::io::{pass_file_prefix, remove_wipe_files, BufferWriter, PassContext};
use crate::progress::ProgressSink;
use crate::{WipeMethod, WipePhase, WipeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Instant;

/// What one pass writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassFill {
    /// Every byte set to this value
    Pattern(u8),
    /// Fresh cryptographically secure bytes for every chunk
    Random,
}

impl fmt::Display for PassFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassFill::Pattern(byte) => write!(f, "0x{:02X}", byte),
            PassFill::Random => write!(f, "Random"),
        }
    }
}

/// One overwrite pass: its fill and the label shown in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSpec {
    pub fill: PassFill,
    pub label: String,
}

impl PassSpec {
    pub fn new(fill: PassFill, label: impl Into<String>) -> Self {
        Self {
            fill,
            label: label.into(),
        }
    }
}

/// Totals for one phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub passes_completed: usize,
    /// Sum over every pass of the phase
    pub bytes_written: u64,
    /// Bytes written by the last pass, still on disk after the phase
    pub final_pass_bytes: u64,
    /// At least one pass stopped on a full volume
    pub exhausted: bool,
}

/// Ordered pass table for one wipe method
#[derive(Debug, Clone)]
pub struct Algorithm {
    method: WipeMethod,
    passes: Vec<PassSpec>,
}

impl Algorithm {
    pub fn for_method(method: WipeMethod) -> Self {
        let passes = match method {
            WipeMethod::SinglePassZeros => ZeroWipe::passes(),
            WipeMethod::DoD522022M => DoDWipe::passes(),
            WipeMethod::Gutmann => GutmannWipe::passes(),
        };
        debug_assert_eq!(passes.len(), method.pass_count());

        Self { method, passes }
    }

    pub fn method(&self) -> WipeMethod {
        self.method
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn passes(&self) -> &[PassSpec] {
        &self.passes
    }

    /// Run every pass over `target` bytes, in order, into `dir`.
    ///
    /// The first failing pass aborts the phase. With `recycle` set, a pass's
    /// files are deleted before the next pass starts so that all passes cover
    /// the same freed space; the last pass's files are always left in place.
    pub fn run(
        &self,
        writer: &mut BufferWriter,
        dir: &Path,
        phase: WipePhase,
        target: u64,
        recycle: bool,
        sink: &dyn ProgressSink,
    ) -> WipeResult<PhaseOutcome> {
        let phase_start = Instant::now();
        let total_passes = self.passes.len();
        let mut outcome = PhaseOutcome::default();

        for (i, spec) in self.passes.iter().enumerate() {
            let pass = i + 1;

            if recycle && pass > 1 {
                let released = remove_wipe_files(dir, &pass_file_prefix(phase, pass - 1))?;
                tracing::debug!(%phase, pass = pass - 1, released, "Recycled pass files");
            }

            tracing::info!(
                %phase,
                pass,
                total_passes,
                label = %spec.label,
                target,
                "Starting pass"
            );

            let ctx = PassContext {
                phase,
                pass,
                total_passes,
                label: &spec.label,
                phase_start,
                phase_bytes_before: outcome.bytes_written,
            };
            let pass_outcome = writer.write_pass(dir, target, spec.fill, &ctx, sink)?;

            outcome.passes_completed = pass;
            outcome.bytes_written += pass_outcome.bytes_written;
            outcome.final_pass_bytes = pass_outcome.bytes_written;
            outcome.exhausted |= pass_outcome.exhausted;

            tracing::info!(
                %phase,
                pass,
                written = pass_outcome.bytes_written,
                files = pass_outcome.files_created,
                elapsed = ?phase_start.elapsed(),
                "Pass completed"
            );
        }

        Ok(outcome)
    }
}
