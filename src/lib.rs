// Allow uppercase acronyms for industry-standard terms like DoD
#![allow(clippy::upper_case_acronyms)]

pub mod algorithms;
pub mod config;
pub mod crypto;
pub mod io;
pub mod progress;
pub mod ui;
pub mod volume;
pub mod wipe_orchestrator;

// Re-export the main entry points for convenience
pub use algorithms::{Algorithm, PassFill, PassSpec};
pub use config::{ProgressPolicy, WipeConfig};
pub use progress::{ChannelSink, NullSink, Progress, ProgressSink, RecordingSink};
pub use volume::{NativeVolumeInfo, VolumeInfo, VolumeInfoProvider};
pub use wipe_orchestrator::{spawn_wipe, SafetyPlan, WipeHandle, WipeReport, Wiper};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;

/// Errors produced by the wiping engine.
///
/// Storage exhaustion during a pass is not an error: it ends the pass and is
/// reported through [`io::PassOutcome::exhausted`].
#[derive(Error, Debug)]
pub enum WipeError {
    #[error("Invalid volume path {path}: {reason}")]
    InvalidVolume { path: PathBuf, reason: String },

    #[error("Failed to query volume statistics for {path}: {source}")]
    VolumeQuery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Insufficient free space: {free} bytes free, need more than {required} bytes")]
    InsufficientSpace { free: u64, required: u64 },

    #[error("Temporary wipe directory already exists (wipe in progress or stale run): {0}")]
    TempDirInUse(PathBuf),

    #[error("Failed to create temporary wipe directory {path}: {source}")]
    TempDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{phase} pass {pass}: write failed on {path}: {source}")]
    WriteFailure {
        phase: WipePhase,
        pass: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{phase} pass {pass}: secure random source failed: {reason}")]
    RandomSourceFailure {
        phase: WipePhase,
        pass: usize,
        reason: String,
    },

    #[error("Failed to delete wipe file {path}: {source}")]
    Reclaim {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove temporary wipe directory {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Wipe task failed: {0}")]
    Task(String),

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl WipeError {
    /// Phase the error was raised in, when it happened while writing.
    pub fn phase(&self) -> Option<WipePhase> {
        match self {
            WipeError::WriteFailure { phase, .. }
            | WipeError::RandomSourceFailure { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Pass number (1-based) the error was raised in, when it happened while writing.
    pub fn pass(&self) -> Option<usize> {
        match self {
            WipeError::WriteFailure { pass, .. } | WipeError::RandomSourceFailure { pass, .. } => {
                Some(*pass)
            }
            _ => None,
        }
    }
}

impl From<::config::ConfigError> for WipeError {
    fn from(err: ::config::ConfigError) -> Self {
        WipeError::Config(err.to_string())
    }
}

pub type WipeResult<T> = Result<T, WipeError>;

/// Free-space wiping method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WipeMethod {
    SinglePassZeros, // 1 pass of 0x00
    DoD522022M,      // 3-pass DoD 5220.22-M
    Gutmann,         // 35-pass Gutmann
}

impl WipeMethod {
    pub const ALL: [WipeMethod; 3] = [
        WipeMethod::SinglePassZeros,
        WipeMethod::DoD522022M,
        WipeMethod::Gutmann,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WipeMethod::SinglePassZeros => "Single Pass (Zeros)",
            WipeMethod::DoD522022M => "DoD 5220.22-M (3-Pass)",
            WipeMethod::Gutmann => "Gutmann Method (35-Pass)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WipeMethod::SinglePassZeros => "Fast, sufficient for SSDs and modern drives",
            WipeMethod::DoD522022M => "US DoD standard, 3 passes (0x00, 0xFF, random)",
            WipeMethod::Gutmann => "Maximum security, 35 passes (very slow)",
        }
    }

    pub fn pass_count(&self) -> usize {
        match self {
            WipeMethod::SinglePassZeros => 1,
            WipeMethod::DoD522022M => 3,
            WipeMethod::Gutmann => 35,
        }
    }

    /// Stable selector used by front ends (0, 1, 2).
    pub fn ordinal(&self) -> u8 {
        match self {
            WipeMethod::SinglePassZeros => 0,
            WipeMethod::DoD522022M => 1,
            WipeMethod::Gutmann => 2,
        }
    }

    /// Short command-line name.
    pub fn key(&self) -> &'static str {
        match self {
            WipeMethod::SinglePassZeros => "zeros",
            WipeMethod::DoD522022M => "dod",
            WipeMethod::Gutmann => "gutmann",
        }
    }
}

impl fmt::Display for WipeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for WipeMethod {
    type Error = WipeError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        WipeMethod::ALL
            .into_iter()
            .find(|m| m.ordinal() == ordinal)
            .ok_or_else(|| WipeError::Config(format!("Unknown wipe method ordinal: {}", ordinal)))
    }
}

impl FromStr for WipeMethod {
    type Err = WipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "zeros" | "zero" | "single" => Ok(WipeMethod::SinglePassZeros),
            "1" | "dod" | "dod5220" => Ok(WipeMethod::DoD522022M),
            "2" | "gutmann" => Ok(WipeMethod::Gutmann),
            other => Err(WipeError::Config(format!(
                "Unknown wipe method '{}' (expected zeros, dod or gutmann)",
                other
            ))),
        }
    }
}

/// Top-level stage of the two-phase protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WipePhase {
    /// Fill free space down to the safety buffer
    Fill,
    /// Refill the reclaimed space plus the safety buffer
    Refill,
}

impl WipePhase {
    pub fn number(&self) -> u8 {
        match self {
            WipePhase::Fill => 1,
            WipePhase::Refill => 2,
        }
    }
}

impl fmt::Display for WipePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase {}", self.number())
    }
}
