/// Common test helper functions

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use wipeme::{
    Progress, ProgressSink, VolumeInfo, VolumeInfoProvider, WipeConfig, WipeError, WipePhase,
    WipeResult, KIB,
};

/// Reports a fixed amount of free space regardless of the real volume
pub struct FakeVolume {
    free: u64,
    queries: AtomicUsize,
}

impl FakeVolume {
    pub fn new(free: u64) -> Self {
        Self {
            free,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl VolumeInfoProvider for FakeVolume {
    fn query(&self, _path: &Path) -> WipeResult<VolumeInfo> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(VolumeInfo {
            total_bytes: self.free * 2,
            free_bytes: self.free,
        })
    }
}

/// Fails every query as an unreadable filesystem would
pub struct UnreadableVolume;

impl VolumeInfoProvider for UnreadableVolume {
    fn query(&self, path: &Path) -> WipeResult<VolumeInfo> {
        Err(WipeError::VolumeQuery {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::Unsupported),
        })
    }
}

/// Small chunks and files so a few MiB exercise rollover and reclaim
pub fn scaled_config(min_safety_buffer: u64) -> WipeConfig {
    WipeConfig {
        chunk_size: 64 * KIB as usize,
        max_file_size: 256 * KIB,
        min_safety_buffer,
        sync_files: false,
        ..Default::default()
    }
}

/// Files of one pass in the temp dir, in name order
pub fn pass_files(temp_dir: &Path, phase: WipePhase, pass: usize) -> Vec<PathBuf> {
    let prefix = format!("wipe_p{}_pass{:02}_", phase.number(), pass);
    let mut files: Vec<PathBuf> = fs::read_dir(temp_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix))
                })
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

/// Concatenated contents of one pass, captured while its files still exist
#[derive(Debug, Clone)]
pub struct PassCapture {
    pub phase: WipePhase,
    pub pass: usize,
    pub label: String,
    pub data: Vec<u8>,
}

/// Sink that reads back every pass's files when the pass reports completion
pub struct PassInspector {
    temp_dir: PathBuf,
    captures: Mutex<Vec<PassCapture>>,
}

impl PassInspector {
    pub fn new(temp_dir: PathBuf) -> Self {
        Self {
            temp_dir,
            captures: Mutex::new(Vec::new()),
        }
    }

    pub fn captures(&self) -> Vec<PassCapture> {
        self.captures.lock().unwrap().clone()
    }
}

impl ProgressSink for PassInspector {
    fn report(&self, progress: Progress) {
        let pass_target = progress.total_bytes / progress.total_passes as u64;
        if progress.bytes_written != pass_target {
            return;
        }

        let mut data = Vec::new();
        for path in pass_files(&self.temp_dir, progress.phase, progress.current_pass) {
            data.extend(fs::read(path).unwrap());
        }
        self.captures.lock().unwrap().push(PassCapture {
            phase: progress.phase,
            pass: progress.current_pass,
            label: progress.label,
            data,
        });
    }
}

/// Calculate Shannon entropy of a byte slice
pub fn calculate_entropy(data: &[u8]) -> f64 {
    let mut counts = [0u64; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }

    let length = data.len() as f64;
    let mut entropy = 0.0;

    for &count in &counts {
        if count > 0 {
            let probability = count as f64 / length;
            entropy -= probability * probability.log2();
        }
    }

    entropy
}
