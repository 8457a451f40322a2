use anyhow::{anyhow, Result};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Trait for entropy sources feeding random overwrite passes
pub trait EntropySource: Send + Sync {
    /// Fill buffer with random bytes
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()>;
    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Ring-based system random (uses OS facilities)
pub struct RingSystemRNG {
    rng: SystemRandom,
}

impl Default for RingSystemRNG {
    fn default() -> Self {
        Self::new()
    }
}

impl RingSystemRNG {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl EntropySource for RingSystemRNG {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        self.rng
            .fill(dest)
            .map_err(|_| anyhow!("Ring SystemRandom failed"))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "RingSystemRNG"
    }
}

/// FIPS 140-2 style continuous test: consecutive outputs must not repeat
pub(crate) struct ContinuousTest {
    last_block: Option<[u8; Self::BLOCK]>,
    failure_count: u64,
}

impl ContinuousTest {
    pub(crate) const BLOCK: usize = 16;

    pub(crate) fn new() -> Self {
        Self {
            last_block: None,
            failure_count: 0,
        }
    }

    pub(crate) fn test(&mut self, data: &[u8]) -> bool {
        if data.len() < Self::BLOCK {
            return true; // Skip test for small blocks
        }

        let mut block = [0u8; Self::BLOCK];
        block.copy_from_slice(&data[..Self::BLOCK]);

        if self.last_block == Some(block) {
            self.failure_count += 1;
            return false;
        }

        self.last_block = Some(block);
        true
    }

    pub(crate) fn failure_count(&self) -> u64 {
        self.failure_count
    }
}

/// Entropy source wrapper that health-checks every output.
///
/// Rejects output that repeats the previous block or is a long run of a single
/// byte value, and latches unhealthy after the first failure.
pub struct VerifiedRNG {
    inner: Box<dyn EntropySource>,
    continuous_test: Mutex<ContinuousTest>,
    is_healthy: AtomicBool,
    bytes_generated: AtomicU64,
}

impl VerifiedRNG {
    /// Outputs at least this long must contain more than one distinct byte
    pub(crate) const MIN_STUCK_RUN: usize = 32;

    pub fn new(inner: Box<dyn EntropySource>) -> Self {
        Self {
            inner,
            continuous_test: Mutex::new(ContinuousTest::new()),
            is_healthy: AtomicBool::new(true),
            bytes_generated: AtomicU64::new(0),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.is_healthy.load(Ordering::SeqCst)
    }

    pub fn bytes_generated(&self) -> u64 {
        self.bytes_generated.load(Ordering::Relaxed)
    }

    fn fail(&self, reason: &str) -> anyhow::Error {
        self.is_healthy.store(false, Ordering::SeqCst);
        tracing::error!(source = self.inner.name(), reason, "Entropy health check failed");
        anyhow!("{} health check failed: {}", self.inner.name(), reason)
    }
}

impl EntropySource for VerifiedRNG {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        if !self.is_healthy() {
            return Err(anyhow!(
                "{} is marked unhealthy, refusing to produce output",
                self.inner.name()
            ));
        }

        self.inner.fill_bytes(dest)?;

        if dest.len() >= Self::MIN_STUCK_RUN && dest.iter().all(|&b| b == dest[0]) {
            return Err(self.fail("output is a constant byte run"));
        }

        let passed = self
            .continuous_test
            .lock()
            .map_err(|_| anyhow!("continuous test state poisoned"))?
            .test(dest);
        if !passed {
            return Err(self.fail("identical consecutive blocks"));
        }

        self.bytes_generated
            .fetch_add(dest.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_RNG: Arc<VerifiedRNG> =
        Arc::new(VerifiedRNG::new(Box::new(RingSystemRNG::new())));
}

/// Process-wide health-checked entropy source used by default for random passes
pub fn default_entropy() -> Arc<dyn EntropySource> {
    GLOBAL_RNG.clone()
}

/// Convenience function to fill bytes using the global RNG
pub fn secure_random_bytes(dest: &mut [u8]) -> Result<()> {
    GLOBAL_RNG.fill_bytes(dest)
}

/// Shannon entropy in bits per byte (0.0 for constant data, 8.0 maximum)
#[cfg(test)]
pub(crate) fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut counts = [0u64; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }

    let len = data.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum()
}
