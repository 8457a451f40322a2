// Safety plan - byte targets for the two-phase protocol
//
// The plan never lets phase 1 consume the last `safety_buffer` bytes of the
// volume. Phase 2 only dips into it after the reclaim step has released at
// least half of the buffer again.

use crate::config::WipeConfig;
use crate::{WipeError, WipeResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPlan {
    pub free_space: u64,
    pub safety_buffer: u64,
    pub phase1_target: u64,
}

impl SafetyPlan {
    /// `safety_buffer = max(free / divisor, min_safety_buffer)`.
    ///
    /// Fails with `InsufficientSpace` when `free` does not exceed the buffer.
    pub fn new(free_space: u64, config: &WipeConfig) -> WipeResult<Self> {
        let divisor = config.safety_buffer_divisor.max(1);
        let safety_buffer = (free_space / divisor).max(config.min_safety_buffer);

        if free_space <= safety_buffer {
            return Err(WipeError::InsufficientSpace {
                free: free_space,
                required: safety_buffer,
            });
        }

        Ok(Self {
            free_space,
            safety_buffer,
            phase1_target: free_space - safety_buffer,
        })
    }

    /// Bytes of phase-1 files to delete before phase 2
    pub fn reclaim_target(&self) -> u64 {
        self.safety_buffer / 2
    }

    /// Phase-2 target once `deleted` bytes have been reclaimed
    pub fn phase2_target(&self, deleted: u64) -> u64 {
        deleted.saturating_add(self.safety_buffer)
    }
}
