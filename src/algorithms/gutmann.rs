use super::{PassFill, PassSpec};

pub struct GutmannWipe;

impl GutmannWipe {
    pub const PASS_COUNT: usize = 35;

    /// Random passes before and after the pattern block
    pub const RANDOM_PASSES: usize = 4;

    /// Passes 5-31 cycle through this table, wrapping after 21 entries
    pub const PATTERN_TABLE: [u8; 21] = [
        0x55, 0xAA, 0x92, 0x49, 0x24, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88,
        0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
    ];

    /// Fill for a 1-based pass number
    pub fn fill_for_pass(pass: usize) -> PassFill {
        let first_pattern = Self::RANDOM_PASSES + 1;
        let last_pattern = Self::PASS_COUNT - Self::RANDOM_PASSES;

        if (first_pattern..=last_pattern).contains(&pass) {
            let index = (pass - first_pattern) % Self::PATTERN_TABLE.len();
            PassFill::Pattern(Self::PATTERN_TABLE[index])
        } else {
            PassFill::Random
        }
    }

    pub fn passes() -> Vec<PassSpec> {
        (1..=Self::PASS_COUNT)
            .map(|pass| {
                let fill = Self::fill_for_pass(pass);
                PassSpec::new(
                    fill,
                    format!("Gutmann Pass {}/{} ({})", pass, Self::PASS_COUNT, fill),
                )
            })
            .collect()
    }
}
