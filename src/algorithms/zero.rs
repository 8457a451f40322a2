// Zero Wipe Algorithm - Single pass writing zeros
//
// Fast and simple. Not suitable for high-security requirements but enough to
// make deleted data unrecoverable by ordinary undelete tools.

use super::{PassFill, PassSpec};

pub struct ZeroWipe;

impl ZeroWipe {
    pub const PATTERN: u8 = 0x00;
    pub const PASS_COUNT: usize = 1;

    pub fn passes() -> Vec<PassSpec> {
        vec![PassSpec::new(
            PassFill::Pattern(Self::PATTERN),
            "Single Pass (Zeros)",
        )]
    }
}
