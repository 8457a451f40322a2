pub mod secure_rng;


// Re-export
pub use secure_rng::{
    default_entropy, secure_random_bytes, EntropySource, RingSystemRNG, VerifiedRNG,
};
