//! Secure Entropy
//!
//! Seeds are drawn from the operating system's CSPRNG. There is no fallback
//! to a general-purpose PRNG: if the OS source fails, seed generation fails.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::core::seed::ServerSeed;
use crate::error::SettlementError;

/// Number of random bytes in a server seed.
pub const SEED_BYTES: usize = 32;

/// A source of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely with secure random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<(), SettlementError>;
}

/// Operating system CSPRNG (`getrandom` via `OsRng`).
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SettlementError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| SettlementError::EntropySource(e.to_string()))
    }
}

/// 32 secure random bytes as 64 lowercase hex characters.
pub fn random_hex(source: &dyn EntropySource) -> Result<String, SettlementError> {
    let mut bytes = [0u8; SEED_BYTES];
    source.fill(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Generate a fresh server seed from `source`.
pub fn random_seed_from(source: &dyn EntropySource) -> Result<ServerSeed, SettlementError> {
    ServerSeed::from_hex(random_hex(source)?)
}

/// Generate a fresh server seed from the OS CSPRNG.
pub fn random_seed() -> Result<ServerSeed, SettlementError> {
    random_seed_from(&OsEntropy)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicU8, Ordering};

    /// Deterministic source: every call fills with the next byte value.
    #[derive(Default)]
    pub struct CountingEntropy {
        next: AtomicU8,
    }

    impl EntropySource for CountingEntropy {
        fn fill(&self, dest: &mut [u8]) -> Result<(), SettlementError> {
            let value = self.next.fetch_add(1, Ordering::SeqCst);
            dest.fill(value);
            Ok(())
        }
    }

    /// Source that is always unavailable.
    pub struct BrokenEntropy;

    impl EntropySource for BrokenEntropy {
        fn fill(&self, _dest: &mut [u8]) -> Result<(), SettlementError> {
            Err(SettlementError::EntropySource("device not available".into()))
        }
    }
}
