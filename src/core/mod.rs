//! Core seed primitives.
//!
//! Hashing, secure entropy and the typed seed values every other module
//! builds on. Nothing here holds state between calls.

pub mod entropy;
pub mod hash;
pub mod seed;

// Re-export core types
pub use entropy::{random_seed, EntropySource, OsEntropy};
pub use hash::{hash256, hash512};
pub use seed::{ClientSeed, Nonce, ServerSeed, ServerSeedCommitment};
