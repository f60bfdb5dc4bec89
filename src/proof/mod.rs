//! Provable Fairness
//!
//! Public round records (opened, settled, cancelled) and the independent
//! verifier.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  record.rs  - Serializable round record (JSON / bincode)    │
//! │  verify.rs  - Verification by recomputation                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod record;
pub mod verify;

// Re-export key types
pub use record::{CancelledRound, OpenedRound, RoundRecord};
pub use verify::{RoundVerifier, VerificationReport};
