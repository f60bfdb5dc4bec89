//! Round lifecycle: commitment, entries, resolution and payout.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ROUND                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs - Commit-reveal state machine per round      │
//! │  entry.rs      - Weighted participant entries               │
//! │  pot.rs        - Bet collection and limits                  │
//! │  resolver.rs   - Deterministic draw + weighted selection    │
//! │  outcome.rs    - Published round outcome                    │
//! │  payout.rs     - House fee / winner split                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod entry;
pub mod outcome;
pub mod payout;
pub mod pot;
pub mod resolver;

// Re-export key types
pub use commitment::{CommitmentManager, RoundCommitment, RoundPhase};
pub use entry::{Entry, ParticipantId};
pub use outcome::RoundOutcome;
pub use payout::Payout;
pub use pot::{PotLimits, RoundPot};
pub use resolver::{WeightedOutcomeResolver, DEFAULT_MODULUS, FULL_RANGE_MODULUS};
