//! # Spin Wheel Settlement Engine
//!
//! Provably-fair settlement for a pooled, round-based spin wheel: every
//! round's winner is drawn with probability proportional to contribution,
//! from seeds the operator committed to before the round opened.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 SPIN WHEEL SETTLEMENT                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Seed primitives                           │
//! │  ├── hash.rs     - SHA-256 / SHA-512, hex helpers            │
//! │  ├── entropy.rs  - OS CSPRNG seed generation                 │
//! │  └── seed.rs     - Server/client seed, commitment, nonce     │
//! │                                                              │
//! │  round/          - Round lifecycle                           │
//! │  ├── commitment.rs - Commit-reveal state machine             │
//! │  ├── pot.rs      - Bet collection                            │
//! │  ├── resolver.rs - Draw + weighted winner selection          │
//! │  └── payout.rs   - House fee split                           │
//! │                                                              │
//! │  proof/          - Public verifiability                      │
//! │  ├── record.rs   - Serializable round record                 │
//! │  └── verify.rs   - Independent recomputation                 │
//! │                                                              │
//! │  ledger.rs       - Append-only round event log               │
//! │  game.rs         - open / settle / cancel / verify           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fairness Guarantee
//!
//! - The server seed is fixed (and its SHA-256 published) before entries
//!   are accepted, and revealed at most once.
//! - The draw is a pure function of (server seed, client seed, nonce).
//! - Anyone holding a [`RoundRecord`] can recompute the draw and winner
//!   with [`RoundVerifier`] and no access to the engine.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod ledger;
pub mod proof;
pub mod round;

// Re-export commonly used types
pub use config::GameConfig;
pub use crate::core::seed::{ClientSeed, Nonce, ServerSeed, ServerSeedCommitment};
pub use error::{Result, SettlementError};
pub use game::SpinGame;
pub use ledger::{InMemoryLedger, JsonLinesLedger, LedgerEntry, LedgerError, RoundLedger};
pub use proof::{CancelledRound, OpenedRound, RoundRecord, RoundVerifier, VerificationReport};
pub use round::{Entry, ParticipantId, RoundOutcome, WeightedOutcomeResolver};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
