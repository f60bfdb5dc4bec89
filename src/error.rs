//! Settlement Errors
//!
//! A failed *verification* is never an error: verifiers return `Ok(false)`.
//! Errors are reserved for broken sequencing, corruption, bad input and
//! unavailable infrastructure.

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::proof::record::RoundRecord;
use crate::round::commitment::RoundPhase;

/// Errors raised by the settlement engine.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Secure random source unavailable. Round opening must abort.
    #[error("secure entropy source unavailable: {0}")]
    EntropySource(String),

    /// Operation attempted out of sequence (caller-side bug).
    #[error("cannot {operation} while round is {phase}")]
    InvalidState {
        /// Attempted operation.
        operation: &'static str,
        /// Phase the round was in.
        phase: RoundPhase,
    },

    /// Revealed seed does not hash to the published commitment.
    #[error("commitment integrity violated for round {round_id}: expected {expected}, got {actual}")]
    CommitmentIntegrity {
        /// Affected round.
        round_id: u64,
        /// Commitment published at open.
        expected: String,
        /// Hash of the seed held at reveal.
        actual: String,
    },

    /// Total entry weight is zero.
    #[error("no eligible participants: total weight is zero")]
    NoEligibleParticipants,

    /// Input could not be parsed (bad hex, wrong length).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Sum of entry weights does not fit in u64.
    #[error("total entry weight overflows u64")]
    WeightOverflow,

    /// Invalid engine configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Bet outside the allowed range.
    #[error("bet amount {amount} outside [{min}, {max}]")]
    InvalidBetAmount {
        /// Offered amount.
        amount: u64,
        /// Minimum bet.
        min: u64,
        /// Maximum bet.
        max: u64,
    },

    /// Pot already holds the maximum number of distinct players.
    #[error("maximum of {max} players reached")]
    MaxPlayersReached {
        /// Player cap.
        max: usize,
    },

    /// Bet would push the pot past its configured maximum.
    #[error("pot limit of {max} reached")]
    PotLimitReached {
        /// Largest allowed pot.
        max: u64,
    },

    /// Pot total exceeds the draw modulus, so some stake could never win.
    #[error("pot total {total} exceeds draw modulus {modulus}")]
    PotExceedsModulus {
        /// Sum of entry weights.
        total: u64,
        /// Configured draw modulus.
        modulus: u64,
    },

    /// Ledger rejected a round event before any outcome existed.
    #[error("round ledger unavailable: {0}")]
    LedgerUnavailable(#[source] LedgerError),

    /// Outcome was settled but could not be persisted.
    ///
    /// Carries the full record so the caller can retry the write.
    #[error("failed to persist round {}: {source}", .record.round_id)]
    LedgerWrite {
        /// Settled record that was not stored.
        record: Box<RoundRecord>,
        /// Underlying ledger failure.
        #[source]
        source: LedgerError,
    },
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, SettlementError>;
