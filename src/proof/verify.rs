//! Round Verification
//!
//! Recompute a round from public data only: the commitment published before
//! the round, the seed revealed after it, the client seed, the nonce and the
//! recorded entries. Nothing here touches engine state, so anyone can run it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::hash::{decode_hex32, sha256_digest};
use crate::error::SettlementError;
use crate::proof::record::{CancelledRound, RoundRecord};
use crate::round::entry::{Entry, ParticipantId};
use crate::round::resolver::WeightedOutcomeResolver;

/// Detailed verification result for audits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationReport {
    /// Every check passed.
    Valid,
    /// Outcome's seed hash differs from the commitment published at open.
    CommitmentMismatch {
        /// Commitment published before the round.
        published: String,
        /// Hash recorded in the outcome.
        recorded: String,
    },
    /// Revealed seed does not hash to the commitment.
    SeedMismatch {
        /// Commitment.
        expected: String,
        /// Hash of the revealed seed.
        computed: String,
    },
    /// Recorded draw differs from the recomputed draw.
    DrawMismatch {
        /// Draw in the record.
        recorded: u64,
        /// Recomputed draw.
        computed: u64,
    },
    /// Entries cannot produce any winner (empty or zero total weight).
    NoWinnerPossible,
    /// Claimed winner differs from the recomputed winner.
    WinnerMismatch {
        /// Winner in the record.
        claimed: ParticipantId,
        /// Recomputed winner.
        computed: ParticipantId,
    },
}

impl VerificationReport {
    /// Did every check pass?
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Independent re-computation of settled rounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoundVerifier {
    resolver: WeightedOutcomeResolver,
}

impl RoundVerifier {
    /// Verifier using the given resolver (its modulus must match settlement).
    pub fn new(resolver: WeightedOutcomeResolver) -> Self {
        Self { resolver }
    }

    /// Verify one round from its published values.
    ///
    /// `Ok(false)` means the outcome does not check out. Errors are only
    /// raised for unparseable hex.
    pub fn verify(
        &self,
        server_seed: &str,
        server_seed_hash: &str,
        client_seed: &str,
        nonce: &str,
        entries: &[Entry],
        claimed_winner: &ParticipantId,
    ) -> Result<bool, SettlementError> {
        let report = self.check(
            server_seed,
            server_seed_hash,
            client_seed,
            nonce,
            entries,
            claimed_winner,
            None,
        )?;
        Ok(report.is_valid())
    }

    /// Verify a full ledger record, using the record's own modulus.
    pub fn verify_record(record: &RoundRecord) -> Result<bool, SettlementError> {
        Ok(Self::inspect_record(record)?.is_valid())
    }

    /// Like [`RoundVerifier::verify_record`], explaining the first failure.
    pub fn inspect_record(record: &RoundRecord) -> Result<VerificationReport, SettlementError> {
        let outcome = &record.outcome;

        decode_hex32("commitment", &record.commitment)?;
        if !record.commitment.eq_ignore_ascii_case(&outcome.server_seed_hash) {
            return Ok(VerificationReport::CommitmentMismatch {
                published: record.commitment.clone(),
                recorded: outcome.server_seed_hash.clone(),
            });
        }

        let resolver = WeightedOutcomeResolver::new(record.modulus)
            .map_err(|_| SettlementError::MalformedInput("record modulus is zero".into()))?;

        Self::new(resolver).check(
            &outcome.revealed_server_seed,
            &outcome.server_seed_hash,
            &outcome.client_seed,
            &outcome.nonce,
            &record.entries,
            &outcome.winner_participant_id,
            Some(outcome.winning_draw),
        )
    }

    /// Check that a cancelled round's published seed opens its commitment.
    pub fn verify_cancellation(cancelled: &CancelledRound) -> Result<bool, SettlementError> {
        decode_hex32("server seed", &cancelled.revealed_server_seed)?;
        let expected = decode_hex32("commitment", &cancelled.commitment)?;
        Ok(sha256_digest(cancelled.revealed_server_seed.as_bytes()) == expected)
    }

    #[allow(clippy::too_many_arguments)]
    fn check(
        &self,
        server_seed: &str,
        server_seed_hash: &str,
        client_seed: &str,
        nonce: &str,
        entries: &[Entry],
        claimed_winner: &ParticipantId,
        recorded_draw: Option<u64>,
    ) -> Result<VerificationReport, SettlementError> {
        decode_hex32("server seed", server_seed)?;
        let expected = decode_hex32("server seed hash", server_seed_hash)?;

        // 1. Commitment binding
        let computed_hash = sha256_digest(server_seed.as_bytes());
        if computed_hash != expected {
            debug!(nonce, "Revealed seed does not open commitment");
            return Ok(VerificationReport::SeedMismatch {
                expected: server_seed_hash.to_string(),
                computed: hex::encode(computed_hash),
            });
        }

        // 2. Draw
        let draw = self.resolver.compute_draw(server_seed, client_seed, nonce);
        if let Some(recorded) = recorded_draw {
            if recorded != draw {
                return Ok(VerificationReport::DrawMismatch {
                    recorded,
                    computed: draw,
                });
            }
        }

        // 3. Winner
        let computed = match self.resolver.select_winner(entries, draw) {
            Ok(winner) => winner,
            Err(SettlementError::NoEligibleParticipants) | Err(SettlementError::WeightOverflow) => {
                return Ok(VerificationReport::NoWinnerPossible)
            }
            Err(e) => return Err(e),
        };

        if computed != *claimed_winner {
            return Ok(VerificationReport::WinnerMismatch {
                claimed: claimed_winner.clone(),
                computed,
            });
        }

        Ok(VerificationReport::Valid)
    }
}

// =============================================================================
// TESTS
// =============================================================================
