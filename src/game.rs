//! Spin Wheel Game
//!
//! The surface the surrounding application talks to: open a round (publish
//! the commitment), settle it with the final entry list, verify any
//! historical record. Every round event goes to the ledger.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::config::GameConfig;
use crate::core::entropy::{EntropySource, OsEntropy};
use crate::core::seed::{ClientSeed, ServerSeed};
use crate::error::SettlementError;
use crate::ledger::{InMemoryLedger, JsonLinesLedger, LedgerEntry, RoundLedger};
use crate::proof::record::{CancelledRound, OpenedRound, RoundRecord};
use crate::proof::verify::RoundVerifier;
use crate::round::commitment::{CommitmentManager, RoundCommitment, RoundPhase};
use crate::round::entry::{total_weight, Entry};
use crate::round::payout::Payout;
use crate::round::pot::RoundPot;
use crate::round::resolver::WeightedOutcomeResolver;

/// One game instance: sequential rounds over a single ledger.
pub struct SpinGame {
    config: GameConfig,
    resolver: WeightedOutcomeResolver,
    rounds: CommitmentManager,
    ledger: Arc<dyn RoundLedger>,
}

impl SpinGame {
    /// Game backed by the OS entropy source.
    ///
    /// Round numbering resumes after the ledger's latest round.
    pub fn new(config: GameConfig, ledger: Arc<dyn RoundLedger>) -> Result<Self, SettlementError> {
        Self::with_entropy(config, ledger, Arc::new(OsEntropy))
    }

    /// Game with an explicit entropy source.
    pub fn with_entropy(
        config: GameConfig,
        ledger: Arc<dyn RoundLedger>,
        entropy: Arc<dyn EntropySource>,
    ) -> Result<Self, SettlementError> {
        config.validate()?;
        let resolver = WeightedOutcomeResolver::new(config.modulus)?;
        let last_round_id = ledger.last_round_id();

        info!(
            modulus = config.modulus,
            house_fee_bps = config.house_fee_bps,
            last_round_id,
            "Spin game ready"
        );

        Ok(Self {
            config,
            resolver,
            rounds: CommitmentManager::resume_after(entropy, last_round_id),
            ledger,
        })
    }

    /// Game with the ledger named in `config` (in-memory if none).
    pub fn from_config(config: GameConfig) -> Result<Self, SettlementError> {
        let ledger: Arc<dyn RoundLedger> = match &config.ledger_path {
            Some(path) => Arc::new(JsonLinesLedger::open(path).map_err(|e| {
                SettlementError::InvalidConfig(format!("cannot open ledger {}: {}", path.display(), e))
            })?),
            None => Arc::new(InMemoryLedger::new()),
        };
        Self::new(config, ledger)
    }

    /// Open the next round and return its public announcement.
    ///
    /// The opening is logged before the commitment is handed out. If the
    /// ledger refuses it, the unpublished seed is discarded and the round
    /// slot freed.
    #[instrument(skip(self, client_seed))]
    pub fn open_round(&self, client_seed: Option<ClientSeed>) -> Result<OpenedRound, SettlementError> {
        let round = self.rounds.open_round(client_seed)?;
        let commitment = round.commitment().ok_or(SettlementError::InvalidState {
            operation: "publish commitment",
            phase: RoundPhase::Uninitialized,
        })?;

        let opened = OpenedRound {
            round_id: round.round_id(),
            nonce: round.nonce().clone(),
            client_seed: round.client_seed().clone(),
            commitment,
            opened_at: Utc::now(),
        };

        if let Err(source) = self.ledger.append(&LedgerEntry::Opened(opened.clone())) {
            error!(round_id = opened.round_id, error = %source, "Failed to log round opening");
            // Seed was never published; consuming it just frees the slot.
            let _ = round.reveal();
            return Err(SettlementError::LedgerUnavailable(source));
        }

        Ok(opened)
    }

    /// Empty pot using the configured betting limits.
    pub fn new_pot(&self) -> RoundPot {
        RoundPot::new(self.config.pot_limits)
    }

    /// Reveal the current round's seed, pick the winner and record it.
    ///
    /// Zero total weight (`NoEligibleParticipants`) and a pot larger than the
    /// draw modulus (`PotExceedsModulus`) are refused *before* the reveal,
    /// so the round stays open (fix the entries or cancel it).
    #[instrument(skip(self, entries), fields(entry_count = entries.len()))]
    pub fn reveal_and_settle(&self, entries: &[Entry]) -> Result<RoundRecord, SettlementError> {
        let round = self.committed_round("settle")?;

        let pot_total = total_weight(entries).ok_or(SettlementError::WeightOverflow)?;
        if pot_total == 0 {
            warn!(round_id = round.round_id(), "Settlement refused: no eligible participants");
            return Err(SettlementError::NoEligibleParticipants);
        }
        let modulus = self.resolver.modulus();
        if pot_total > modulus {
            warn!(
                round_id = round.round_id(),
                pot_total,
                modulus,
                "Settlement refused: pot exceeds draw modulus"
            );
            return Err(SettlementError::PotExceedsModulus {
                total: pot_total,
                modulus,
            });
        }
        let payout = Payout::compute(pot_total, self.config.house_fee_bps)?;

        let seed = round.reveal()?;
        let outcome = self
            .resolver
            .settle_round(&seed, round.client_seed(), round.nonce(), entries)?;

        let record = RoundRecord {
            round_id: round.round_id(),
            commitment: outcome.server_seed_hash.clone(),
            modulus,
            entries: entries.to_vec(),
            outcome,
            payout,
            settled_at: Utc::now(),
        };

        info!(
            round_id = record.round_id,
            winner = %record.outcome.winner_participant_id,
            draw = record.outcome.winning_draw,
            pot_total,
            winner_amount = record.payout.winner_amount,
            house_fee = record.payout.house_fee,
            "Round settled"
        );

        if let Err(source) = self.ledger.append(&LedgerEntry::Settled(record.clone())) {
            error!(
                round_id = record.round_id,
                error = %source,
                record = %record.to_json().unwrap_or_default(),
                "Failed to persist settled round"
            );
            return Err(SettlementError::LedgerWrite {
                record: Box::new(record),
                source,
            });
        }

        Ok(record)
    }

    /// Abandon the current round, publishing its seed.
    ///
    /// For rounds that cannot be settled (e.g. no entries). Frees the slot
    /// for the next round and logs the cancellation with the seed. The round
    /// id stays spent even if that log write fails, since the opening was
    /// already recorded.
    #[instrument(skip(self))]
    pub fn cancel_round(&self) -> Result<ServerSeed, SettlementError> {
        let round = self.committed_round("cancel")?;
        let seed = round.reveal()?;
        warn!(round_id = round.round_id(), "Round cancelled, seed published");

        let cancelled = CancelledRound {
            round_id: round.round_id(),
            commitment: seed.commitment().as_str().to_string(),
            revealed_server_seed: seed.expose().to_string(),
            cancelled_at: Utc::now(),
        };
        if let Err(e) = self.ledger.append(&LedgerEntry::Cancelled(cancelled)) {
            error!(round_id = round.round_id(), error = %e, "Failed to log round cancellation");
        }
        Ok(seed)
    }

    /// Verify a historical record.
    pub fn verify_round(&self, record: &RoundRecord) -> Result<bool, SettlementError> {
        RoundVerifier::verify_record(record)
    }

    /// Round currently open or last settled.
    pub fn current_round(&self) -> Option<Arc<RoundCommitment>> {
        self.rounds.current()
    }

    /// Backing ledger.
    pub fn ledger(&self) -> &dyn RoundLedger {
        self.ledger.as_ref()
    }

    /// Active configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    fn committed_round(&self, operation: &'static str) -> Result<Arc<RoundCommitment>, SettlementError> {
        let round = self.rounds.current().ok_or(SettlementError::InvalidState {
            operation,
            phase: RoundPhase::Uninitialized,
        })?;

        let phase = round.phase();
        if phase != RoundPhase::Committed {
            return Err(SettlementError::InvalidState { operation, phase });
        }
        Ok(round)
    }
}

// =============================================================================
// TESTS
// =============================================================================
