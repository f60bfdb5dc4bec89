//! Round Pot
//!
//! Collects bets for the open round into the ordered entry list the resolver
//! consumes. A repeat bet tops up the player's existing entry, which keeps
//! its original position in the interval order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entry::{Entry, ParticipantId};
use crate::error::SettlementError;

/// Default minimum bet (base units).
pub const DEFAULT_MIN_BET: u64 = 1_000;

/// Default maximum single bet (base units).
pub const DEFAULT_MAX_BET: u64 = 1_000_000;

/// Default cap on distinct players per round.
pub const DEFAULT_MAX_PLAYERS: usize = 10;

/// Betting limits for a pot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotLimits {
    /// Smallest accepted bet.
    pub min_bet: u64,
    /// Largest accepted single bet.
    pub max_bet: u64,
    /// Maximum distinct players.
    pub max_players: usize,
}

impl PotLimits {
    /// Largest pot these limits allow (`max_bet * max_players`, saturating).
    ///
    /// Top-ups count towards the same cap, so no pot ever exceeds it.
    pub fn max_pot(&self) -> u64 {
        let players = u64::try_from(self.max_players).unwrap_or(u64::MAX);
        self.max_bet.saturating_mul(players)
    }
}

impl Default for PotLimits {
    fn default() -> Self {
        Self {
            min_bet: DEFAULT_MIN_BET,
            max_bet: DEFAULT_MAX_BET,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

/// Bets placed in one round.
#[derive(Clone, Debug, Default)]
pub struct RoundPot {
    limits: PotLimits,
    entries: Vec<Entry>,
    total: u64,
}

impl RoundPot {
    /// Empty pot with the given limits.
    pub fn new(limits: PotLimits) -> Self {
        Self {
            limits,
            entries: Vec::new(),
            total: 0,
        }
    }

    /// Place (or top up) a bet. Returns the player's new total.
    pub fn place_bet(&mut self, participant: ParticipantId, amount: u64) -> Result<u64, SettlementError> {
        if amount < self.limits.min_bet || amount > self.limits.max_bet {
            return Err(SettlementError::InvalidBetAmount {
                amount,
                min: self.limits.min_bet,
                max: self.limits.max_bet,
            });
        }

        let total = self
            .total
            .checked_add(amount)
            .ok_or(SettlementError::WeightOverflow)?;
        let max_pot = self.limits.max_pot();
        if total > max_pot {
            return Err(SettlementError::PotLimitReached { max: max_pot });
        }

        let player_total = match self
            .entries
            .iter_mut()
            .find(|entry| entry.participant_id == participant)
        {
            Some(entry) => {
                entry.weight = entry
                    .weight
                    .checked_add(amount)
                    .ok_or(SettlementError::WeightOverflow)?;
                entry.weight
            }
            None => {
                if self.entries.len() >= self.limits.max_players {
                    return Err(SettlementError::MaxPlayersReached {
                        max: self.limits.max_players,
                    });
                }
                self.entries.push(Entry {
                    participant_id: participant.clone(),
                    weight: amount,
                });
                amount
            }
        };

        self.total = total;
        debug!(participant = %participant, amount, player_total, pot_total = total, "Bet placed");
        Ok(player_total)
    }

    /// Entries in bet order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Sum of all bets.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct players.
    pub fn player_count(&self) -> usize {
        self.entries.len()
    }

    /// Consume the pot, yielding its entries.
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}
