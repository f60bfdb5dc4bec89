//! Engine configuration.

use std::path::PathBuf;

use crate::error::SettlementError;
use crate::round::payout::{DEFAULT_HOUSE_FEE_BPS, MAX_HOUSE_FEE_BPS};
use crate::round::pot::PotLimits;
use crate::round::resolver::FULL_RANGE_MODULUS;

/// Settlement engine configuration.
///
/// The largest pot the bet limits allow must fit under the draw modulus,
/// otherwise stake beyond the modulus could never win.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    /// Draw modulus.
    pub modulus: u64,
    /// House fee in basis points.
    pub house_fee_bps: u16,
    /// Betting limits.
    pub pot_limits: PotLimits,
    /// JSON-lines ledger file. If None, rounds are kept in memory.
    pub ledger_path: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            modulus: FULL_RANGE_MODULUS,
            house_fee_bps: DEFAULT_HOUSE_FEE_BPS,
            pot_limits: PotLimits::default(),
            ledger_path: None,
        }
    }
}

impl GameConfig {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// `SPIN_DRAW_MODULUS`, `SPIN_HOUSE_FEE_BPS`, `SPIN_MAX_PLAYERS`,
    /// `SPIN_MIN_BET`, `SPIN_MAX_BET`, `SPIN_LEDGER_PATH`.
    pub fn from_env() -> Result<Self, SettlementError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup (environment, map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettlementError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            modulus: parse_or(&lookup, "SPIN_DRAW_MODULUS", defaults.modulus)?,
            house_fee_bps: parse_or(&lookup, "SPIN_HOUSE_FEE_BPS", defaults.house_fee_bps)?,
            pot_limits: PotLimits {
                min_bet: parse_or(&lookup, "SPIN_MIN_BET", defaults.pot_limits.min_bet)?,
                max_bet: parse_or(&lookup, "SPIN_MAX_BET", defaults.pot_limits.max_bet)?,
                max_players: parse_or(&lookup, "SPIN_MAX_PLAYERS", defaults.pot_limits.max_players)?,
            },
            ledger_path: lookup("SPIN_LEDGER_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), SettlementError> {
        if self.modulus == 0 {
            return Err(SettlementError::InvalidConfig("modulus must be > 0".into()));
        }
        if self.house_fee_bps > MAX_HOUSE_FEE_BPS {
            return Err(SettlementError::InvalidConfig(format!(
                "house fee {} bps exceeds maximum {} bps",
                self.house_fee_bps, MAX_HOUSE_FEE_BPS
            )));
        }
        if self.pot_limits.min_bet == 0 || self.pot_limits.min_bet > self.pot_limits.max_bet {
            return Err(SettlementError::InvalidConfig(format!(
                "bet range [{}, {}] is invalid",
                self.pot_limits.min_bet, self.pot_limits.max_bet
            )));
        }
        if self.pot_limits.max_players == 0 {
            return Err(SettlementError::InvalidConfig("max players must be > 0".into()));
        }
        let max_pot = self.pot_limits.max_pot();
        if max_pot > self.modulus {
            return Err(SettlementError::InvalidConfig(format!(
                "largest pot {} ({} players x {}) exceeds draw modulus {}",
                max_pot, self.pot_limits.max_players, self.pot_limits.max_bet, self.modulus
            )));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, SettlementError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SettlementError::InvalidConfig(format!("{} has invalid value {:?}", key, raw))),
        None => Ok(default),
    }
}
