//! Pot payout split between winner and house.

use serde::{Deserialize, Serialize};

use crate::error::SettlementError;

/// Basis points in 100%.
pub const BASIS_POINTS_DENOMINATOR: u64 = 10_000;

/// Default house fee (0.1%).
pub const DEFAULT_HOUSE_FEE_BPS: u16 = 10;

/// Highest configurable house fee (5%).
pub const MAX_HOUSE_FEE_BPS: u16 = 500;

/// How a settled pot is paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    /// Sum of all entries.
    pub pot_total: u64,
    /// Fee retained by the house (rounded down).
    pub house_fee: u64,
    /// Net amount owed to the winner.
    pub winner_amount: u64,
    /// Fee rate applied.
    pub house_fee_basis_points: u16,
}

impl Payout {
    /// Split `pot_total` with a fee of `fee_bps` basis points.
    pub fn compute(pot_total: u64, fee_bps: u16) -> Result<Self, SettlementError> {
        if fee_bps > MAX_HOUSE_FEE_BPS {
            return Err(SettlementError::InvalidConfig(format!(
                "house fee {} bps exceeds maximum {} bps",
                fee_bps, MAX_HOUSE_FEE_BPS
            )));
        }

        // u128 so large pots cannot overflow the multiplication
        let house_fee = (u128::from(pot_total) * u128::from(fee_bps)
            / u128::from(BASIS_POINTS_DENOMINATOR)) as u64;

        Ok(Self {
            pot_total,
            house_fee,
            winner_amount: pot_total - house_fee,
            house_fee_basis_points: fee_bps,
        })
    }
}
