//! Weighted Outcome Resolver
//!
//! Turns (server seed, client seed, nonce) into a bounded draw and maps the
//! draw onto the pot's cumulative weight intervals.
//!
//! ```text
//! entries:   A=10        B=30                    C=60
//!          [0 ....... 10 .................. 40 ............................ 100)
//! position = draw mod 100
//! ```
//!
//! Everything here is pure and safe to call concurrently.

use tracing::{debug, warn};

use super::entry::{total_weight, Entry, ParticipantId};
use super::outcome::RoundOutcome;
use crate::core::hash::sha512_digest;
use crate::core::seed::{ClientSeed, Nonce, ServerSeed};
use crate::error::SettlementError;

/// Default draw modulus (37 wheel pockets).
pub const DEFAULT_MODULUS: u64 = 37;

/// Modulus that keeps the full 32-bit draw.
pub const FULL_RANGE_MODULUS: u64 = 1 << 32;

/// Separator between the three draw inputs.
pub const DRAW_DELIMITER: char = '-';

/// Deterministic draw and weighted winner selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightedOutcomeResolver {
    modulus: u64,
}

impl Default for WeightedOutcomeResolver {
    fn default() -> Self {
        Self {
            modulus: DEFAULT_MODULUS,
        }
    }
}

impl WeightedOutcomeResolver {
    /// Create a resolver with the given draw modulus (must be non-zero).
    pub fn new(modulus: u64) -> Result<Self, SettlementError> {
        if modulus == 0 {
            return Err(SettlementError::InvalidConfig(
                "draw modulus must be greater than zero".into(),
            ));
        }
        Ok(Self { modulus })
    }

    /// Draw modulus.
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Compute the draw for one round, in `[0, modulus)`.
    ///
    /// `SHA-512("{server}-{client}-{nonce}")`, first 8 hex characters read
    /// as an unsigned 32-bit integer, reduced modulo the modulus.
    pub fn compute_draw(&self, server_seed: &str, client_seed: &str, nonce: &str) -> u64 {
        let combined = format!(
            "{}{}{}{}{}",
            server_seed, DRAW_DELIMITER, client_seed, DRAW_DELIMITER, nonce
        );
        let digest = sha512_digest(combined.as_bytes());

        // First 8 hex chars == first 4 bytes, big-endian
        let raw = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        u64::from(raw) % self.modulus
    }

    /// Select the participant whose weight interval contains `draw mod total`.
    pub fn select_winner(&self, entries: &[Entry], draw: u64) -> Result<ParticipantId, SettlementError> {
        let (index, _) = locate(entries, draw)?;
        Ok(entries[index].participant_id.clone())
    }

    /// Draw, select and package the outcome of a round.
    ///
    /// The single outcome-producing operation. Callers invoke it once per
    /// round, after the seed has been revealed.
    pub fn settle_round(
        &self,
        server_seed: &ServerSeed,
        client_seed: &ClientSeed,
        nonce: &Nonce,
        entries: &[Entry],
    ) -> Result<RoundOutcome, SettlementError> {
        let draw = self.compute_draw(server_seed.expose(), client_seed.as_str(), nonce.as_str());
        let (index, total) = locate(entries, draw)?;

        if total > self.modulus {
            warn!(
                total,
                modulus = self.modulus,
                "Pot total exceeds draw modulus; positions >= modulus are unreachable"
            );
        }

        let winner = entries[index].participant_id.clone();
        debug!(draw, total, index, winner = %winner, "Winner selected");

        Ok(RoundOutcome {
            winner_participant_id: winner,
            winning_draw: draw,
            revealed_server_seed: server_seed.expose().to_string(),
            server_seed_hash: server_seed.commitment().as_str().to_string(),
            client_seed: client_seed.as_str().to_string(),
            nonce: nonce.as_str().to_string(),
        })
    }
}

/// Index of the winning entry and the pot total.
fn locate(entries: &[Entry], draw: u64) -> Result<(usize, u64), SettlementError> {
    let total = total_weight(entries).ok_or(SettlementError::WeightOverflow)?;
    if total == 0 {
        return Err(SettlementError::NoEligibleParticipants);
    }

    let position = draw % total;

    // Intervals are half-open, so zero-weight entries can never contain
    // `position`.
    let mut cumulative = 0u64;
    entries
        .iter()
        .position(|entry| {
            cumulative += entry.weight;
            position < cumulative
        })
        .map(|index| (index, total))
        .ok_or(SettlementError::NoEligibleParticipants)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entropy::random_seed;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn zero_seed() -> ServerSeed {
        ServerSeed::from_hex("0".repeat(64)).unwrap()
    }

    #[test]
    fn test_known_draw() {
        // Regression value: must never change or published rounds break.
        let resolver = WeightedOutcomeResolver::default();
        assert_eq!(resolver.compute_draw(&"0".repeat(64), "abc", "1"), 27);

        let full = WeightedOutcomeResolver::new(FULL_RANGE_MODULUS).unwrap();
        assert_eq!(full.compute_draw(&"0".repeat(64), "abc", "1"), 0xf49e4979);
    }

    #[test]
    fn test_draw_matches_hex_prefix() {
        let resolver = WeightedOutcomeResolver::new(FULL_RANGE_MODULUS).unwrap();
        let hex = crate::core::hash::hash512(b"seed-client-9");
        let expected = u64::from_str_radix(&hex[..8], 16).unwrap();
        assert_eq!(resolver.compute_draw("seed", "client", "9"), expected);
    }

    #[test]
    fn test_zero_modulus_rejected() {
        assert!(matches!(
            WeightedOutcomeResolver::new(0),
            Err(SettlementError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_interval_order() {
        let resolver = WeightedOutcomeResolver::default();
        let entries = vec![Entry::new("A", 5), Entry::new("B", 5)];

        assert_eq!(resolver.select_winner(&entries, 0).unwrap().as_str(), "A");
        assert_eq!(resolver.select_winner(&entries, 4).unwrap().as_str(), "A");
        assert_eq!(resolver.select_winner(&entries, 5).unwrap().as_str(), "B");
        assert_eq!(resolver.select_winner(&entries, 9).unwrap().as_str(), "B");
        // Wraps into the weight space
        assert_eq!(resolver.select_winner(&entries, 14).unwrap().as_str(), "A");
    }

    #[test]
    fn test_equal_weights_keep_separate_intervals() {
        let resolver = WeightedOutcomeResolver::default();
        // Same participant name twice still gets two intervals.
        let entries = vec![Entry::new("X", 1), Entry::new("Y", 1), Entry::new("X", 1)];
        assert_eq!(resolver.select_winner(&entries, 1).unwrap().as_str(), "Y");
        assert_eq!(resolver.select_winner(&entries, 2).unwrap().as_str(), "X");
    }

    #[test]
    fn test_no_eligible_participants() {
        let resolver = WeightedOutcomeResolver::default();
        assert!(matches!(
            resolver.select_winner(&[], 3),
            Err(SettlementError::NoEligibleParticipants)
        ));
        assert!(matches!(
            resolver.select_winner(&[Entry::new("A", 0), Entry::new("B", 0)], 3),
            Err(SettlementError::NoEligibleParticipants)
        ));
    }

    #[test]
    fn test_weight_overflow() {
        let resolver = WeightedOutcomeResolver::default();
        let entries = vec![Entry::new("A", u64::MAX), Entry::new("B", 1)];
        assert!(matches!(
            resolver.select_winner(&entries, 0),
            Err(SettlementError::WeightOverflow)
        ));
    }

    #[test]
    fn test_zero_seed_round() {
        let resolver = WeightedOutcomeResolver::default();
        let entries = vec![Entry::new("P1", 1), Entry::new("P2", 1)];

        let outcome = resolver
            .settle_round(&zero_seed(), &ClientSeed::new("abc"), &Nonce::from("1"), &entries)
            .unwrap();

        assert_eq!(outcome.winning_draw, 27);
        assert_eq!(outcome.winner_participant_id.as_str(), "P2");
        assert_eq!(
            outcome.server_seed_hash,
            "60e05bd1b195af2f94112fa7197a5c88289058840ce7c6df9693756bc6250f55"
        );
        assert_eq!(outcome.revealed_server_seed, "0".repeat(64));
        assert_eq!(outcome.client_seed, "abc");
        assert_eq!(outcome.nonce, "1");
    }

    #[test]
    fn test_settle_determinism() {
        let resolver = WeightedOutcomeResolver::new(FULL_RANGE_MODULUS).unwrap();
        let seed = random_seed().unwrap();
        let entries = vec![Entry::new("A", 10), Entry::new("B", 30), Entry::new("C", 60)];
        let client = ClientSeed::new("client");
        let nonce = Nonce::from(12u64);

        let first = resolver.settle_round(&seed, &client, &nonce, &entries).unwrap();
        let second = resolver.settle_round(&seed, &client, &nonce, &entries).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_weight_proportionality() {
        let resolver = WeightedOutcomeResolver::new(FULL_RANGE_MODULUS).unwrap();
        let entries = vec![Entry::new("A", 10), Entry::new("B", 30), Entry::new("C", 60)];
        let client = ClientSeed::new("proportionality");
        let trials = 20_000u32;

        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for round in 0..trials {
            let seed = random_seed().unwrap();
            let outcome = resolver
                .settle_round(&seed, &client, &Nonce::from(u64::from(round)), &entries)
                .unwrap();
            *counts.entry(outcome.winner_participant_id.to_string()).or_default() += 1;
        }

        for (name, expected) in [("A", 0.10), ("B", 0.30), ("C", 0.60)] {
            let observed = f64::from(counts.get(name).copied().unwrap_or(0)) / f64::from(trials);
            assert!(
                (observed - expected).abs() < 0.02,
                "{}: observed {:.4}, expected {:.2}",
                name,
                observed,
                expected
            );
        }
    }

    #[test]
    fn test_modulus_boundary_randomized() {
        for modulus in [1, 2, DEFAULT_MODULUS, 1000, FULL_RANGE_MODULUS] {
            let resolver = WeightedOutcomeResolver::new(modulus).unwrap();
            for trial in 0..10_000u32 {
                let seed = random_seed().unwrap();
                let draw = resolver.compute_draw(seed.expose(), "boundary", &trial.to_string());
                assert!(draw < modulus);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_draw_within_modulus(
            server in "[0-9a-f]{64}",
            client in ".{0,40}",
            nonce in 0u64..1_000_000,
            modulus in 1u64..=FULL_RANGE_MODULUS,
        ) {
            let resolver = WeightedOutcomeResolver::new(modulus).unwrap();
            let draw = resolver.compute_draw(&server, &client, &nonce.to_string());
            prop_assert!(draw < modulus);
            prop_assert_eq!(draw, resolver.compute_draw(&server, &client, &nonce.to_string()));
        }

        #[test]
        fn prop_zero_weight_never_selected(
            weights in proptest::collection::vec(1u64..1_000, 1..8),
            zero_at in 0usize..8,
            draw in any::<u64>(),
        ) {
            let resolver = WeightedOutcomeResolver::default();
            let mut entries: Vec<Entry> = weights
                .iter()
                .enumerate()
                .map(|(i, w)| Entry::new(format!("P{}", i), *w))
                .collect();
            let at = zero_at.min(entries.len());
            entries.insert(at, Entry::new("D", 0));

            let winner = resolver.select_winner(&entries, draw).unwrap();
            prop_assert_ne!(winner.as_str(), "D");
        }
    }
}
