//! Round Commitment Protocol
//!
//! Commit to the server seed before a round accepts entries, reveal it once
//! at settlement.
//!
//! ```text
//! Uninitialized --open--> Committed --reveal--> Revealed
//! ```
//!
//! The reveal is a compare-and-swap under the round's mutex, so it succeeds
//! at most once even when several callers race for it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::entropy::{random_seed_from, EntropySource, OsEntropy};
use crate::core::seed::{ClientSeed, Nonce, ServerSeed, ServerSeedCommitment};
use crate::error::SettlementError;

/// Externally visible phase of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No seed generated yet.
    Uninitialized,
    /// Commitment published, seed held privately.
    Committed,
    /// Seed published.
    Revealed,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Committed => write!(f, "committed"),
            Self::Revealed => write!(f, "revealed"),
        }
    }
}

/// Internal state; the seed only exists while `Committed`.
enum SeedState {
    Uninitialized,
    Committed {
        seed: ServerSeed,
        commitment: ServerSeedCommitment,
    },
    Revealed {
        commitment: ServerSeedCommitment,
    },
}

impl SeedState {
    fn phase(&self) -> RoundPhase {
        match self {
            Self::Uninitialized => RoundPhase::Uninitialized,
            Self::Committed { .. } => RoundPhase::Committed,
            Self::Revealed { .. } => RoundPhase::Revealed,
        }
    }
}

/// One round's seed commitment.
pub struct RoundCommitment {
    round_id: u64,
    nonce: Nonce,
    client_seed: ClientSeed,
    state: Mutex<SeedState>,
}

impl RoundCommitment {
    /// Create an uninitialized round. The nonce is the decimal round id.
    pub fn new(round_id: u64, client_seed: ClientSeed) -> Self {
        Self {
            round_id,
            nonce: Nonce::from(round_id),
            client_seed,
            state: Mutex::new(SeedState::Uninitialized),
        }
    }

    /// Round identifier.
    pub fn round_id(&self) -> u64 {
        self.round_id
    }

    /// Nonce bound to this round.
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Client seed fixed for this round.
    pub fn client_seed(&self) -> &ClientSeed {
        &self.client_seed
    }

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.lock().phase()
    }

    /// Published commitment, once the round has been opened.
    pub fn commitment(&self) -> Option<ServerSeedCommitment> {
        match &*self.lock() {
            SeedState::Uninitialized => None,
            SeedState::Committed { commitment, .. } | SeedState::Revealed { commitment } => {
                Some(commitment.clone())
            }
        }
    }

    /// Generate a seed from `source` and commit to it.
    ///
    /// Only the commitment is returned; the seed stays inside the round
    /// until [`RoundCommitment::reveal`].
    pub fn open(&self, source: &dyn EntropySource) -> Result<ServerSeedCommitment, SettlementError> {
        let mut state = self.lock();
        ensure_phase(&state, RoundPhase::Uninitialized, "open")?;

        let seed = random_seed_from(source)?;
        Ok(self.commit(&mut state, seed))
    }

    /// Commit to a known seed (replays, fixtures).
    pub fn open_with_seed(&self, seed: ServerSeed) -> Result<ServerSeedCommitment, SettlementError> {
        let mut state = self.lock();
        ensure_phase(&state, RoundPhase::Uninitialized, "open")?;
        Ok(self.commit(&mut state, seed))
    }

    fn commit(&self, state: &mut SeedState, seed: ServerSeed) -> ServerSeedCommitment {
        let commitment = seed.commitment();
        info!(
            round_id = self.round_id,
            commitment = %commitment,
            "Round committed"
        );
        *state = SeedState::Committed {
            seed,
            commitment: commitment.clone(),
        };
        commitment
    }

    /// Reveal the seed: `Committed -> Revealed`, at most once.
    ///
    /// Re-checks the seed against the published commitment. A mismatch is
    /// corruption and leaves the round `Committed`.
    pub fn reveal(&self) -> Result<ServerSeed, SettlementError> {
        let mut state = self.lock();
        let (seed, commitment) = match &*state {
            SeedState::Committed { seed, commitment } => (seed.clone(), commitment.clone()),
            other => {
                return Err(SettlementError::InvalidState {
                    operation: "reveal",
                    phase: other.phase(),
                })
            }
        };

        let actual = seed.commitment();
        if actual != commitment {
            error!(
                round_id = self.round_id,
                expected = %commitment,
                actual = %actual,
                "Commitment integrity violated at reveal"
            );
            return Err(SettlementError::CommitmentIntegrity {
                round_id: self.round_id,
                expected: commitment.as_str().to_string(),
                actual: actual.as_str().to_string(),
            });
        }

        *state = SeedState::Revealed { commitment };
        info!(round_id = self.round_id, "Server seed revealed");
        Ok(seed)
    }

    fn lock(&self) -> MutexGuard<'_, SeedState> {
        // Every transition is a single assignment, so a poisoned state is
        // still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn swap_seed_for_test(&self, replacement: ServerSeed) {
        if let SeedState::Committed { seed, .. } = &mut *self.lock() {
            *seed = replacement;
        }
    }
}

impl fmt::Debug for RoundCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundCommitment")
            .field("round_id", &self.round_id)
            .field("client_seed", &self.client_seed)
            .field("phase", &self.phase())
            .finish()
    }
}

fn ensure_phase(
    state: &SeedState,
    expected: RoundPhase,
    operation: &'static str,
) -> Result<(), SettlementError> {
    let phase = state.phase();
    if phase == expected {
        Ok(())
    } else {
        Err(SettlementError::InvalidState { operation, phase })
    }
}

// =============================================================================
// COMMITMENT MANAGER
// =============================================================================

struct RoundSlot {
    current: Option<Arc<RoundCommitment>>,
    last_round_id: u64,
}

/// Sequences rounds for one game instance.
///
/// At most one round may be `Committed` at a time; round ids (and so
/// nonces) increase by one per opened round.
pub struct CommitmentManager {
    entropy: Arc<dyn EntropySource>,
    slot: Mutex<RoundSlot>,
}

impl Default for CommitmentManager {
    fn default() -> Self {
        Self::new(Arc::new(OsEntropy))
    }
}

impl CommitmentManager {
    /// Manager starting at round 1.
    pub fn new(entropy: Arc<dyn EntropySource>) -> Self {
        Self::resume_after(entropy, 0)
    }

    /// Manager whose next round is `last_round_id + 1`.
    pub fn resume_after(entropy: Arc<dyn EntropySource>, last_round_id: u64) -> Self {
        Self {
            entropy,
            slot: Mutex::new(RoundSlot {
                current: None,
                last_round_id,
            }),
        }
    }

    /// Open the next round and publish its commitment.
    ///
    /// Without a client seed a random one is generated. Fails if the
    /// previous round has not been revealed.
    pub fn open_round(
        &self,
        client_seed: Option<ClientSeed>,
    ) -> Result<Arc<RoundCommitment>, SettlementError> {
        let mut slot = self.lock_slot();

        if let Some(current) = &slot.current {
            let phase = current.phase();
            if phase == RoundPhase::Committed {
                return Err(SettlementError::InvalidState {
                    operation: "open a new round",
                    phase,
                });
            }
        }

        let client_seed = match client_seed {
            Some(seed) => seed,
            None => ClientSeed::random(self.entropy.as_ref())?,
        };

        let round_id = slot.last_round_id + 1;
        let round = Arc::new(RoundCommitment::new(round_id, client_seed));
        round.open(self.entropy.as_ref())?;

        slot.last_round_id = round_id;
        slot.current = Some(round.clone());
        Ok(round)
    }

    /// Reveal the current round's seed.
    pub fn reveal_current(&self) -> Result<(Arc<RoundCommitment>, ServerSeed), SettlementError> {
        let round = self.current().ok_or(SettlementError::InvalidState {
            operation: "reveal",
            phase: RoundPhase::Uninitialized,
        })?;
        let seed = round.reveal()?;
        Ok((round, seed))
    }

    /// Most recently opened round.
    pub fn current(&self) -> Option<Arc<RoundCommitment>> {
        self.lock_slot().current.clone()
    }

    /// Id of the most recently opened round (0 if none).
    pub fn last_round_id(&self) -> u64 {
        self.lock_slot().last_round_id
    }

    /// Entropy source used for seeds.
    pub fn entropy(&self) -> &dyn EntropySource {
        self.entropy.as_ref()
    }

    fn lock_slot(&self) -> MutexGuard<'_, RoundSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entropy::testing::{BrokenEntropy, CountingEntropy};
    use std::thread;

    fn seed(hex_digit: char) -> ServerSeed {
        ServerSeed::from_hex(hex_digit.to_string().repeat(64)).unwrap()
    }

    #[test]
    fn test_open_then_reveal() {
        let round = RoundCommitment::new(1, ClientSeed::new("abc"));
        assert_eq!(round.phase(), RoundPhase::Uninitialized);
        assert!(round.commitment().is_none());

        let commitment = round.open_with_seed(seed('0')).unwrap();
        assert_eq!(round.phase(), RoundPhase::Committed);
        assert_eq!(round.commitment(), Some(commitment.clone()));

        let revealed = round.reveal().unwrap();
        assert_eq!(round.phase(), RoundPhase::Revealed);
        assert!(commitment.is_opened_by(&revealed));
        // Commitment survives the reveal unchanged
        assert_eq!(round.commitment(), Some(commitment));
    }

    #[test]
    fn test_open_uses_entropy_source() {
        let round = RoundCommitment::new(1, ClientSeed::new("abc"));
        let commitment = round.open(&CountingEntropy::default()).unwrap();
        assert_eq!(commitment, seed('0').commitment());
    }

    #[test]
    fn test_double_open_fails() {
        let round = RoundCommitment::new(1, ClientSeed::new("abc"));
        round.open_with_seed(seed('0')).unwrap();

        let result = round.open_with_seed(seed('1'));
        assert!(matches!(
            result,
            Err(SettlementError::InvalidState { phase: RoundPhase::Committed, .. })
        ));
        // Original commitment untouched
        assert_eq!(round.commitment(), Some(seed('0').commitment()));
    }

    #[test]
    fn test_reveal_before_commit_fails() {
        let round = RoundCommitment::new(1, ClientSeed::new("abc"));
        assert!(matches!(
            round.reveal(),
            Err(SettlementError::InvalidState { phase: RoundPhase::Uninitialized, .. })
        ));
    }

    #[test]
    fn test_double_reveal_fails() {
        let round = RoundCommitment::new(1, ClientSeed::new("abc"));
        round.open_with_seed(seed('0')).unwrap();
        round.reveal().unwrap();

        assert!(matches!(
            round.reveal(),
            Err(SettlementError::InvalidState { phase: RoundPhase::Revealed, .. })
        ));
    }

    #[test]
    fn test_open_after_reveal_fails() {
        let round = RoundCommitment::new(1, ClientSeed::new("abc"));
        round.open_with_seed(seed('0')).unwrap();
        round.reveal().unwrap();
        assert!(round.open_with_seed(seed('1')).is_err());
    }

    #[test]
    fn test_corrupted_seed_detected() {
        let round = RoundCommitment::new(9, ClientSeed::new("abc"));
        round.open_with_seed(seed('0')).unwrap();
        round.swap_seed_for_test(seed('1'));

        match round.reveal() {
            Err(SettlementError::CommitmentIntegrity { round_id, expected, actual }) => {
                assert_eq!(round_id, 9);
                assert_eq!(expected, seed('0').commitment().as_str());
                assert_eq!(actual, seed('1').commitment().as_str());
            }
            other => panic!("expected integrity error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(round.phase(), RoundPhase::Committed);
    }

    #[test]
    fn test_concurrent_reveal_happens_once() {
        let round = Arc::new(RoundCommitment::new(1, ClientSeed::new("abc")));
        round.open_with_seed(seed('7')).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let round = round.clone();
                thread::spawn(move || round.reveal().is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn test_manager_sequences_rounds() {
        let manager = CommitmentManager::new(Arc::new(CountingEntropy::default()));

        let first = manager.open_round(Some(ClientSeed::new("c"))).unwrap();
        assert_eq!(first.round_id(), 1);
        assert_eq!(first.nonce().as_str(), "1");

        // Cannot open while round 1 is unrevealed
        assert!(matches!(
            manager.open_round(None),
            Err(SettlementError::InvalidState { .. })
        ));

        let (revealed_round, _) = manager.reveal_current().unwrap();
        assert_eq!(revealed_round.round_id(), 1);

        let second = manager.open_round(None).unwrap();
        assert_eq!(second.round_id(), 2);
        assert_eq!(manager.last_round_id(), 2);
    }

    #[test]
    fn test_manager_default_client_seed() {
        let manager = CommitmentManager::new(Arc::new(CountingEntropy::default()));
        let round = manager.open_round(None).unwrap();

        // First fill goes to the client seed, second to the server seed
        assert_eq!(round.client_seed().as_str(), "00".repeat(32));
        let server_seed = ServerSeed::from_hex("01".repeat(32)).unwrap();
        assert_eq!(round.commitment(), Some(server_seed.commitment()));
    }

    #[test]
    fn test_manager_reveal_without_round() {
        let manager = CommitmentManager::default();
        assert!(matches!(
            manager.reveal_current(),
            Err(SettlementError::InvalidState { phase: RoundPhase::Uninitialized, .. })
        ));
    }

    #[test]
    fn test_manager_entropy_failure_aborts_open() {
        let manager = CommitmentManager::new(Arc::new(BrokenEntropy));
        let result = manager.open_round(Some(ClientSeed::new("c")));

        assert!(matches!(result, Err(SettlementError::EntropySource(_))));
        assert!(manager.current().is_none());
        assert_eq!(manager.last_round_id(), 0);
    }

    #[test]
    fn test_manager_resume() {
        let manager = CommitmentManager::resume_after(Arc::new(CountingEntropy::default()), 41);
        let round = manager.open_round(Some(ClientSeed::new("c"))).unwrap();
        assert_eq!(round.round_id(), 42);
    }
}
