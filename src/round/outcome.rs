//! Round Outcome
//!
//! The unit of public verifiability. Field names and hex encodings are part
//! of the published format and must not change.

use serde::{Deserialize, Serialize};

use super::entry::ParticipantId;

/// Result of settling one round. Created once, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    /// Selected participant.
    pub winner_participant_id: ParticipantId,
    /// Raw draw in `[0, modulus)`.
    pub winning_draw: u64,
    /// Server seed, published at settlement (64 lowercase hex).
    pub revealed_server_seed: String,
    /// Commitment published before the round (64 lowercase hex).
    pub server_seed_hash: String,
    /// Client seed used in the draw.
    pub client_seed: String,
    /// Round nonce used in the draw.
    pub nonce: String,
}
