//! Round Record
//!
//! Everything a third party needs to re-verify a settled round, in one
//! serializable unit. JSON for publication, bincode for compact storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::seed::{ClientSeed, Nonce, ServerSeedCommitment};
use crate::round::entry::Entry;
use crate::round::outcome::RoundOutcome;
use crate::round::payout::Payout;

/// Settled round as persisted to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    /// Round identifier (also the nonce).
    pub round_id: u64,
    /// Commitment published when the round opened.
    pub commitment: String,
    /// Draw modulus the round was settled with.
    pub modulus: u64,
    /// Entries in interval order.
    pub entries: Vec<Entry>,
    /// Settlement result.
    pub outcome: RoundOutcome,
    /// Pot split.
    pub payout: Payout,
    /// Settlement time.
    pub settled_at: DateTime<Utc>,
}

impl RoundRecord {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to binary (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary (bincode).
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// Public announcement of a newly opened round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenedRound {
    /// Round identifier.
    pub round_id: u64,
    /// Nonce bound to the round.
    pub nonce: Nonce,
    /// Client seed fixed for the round.
    pub client_seed: ClientSeed,
    /// Commitment to the server seed.
    pub commitment: ServerSeedCommitment,
    /// When the commitment was published.
    pub opened_at: DateTime<Utc>,
}

/// Round abandoned without an outcome; its seed is published anyway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledRound {
    /// Round identifier.
    pub round_id: u64,
    /// Commitment published when the round opened.
    pub commitment: String,
    /// Seed behind the commitment.
    pub revealed_server_seed: String,
    /// When the round was cancelled.
    pub cancelled_at: DateTime<Utc>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::zero_seed_record;
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let record = zero_seed_record();
        let json = record.to_json().unwrap();
        assert_eq!(RoundRecord::from_json(&json).unwrap(), record);
    }

    #[test]
    fn test_binary_roundtrip() {
        let record = zero_seed_record();
        let bytes = record.to_bytes().unwrap();
        assert_eq!(RoundRecord::from_bytes(&bytes).unwrap(), record);
    }

    #[test]
    fn test_json_field_names() {
        let json = zero_seed_record().to_json().unwrap();
        assert!(json.contains("\"roundId\":1"));
        assert!(json.contains("\"settledAt\":\"2025-01-01T12:00:00Z\""));
        assert!(json.contains("\"winnerParticipantId\":\"P2\""));
        assert!(json.contains("\"houseFeeBasisPoints\":10"));
    }
}
