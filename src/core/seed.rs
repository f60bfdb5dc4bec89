//! Seed Types
//!
//! Newtypes for the three draw inputs and the published commitment.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entropy::{random_hex, EntropySource};
use super::hash::{hash256, is_lower_hex32};
use crate::error::SettlementError;

/// Secret per-round server seed: 64 lowercase hex characters.
///
/// Deliberately not `Serialize`, and `Debug` is redacted, so the seed can
/// only leave the process through an explicit [`ServerSeed::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSeed(String);

impl ServerSeed {
    /// Wrap a hex seed. Must be exactly 64 lowercase hex characters.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self, SettlementError> {
        let hex = hex.into();
        if !is_lower_hex32(&hex) {
            return Err(SettlementError::MalformedInput(
                "server seed must be 64 lowercase hex characters".into(),
            ));
        }
        Ok(Self(hex))
    }

    /// The raw seed text. Only call at reveal or when settling.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Commitment (SHA-256 of the seed text).
    pub fn commitment(&self) -> ServerSeedCommitment {
        ServerSeedCommitment(hash256(self.0.as_bytes()))
    }

    /// Consume and return the seed text for publication.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSeed(<redacted>)")
    }
}

/// Published SHA-256 commitment to a server seed (64 lowercase hex chars).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerSeedCommitment(String);

impl ServerSeedCommitment {
    /// Wrap a published commitment.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self, SettlementError> {
        let hex = hex.into();
        if !is_lower_hex32(&hex) {
            return Err(SettlementError::MalformedInput(
                "commitment must be 64 lowercase hex characters".into(),
            ));
        }
        Ok(Self(hex))
    }

    /// Hex text of the commitment.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Does `seed` open this commitment?
    pub fn is_opened_by(&self, seed: &ServerSeed) -> bool {
        seed.commitment() == *self
    }
}

impl fmt::Display for ServerSeedCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant-supplied seed. Public, any string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSeed(String);

impl ClientSeed {
    /// Use a caller-provided seed verbatim.
    pub fn new(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    /// Locally generated default seed (64 hex characters).
    pub fn random(source: &dyn EntropySource) -> Result<Self, SettlementError> {
        Ok(Self(random_hex(source)?))
    }

    /// Seed text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Round nonce. Rounds opened by the manager use the decimal round id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    /// Nonce text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for Nonce {
    fn from(round_id: u64) -> Self {
        Self(round_id.to_string())
    }
}

impl From<&str> for Nonce {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Nonce {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
