//! Weighted pot entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque participant identifier (wallet address, user id, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One participant's contribution to the pot, in base units.
///
/// The order of entries in a round is significant: it fixes the
/// cumulative interval each participant occupies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Contributor.
    pub participant_id: ParticipantId,
    /// Contribution (selection weight).
    pub weight: u64,
}

impl Entry {
    /// Create an entry.
    pub fn new(participant_id: impl Into<ParticipantId>, weight: u64) -> Self {
        Self {
            participant_id: participant_id.into(),
            weight,
        }
    }
}

/// Sum of entry weights, `None` on overflow.
pub fn total_weight(entries: &[Entry]) -> Option<u64> {
    entries
        .iter()
        .try_fold(0u64, |acc, entry| acc.checked_add(entry.weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_field_names() {
        let entry = Entry::new("alice", 500);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"participantId":"alice","weight":500}"#);
    }

    #[test]
    fn test_total_weight() {
        let entries = vec![Entry::new("a", 1), Entry::new("b", 2), Entry::new("c", 0)];
        assert_eq!(total_weight(&entries), Some(3));
        assert_eq!(total_weight(&[]), Some(0));

        let overflow = vec![Entry::new("a", u64::MAX), Entry::new("b", 1)];
        assert_eq!(total_weight(&overflow), None);
    }
}
