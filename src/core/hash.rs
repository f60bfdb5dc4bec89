//! Seed Hashing
//!
//! SHA-256 and SHA-512 primitives shared by the commitment, draw and
//! verification code. Every hex string produced here is lowercase.

use sha2::{Digest, Sha256, Sha512};

use crate::error::SettlementError;

/// Raw SHA-256 output (32 bytes).
pub type Digest256 = [u8; 32];

/// Raw SHA-512 output (64 bytes).
pub type Digest512 = [u8; 64];

/// Length of a hex-encoded 32-byte value.
pub const HEX32_LEN: usize = 64;

/// SHA-256 of arbitrary bytes.
pub fn sha256_digest(data: &[u8]) -> Digest256 {
    Sha256::digest(data).into()
}

/// SHA-512 of arbitrary bytes.
pub fn sha512_digest(data: &[u8]) -> Digest512 {
    Sha512::digest(data).into()
}

/// SHA-256 digest as 64 lowercase hex characters.
pub fn hash256(data: &[u8]) -> String {
    hex::encode(sha256_digest(data))
}

/// SHA-512 digest as 128 lowercase hex characters.
pub fn hash512(data: &[u8]) -> String {
    hex::encode(sha512_digest(data))
}

/// Strictly decode a 64-character hex string into 32 bytes.
///
/// Accepts either case. Anything else (wrong length, non-hex characters)
/// is `MalformedInput`; `what` names the field in the error message.
pub fn decode_hex32(what: &str, value: &str) -> Result<[u8; 32], SettlementError> {
    if value.len() != HEX32_LEN {
        return Err(SettlementError::MalformedInput(format!(
            "{} must be {} hex characters, got {}",
            what,
            HEX32_LEN,
            value.len()
        )));
    }

    let mut out = [0u8; 32];
    hex::decode_to_slice(value, &mut out)
        .map_err(|e| SettlementError::MalformedInput(format!("{} is not valid hex: {}", what, e)))?;
    Ok(out)
}

/// True if `value` is exactly 64 lowercase hex characters.
pub fn is_lower_hex32(value: &str) -> bool {
    value.len() == HEX32_LEN && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash256_known_values() {
        assert_eq!(
            hash256(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        // Commitment of the all-zero seed text
        let zero_seed = "0".repeat(64);
        assert_eq!(
            hash256(zero_seed.as_bytes()),
            "60e05bd1b195af2f94112fa7197a5c88289058840ce7c6df9693756bc6250f55"
        );
    }

    #[test]
    fn test_hash512_known_value() {
        let hash = hash512(b"abc");
        assert_eq!(hash.len(), 128);
        assert!(hash.starts_with("ddaf35a193617aba"));
    }

    #[test]
    fn test_hash_determinism() {
        assert_eq!(hash256(b"spin"), hash256(b"spin"));
        assert_eq!(hash512(b"spin"), hash512(b"spin"));
        assert_ne!(hash256(b"spin"), hash256(b"spun"));
    }

    #[test]
    fn test_hex_output_is_lowercase() {
        let hash = hash256(b"case");
        assert_eq!(hash, hash.to_lowercase());
        assert!(is_lower_hex32(&hash));
    }

    #[test]
    fn test_decode_hex32() {
        let zero = "0".repeat(64);
        assert_eq!(decode_hex32("seed", &zero).unwrap(), [0u8; 32]);

        let upper = "AB".repeat(32);
        assert_eq!(decode_hex32("seed", &upper).unwrap(), [0xAB; 32]);

        assert!(matches!(
            decode_hex32("seed", "abc"),
            Err(SettlementError::MalformedInput(_))
        ));
        assert!(matches!(
            decode_hex32("seed", &"zz".repeat(32)),
            Err(SettlementError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_is_lower_hex32() {
        assert!(is_lower_hex32(&"0f".repeat(32)));
        assert!(!is_lower_hex32(&"0F".repeat(32)));
        assert!(!is_lower_hex32("00"));
    }
}
