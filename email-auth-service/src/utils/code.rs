//! One-time code generation, digest binding, and constant-time verification.

use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Number of decimal digits in a one-time code.
pub const CODE_LENGTH: usize = 6;

const CODE_SPACE: u32 = 10u32.pow(CODE_LENGTH as u32);

/// Generate a uniformly distributed, zero-padded numeric code from the OS RNG.
pub fn generate_code() -> String {
    let value = OsRng.gen_range(0..CODE_SPACE);
    format!("{:0width$}", value, width = CODE_LENGTH)
}

/// Whether `code` is exactly [`CODE_LENGTH`] ASCII digits.
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// SHA-256 of `email:code`, hex encoded.
///
/// Unsalted: anyone holding the digest can test a candidate code. The digest is
/// only ever read back out of a signed proof token.
pub fn hash_code(email: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check `submitted_code` against the digest carried in a proof token.
///
/// Length is compared first since it is not secret; equal-length digests are
/// compared in constant time.
pub fn code_matches(email: &str, submitted_code: &str, expected_digest: &str) -> bool {
    let actual = hash_code(email, submitted_code);
    let actual = actual.as_bytes();
    let expected = expected_digest.as_bytes();

    if actual.len() != expected.len() {
        return false;
    }

    actual.ct_eq(expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..1000 {
            let code = generate_code();
            assert!(is_well_formed_code(&code), "bad code {code}");
        }
    }

    #[test]
    fn test_generated_codes_vary() {
        let codes: std::collections::HashSet<String> = (0..50).map(|_| generate_code()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_code_shape() {
        assert!(is_well_formed_code("000000"));
        assert!(is_well_formed_code("123456"));
        assert!(!is_well_formed_code("12a45"));
        assert!(!is_well_formed_code("12345"));
        assert!(!is_well_formed_code("1234567"));
        assert!(!is_well_formed_code("12345 "));
        assert!(!is_well_formed_code("-12345"));
        assert!(!is_well_formed_code("١٢٣٤٥٦"));
    }

    #[test]
    fn test_hash_is_deterministic_hex() {
        let digest = hash_code("a@b.com", "123456");
        assert_eq!(digest.len(), 64);
        assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(digest, hash_code("a@b.com", "123456"));
    }

    #[test]
    fn test_hash_matches_sha256_of_joined_input() {
        let expected = hex::encode(Sha256::digest(b"a@b.com:123456"));
        assert_eq!(hash_code("a@b.com", "123456"), expected);
    }

    #[test]
    fn test_hash_binds_email() {
        assert_ne!(hash_code("alice@x.com", "123456"), hash_code("bob@x.com", "123456"));
    }

    #[test]
    fn test_code_matches() {
        let digest = hash_code("a@b.com", "424242");
        assert!(code_matches("a@b.com", "424242", &digest));
        assert!(!code_matches("a@b.com", "424243", &digest));
        assert!(!code_matches("c@b.com", "424242", &digest));
    }

    #[test]
    fn test_code_matches_rejects_length_mismatch() {
        let digest = hash_code("a@b.com", "424242");
        assert!(!code_matches("a@b.com", "424242", &digest[..63]));
        assert!(!code_matches("a@b.com", "424242", ""));
    }
}
