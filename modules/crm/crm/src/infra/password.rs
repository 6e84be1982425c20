//! Salted SHA-256 password hashes and bearer token digests.
//!
//! Stored form: `sha256$<salt hex>$<digest hex>`.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

fn digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Hash `password` with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    format!(
        "{SCHEME}${}${}",
        hex::encode(salt),
        hex::encode(digest(&salt, password))
    )
}

/// Check `password` against a stored hash. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    let actual = digest(&salt, password);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

/// Fresh bearer token: 32 random bytes, hex encoded.
#[must_use]
pub fn new_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

/// Digest under which a bearer token is stored.
#[must_use]
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_right_password() {
        let stored = hash_password("N3wpolo6");
        assert!(stored.starts_with("sha256$"));
        assert!(verify_password("N3wpolo6", &stored));
        assert!(!verify_password("n3wpolo6", &stored));
    }

    #[test]
    fn truncated_or_extended_digests_never_verify() {
        let stored = hash_password("N3wpolo6");
        let (head, digest) = stored.rsplit_once('$').unwrap();
        let truncated = format!("{head}${}", &digest[..62]);
        let extended = format!("{head}${digest}00");
        assert!(!verify_password("N3wpolo6", &truncated));
        assert!(!verify_password("N3wpolo6", &extended));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        for stored in ["", "sha256$zz$00", "md5$00$00", "sha256$00$00$00", "plaintext"] {
            assert!(!verify_password("anything", stored), "{stored}");
        }
    }

    #[test]
    fn tokens_are_64_hex_chars_and_digest_is_stable() {
        let token = new_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token_digest(&token), token_digest(&token));
        assert_ne!(token_digest(&token), token);
    }
}
