//! HKDF-SHA256 key derivation (RFC 5869).

use hkdf::Hkdf;
use sha2::Sha256;

use super::CryptoError;

/// Derives a 32-byte output key from `ikm` using HKDF-SHA256.
///
/// `salt` may be empty (the session key derivation in [`crate::session`] always passes one).
/// `info` is the fixed context string binding the derived key to its purpose, e.g.
/// `b"aes-gcm-256"`.
pub fn hkdf_sha256(salt: &[u8], ikm: &[u8], info: &[u8]) -> Result<[u8; 32], CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; 32];
    hk.expand(info, &mut okm).map_err(|_| CryptoError::Hkdf)?;
    Ok(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_salt_and_absent_salt_agree() {
        // HMAC zero-pads short keys to the block size, so an empty-byte salt and the RFC 5869
        // default (HashLen zero bytes) key the same underlying HMAC.
        let ikm = [0xab; 32];
        let with_empty = hkdf_sha256(b"", &ikm, b"info").unwrap();
        let hk = Hkdf::<Sha256>::new(None, &ikm);
        let mut expected = [0u8; 32];
        hk.expand(b"info", &mut expected).unwrap();
        assert_eq!(with_empty, expected);
    }

    #[test]
    fn differing_info_strings_yield_different_keys() {
        let ikm = [0x11; 32];
        let a = hkdf_sha256(b"", &ikm, b"aes-gcm-256").unwrap();
        let b = hkdf_sha256(b"", &ikm, b"something-else").unwrap();
        assert_ne!(a, b);
    }
}
