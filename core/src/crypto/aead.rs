//! AES-256-GCM seal/open with no associated data.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};

use super::CryptoError;

/// Length of the AEAD nonce/IV.
pub const IV_LEN: usize = 12;
/// Length of the AEAD authentication tag.
pub const TAG_LEN: usize = 16;

/// Seals `buffer` in place using AES-256-GCM.
///
/// `iv` must already contain fresh randomness for this invocation (callers draw it from
/// [`super::random`]). On success, `buffer` has been overwritten with the ciphertext.
pub fn seal(
    key: &[u8; 32],
    iv: &[u8; IV_LEN],
    buffer: &mut [u8],
) -> Result<[u8; TAG_LEN], CryptoError> {
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from_slice(iv);
    let tag = cipher
        .encrypt_in_place_detached(nonce, b"", buffer)
        .map_err(|_| CryptoError::AuthFailure)?;
    let mut out = [0u8; TAG_LEN];
    out.copy_from_slice(tag.as_slice());
    Ok(out)
}

/// Opens `buffer` in place using AES-256-GCM, verifying `tag` in constant time.
///
/// On `Err`, `buffer`'s contents are not authenticated and MUST NOT be treated as plaintext by
/// the caller — the outer packet worker never forwards them to the HID transmitter.
pub fn open(
    key: &[u8; 32],
    iv: &[u8; IV_LEN],
    tag: &[u8; TAG_LEN],
    buffer: &mut [u8],
) -> Result<(), CryptoError> {
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from_slice(iv);
    let tag = Tag::from_slice(tag);
    cipher
        .decrypt_in_place_detached(nonce, b"", buffer, tag)
        .map_err(|_| CryptoError::AuthFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_plaintext_round_trips() {
        let key = [0u8; 32];
        let iv = [0u8; IV_LEN];
        let mut buffer: [u8; 0] = [];
        let tag = seal(&key, &iv, &mut buffer).unwrap();
        open(&key, &iv, &tag, &mut buffer).unwrap();
    }

    #[test]
    fn single_bit_flip_in_ciphertext_is_rejected() {
        let key = [0x7eu8; 32];
        let iv = [0x01u8; IV_LEN];
        let mut buffer = *b"type this please";
        let tag = seal(&key, &iv, &mut buffer).unwrap();
        buffer[0] ^= 0x01;
        assert!(open(&key, &iv, &tag, &mut buffer).is_err());
    }

    #[test]
    fn single_bit_flip_in_iv_is_rejected() {
        let key = [0x7eu8; 32];
        let iv = [0x01u8; IV_LEN];
        let mut buffer = *b"type this please";
        let tag = seal(&key, &iv, &mut buffer).unwrap();
        let mut bad_iv = iv;
        bad_iv[0] ^= 0x01;
        assert!(open(&key, &bad_iv, &tag, &mut buffer).is_err());
    }
}
