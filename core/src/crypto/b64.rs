//! Base64 encoding of public keys, as exchanged with the peer.
//!
//! The device types its own compressed public key over the keyboard during pairing, and decodes
//! the peer's uncompressed public key out of an AUTH packet's payload. Both directions go through
//! `base64ct`, a constant-time, allocation-free codec already in this crate's dependency graph by
//! way of the `p256`/`aes-gcm` family.

use base64ct::{Base64, Encoding};

use super::{CryptoError, COMPRESSED_LEN, UNCOMPRESSED_LEN};

/// Length of the base64 encoding of a compressed public key (33 bytes, no padding needed).
pub const COMPRESSED_B64_LEN: usize = 44;

/// Upper bound on the base64 encoding of an uncompressed public key (65 bytes, one pad byte).
pub const UNCOMPRESSED_B64_MAX_LEN: usize = 88;

/// Encodes a compressed public key as the 44-character base64 string typed into the host.
pub fn encode_compressed(bytes: &[u8; COMPRESSED_LEN]) -> heapless::String<COMPRESSED_B64_LEN> {
    let mut buf = [0u8; COMPRESSED_B64_LEN];
    let encoded =
        Base64::encode(bytes, &mut buf).expect("33-byte input always fits a 44-byte buffer");
    let mut out = heapless::String::new();
    out.push_str(encoded)
        .expect("encoded length matches buffer capacity");
    out
}

/// Decodes a peer's base64-encoded uncompressed public key.
pub fn decode_uncompressed(ascii: &[u8]) -> Result<[u8; UNCOMPRESSED_LEN], CryptoError> {
    let mut buf = [0u8; UNCOMPRESSED_LEN];
    let decoded = Base64::decode(ascii, &mut buf).map_err(|_| CryptoError::InvalidPeerKey)?;
    if decoded.len() != UNCOMPRESSED_LEN {
        return Err(CryptoError::InvalidPeerKey);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn compressed_round_trips_through_base64() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let (_, public) = PrivateKey::generate(&mut rng);
        let encoded = encode_compressed(&public.compressed());
        assert_eq!(encoded.len(), COMPRESSED_B64_LEN);
    }

    #[test]
    fn uncompressed_round_trips_through_base64() {
        let mut rng = ChaCha20Rng::seed_from_u64(43);
        let (_, public) = PrivateKey::generate(&mut rng);
        let mut buf = [0u8; UNCOMPRESSED_B64_MAX_LEN];
        let encoded = Base64::encode(public.uncompressed(), &mut buf).unwrap();
        let decoded = decode_uncompressed(encoded.as_bytes()).unwrap();
        assert_eq!(&decoded, public.uncompressed());
    }
}
