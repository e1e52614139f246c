//! Elliptic Curve Diffie-Hellman on secp256r1 (P-256).

use p256::ecdh::EphemeralSecret;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{EncodedPoint, PublicKey as P256PublicKey};
use rand_core::{CryptoRng, RngCore};

use super::CryptoError;

/// Length of an uncompressed secp256r1 public point: `0x04` prefix + 32-byte X + 32-byte Y.
pub const UNCOMPRESSED_LEN: usize = 65;
/// Length of a compressed secp256r1 public point: 1-byte parity prefix + 32-byte X.
pub const COMPRESSED_LEN: usize = 33;
/// Length of a raw ECDH shared secret (the agreed-upon X coordinate).
pub const SHARED_SECRET_LEN: usize = 32;

/// An ephemeral secp256r1 private key.
///
/// "Ephemeral" here means exactly what it says: [`PrivateKey::agree`] takes `self` by value, so
/// Rust's ownership rules enforce that the scalar cannot be reused across two agreements, and it
/// is zeroized on drop by the underlying `p256` type.
pub struct PrivateKey(EphemeralSecret);

/// An uncompressed secp256r1 public point, exactly as it appears on the wire.
#[derive(Clone, Copy)]
pub struct PublicKey([u8; UNCOMPRESSED_LEN]);

/// The raw output of an ECDH agreement. Never used directly as an AEAD key — always passed
/// through [`super::hkdf_sha256`] first.
pub struct SharedSecret(pub [u8; SHARED_SECRET_LEN]);

impl PrivateKey {
    /// Generates a fresh keypair using cryptographically strong randomness.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> (Self, PublicKey) {
        let secret = EphemeralSecret::random(rng);
        let encoded = secret.public_key().to_encoded_point(false);
        let mut bytes = [0u8; UNCOMPRESSED_LEN];
        bytes.copy_from_slice(encoded.as_bytes());
        (PrivateKey(secret), PublicKey(bytes))
    }

    /// Performs ECDH agreement against a peer's uncompressed public key.
    ///
    /// Accepts either exactly [`UNCOMPRESSED_LEN`] bytes, or that many plus one trailing NUL — a
    /// convenience for callers that decoded a peer's base64 public key into a fixed-size buffer
    /// sized for the NUL terminator.
    pub fn agree(self, peer: &[u8]) -> Result<SharedSecret, CryptoError> {
        let peer = trim_trailing_nul(peer)?;
        if peer[0] != 0x04 {
            return Err(CryptoError::InvalidPeerKey);
        }
        let encoded = EncodedPoint::from_bytes(peer).map_err(|_| CryptoError::InvalidPeerKey)?;
        let peer_public: P256PublicKey =
            Option::from(P256PublicKey::from_encoded_point(&encoded))
                .ok_or(CryptoError::InvalidPeerKey)?;

        let shared = self.0.diffie_hellman(&peer_public);
        let mut out = [0u8; SHARED_SECRET_LEN];
        out.copy_from_slice(shared.raw_secret_bytes().as_slice());
        Ok(SharedSecret(out))
    }
}

impl PublicKey {
    /// Wraps a caller-supplied uncompressed point without validating it against the curve.
    ///
    /// Validation happens at [`PrivateKey::agree`] time, the only place an invalid point would
    /// matter.
    pub fn from_uncompressed(bytes: [u8; UNCOMPRESSED_LEN]) -> Self {
        PublicKey(bytes)
    }

    /// Returns the 65-byte uncompressed encoding (`0x04 || X || Y`).
    pub fn uncompressed(&self) -> &[u8; UNCOMPRESSED_LEN] {
        &self.0
    }

    /// Returns the 33-byte compressed encoding: `0x02` if Y is even, `0x03` if odd, then X.
    pub fn compressed(&self) -> [u8; COMPRESSED_LEN] {
        let mut out = [0u8; COMPRESSED_LEN];
        let y_is_even = self.0[UNCOMPRESSED_LEN - 1] & 1 == 0;
        out[0] = if y_is_even { 0x02 } else { 0x03 };
        out[1..].copy_from_slice(&self.0[1..33]);
        out
    }
}

fn trim_trailing_nul(bytes: &[u8]) -> Result<&[u8], CryptoError> {
    match bytes.len() {
        UNCOMPRESSED_LEN => Ok(bytes),
        n if n == UNCOMPRESSED_LEN + 1 && bytes[n - 1] == 0 => Ok(&bytes[..UNCOMPRESSED_LEN]),
        _ => Err(CryptoError::InvalidPeerKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn compressed_prefix_matches_y_parity() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let (_, public) = PrivateKey::generate(&mut rng);
        let compressed = public.compressed();
        let y_is_even = public.uncompressed()[64] & 1 == 0;
        assert_eq!(compressed[0], if y_is_even { 0x02 } else { 0x03 });
        assert_eq!(&compressed[1..], &public.uncompressed()[1..33]);
    }

    #[test]
    fn agree_rejects_short_input() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let (private, _) = PrivateKey::generate(&mut rng);
        assert_eq!(
            private.agree(&[0x04; 10]),
            Err(CryptoError::InvalidPeerKey)
        );
    }
}
