//! Cryptographic primitives: ECDH key agreement, HKDF key derivation, and AES-256-GCM AEAD.
//!
//! Every function here is pure modulo the system RNG and takes no ownership of long-lived state;
//! the [`crate::session`] module is what serializes calls and holds key material across calls.

mod aead;
pub mod b64;
mod ecdh;
mod kdf;

pub use self::aead::{open, seal, IV_LEN, TAG_LEN};
pub use self::ecdh::{PrivateKey, PublicKey, SharedSecret, COMPRESSED_LEN, UNCOMPRESSED_LEN};
pub use self::kdf::hkdf_sha256;

use rand_core::{CryptoRng, RngCore};

/// Errors the crypto engine can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Peer public key had the wrong length, wrong prefix byte, or was off-curve.
    InvalidPeerKey,
    /// The ECDH backend failed for a reason other than an invalid peer key.
    AgreementFailed,
    /// HKDF expansion failed to produce output (only possible with a pathological `info`).
    Hkdf,
    /// AEAD tag verification failed, or the backend rejected the operation.
    AuthFailure,
}

/// Fills `out` with cryptographically strong randomness.
///
/// The RNG must be seeded from a hardware TRNG before the first call to this function or to
/// [`PrivateKey::generate`]; callers are expected to restrict use of the shared RNG to a single
/// task (the packet worker), matching the single-threaded-in-effect contract of this module.
pub fn random<R: RngCore + CryptoRng>(rng: &mut R, out: &mut [u8]) {
    rng.fill_bytes(out);
}
