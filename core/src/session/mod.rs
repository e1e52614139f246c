//! The secure session: ECDH pairing state, the derived AEAD key, and seal/open.
//!
//! One [`SecureSession`] lives for the lifetime of a connection. It owns exactly the key material
//! that must be destroyed on disconnect or pairing failure, and nothing else — admission control,
//! retries, and wire framing live above it in [`crate::worker`].

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::crypto::{self, b64, PrivateKey};
use crate::error::CoreError;
use crate::keystore::{Fingerprint, Keystore, RawStore};

/// Info string bound into the session-key HKDF expansion, fixed across this port.
const SESSION_KEY_INFO: &[u8] = b"aes-gcm-256";

/// Holds one connection's key material: an in-flight ephemeral keypair during pairing, the raw
/// ECDH output, and the AEAD key derived from it.
///
/// `session_key` and `shared` are the only fields [`teardown`](Self::teardown) must scrub; the
/// ephemeral keypair zeroizes itself on drop because `p256::ecdh::EphemeralSecret` already does.
pub struct SecureSession {
    ephemeral: Option<PrivateKey>,
    shared: Option<[u8; 32]>,
    session_key: Option<[u8; 32]>,
    session_salt: [u8; 32],
}

impl SecureSession {
    /// Creates a session with no key material.
    pub fn new() -> Self {
        SecureSession {
            ephemeral: None,
            shared: None,
            session_key: None,
            session_salt: [0u8; 32],
        }
    }

    /// Generates a fresh ephemeral keypair and returns the base64 encoding of its compressed
    /// public key — the string that gets typed into the host during pairing.
    ///
    /// Discards any keypair left over from an earlier, abandoned pairing attempt.
    pub fn generate_keypair<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> heapless::String<{ crypto::b64::COMPRESSED_B64_LEN }> {
        self.destroy_ephemeral();
        let (private, public) = PrivateKey::generate(rng);
        self.ephemeral = Some(private);
        b64::encode_compressed(&public.compressed())
    }

    /// Completes an agreement against a peer's base64-encoded uncompressed public key, enrolls
    /// the resulting shared secret under the peer's fingerprint, and derives the session key.
    ///
    /// Consumes the ephemeral keypair generated by [`generate_keypair`](Self::generate_keypair);
    /// returns [`CoreError::NoSession`] if one was never generated.
    pub fn agree_and_enroll<S: RawStore, R: RngCore + CryptoRng>(
        &mut self,
        keystore: &mut Keystore<S>,
        rng: &mut R,
        peer_base64: &[u8],
    ) -> Result<(), CoreError> {
        let private = self.ephemeral.take().ok_or(CoreError::NoSession)?;
        let peer_uncompressed = b64::decode_uncompressed(peer_base64)?;
        let shared = private.agree(&peer_uncompressed)?;
        self.shared = Some(shared.0);

        let fingerprint = Fingerprint::of(peer_base64);
        keystore.put(&fingerprint, &shared.0)?;

        self.derive_session_key(rng)
    }

    /// Loads a previously enrolled shared secret for `peer_base64`, if any, without touching the
    /// ephemeral keypair. Returns `false` (not an error) if the peer has no enrollment — the
    /// worker treats that as a cue to fall into pairing rather than a failure.
    pub fn load_enrolled<S: RawStore>(
        &mut self,
        keystore: &Keystore<S>,
        peer_base64: &[u8],
    ) -> Result<bool, CoreError> {
        let fingerprint = Fingerprint::of(peer_base64);
        if !keystore.exists(&fingerprint)? {
            return Ok(false);
        }
        let shared = keystore.load(&fingerprint)?;
        self.shared = Some(shared);
        Ok(true)
    }

    /// Derives the AEAD session key from the currently held shared secret, generating a fresh
    /// session salt. Requires [`load_enrolled`](Self::load_enrolled) or
    /// [`agree_and_enroll`](Self::agree_and_enroll) to have populated `shared` first.
    ///
    /// The session key is derived with an empty HKDF salt, per the fixed `hkdf_sha256(ε, shared,
    /// "aes-gcm-256")` construction every peer must reproduce. `session_salt` is a separate,
    /// independently random 32 bytes that never feeds into this derivation — it is only ever sent
    /// to the peer as the CHALLENGE payload.
    pub fn derive_session_key<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<(), CoreError> {
        let shared = self.shared.ok_or(CoreError::NoSession)?;
        crypto::random(rng, &mut self.session_salt);
        let key = crypto::hkdf_sha256(&[], &shared, SESSION_KEY_INFO)?;
        self.session_key = Some(key);
        self.destroy_ephemeral();
        Ok(())
    }

    /// Drops the in-flight ephemeral keypair, if any, without affecting an established session.
    pub fn destroy_ephemeral(&mut self) {
        self.ephemeral = None;
    }

    /// Encrypts `buffer` in place under the session key with a freshly drawn random IV.
    pub fn seal<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        buffer: &mut [u8],
    ) -> Result<([u8; crypto::IV_LEN], [u8; crypto::TAG_LEN]), CoreError> {
        let key = self.session_key.ok_or(CoreError::NoSession)?;
        let mut iv = [0u8; crypto::IV_LEN];
        crypto::random(rng, &mut iv);
        let tag = crypto::seal(&key, &iv, buffer)?;
        Ok((iv, tag))
    }

    /// Decrypts `buffer` in place under the session key, verifying `tag`.
    pub fn open(
        &self,
        iv: &[u8; crypto::IV_LEN],
        tag: &[u8; crypto::TAG_LEN],
        buffer: &mut [u8],
    ) -> Result<(), CoreError> {
        let key = self.session_key.ok_or(CoreError::NoSession)?;
        crypto::open(&key, iv, tag, buffer)?;
        Ok(())
    }

    /// Returns whether a session key has been derived and is available for seal/open.
    pub fn is_ready(&self) -> bool {
        self.session_key.is_some()
    }

    /// The current session salt, exposed so the worker can echo it back to the peer alongside an
    /// AUTH acknowledgement.
    pub fn session_salt(&self) -> &[u8; 32] {
        &self.session_salt
    }

    /// Checks a peer-supplied challenge response against the value this session expects.
    ///
    /// Not currently called from the packet worker's admission path — the original firmware never
    /// wired this check in either, and this port preserves that observable behavior. See
    /// `core::worker` for the call site this would slot into.
    ///
    /// Like [`derive_session_key`](Self::derive_session_key), this uses an empty HKDF salt; the
    /// session salt sent to the peer as the challenge is bound into `info` instead, so it never
    /// doubles as the HKDF salt parameter.
    pub fn verify_challenge(&self, peer_response: &[u8]) -> bool {
        let Some(key) = self.session_key else {
            return false;
        };
        let mut info = [0u8; 32 + b"challenge".len()];
        info[..32].copy_from_slice(&self.session_salt);
        info[32..].copy_from_slice(b"challenge");
        let Ok(expected) = crypto::hkdf_sha256(&[], &key, &info) else {
            return false;
        };
        expected.len() == peer_response.len()
            && expected
                .iter()
                .zip(peer_response.iter())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }

    /// Destroys all session key material. Idempotent.
    ///
    /// After this returns, both `session_key` and `shared` have been overwritten with zeroes in
    /// place before being cleared, so no copy of either ever lingers in the struct's memory.
    pub fn teardown(&mut self) {
        if let Some(key) = self.session_key.as_mut() {
            key.zeroize();
        }
        self.session_key = None;
        if let Some(shared) = self.shared.as_mut() {
            shared.zeroize();
        }
        self.shared = None;
        self.destroy_ephemeral();
    }
}

impl Default for SecureSession {
    fn default() -> Self {
        Self::new()
    }
}
