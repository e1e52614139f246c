//! Orchestrates the pairing handshake: keypair generation, the delayed HID-typed public key, and
//! the wait for the peer's AUTH response.
//!
//! Does not own the session or the string queue — it only sequences calls against them, the same
//! separation of "policy" from "state" used throughout this crate.

use rand_core::{CryptoRng, RngCore};

use crate::error::CoreError;
use crate::pipeline::StringPipeline;
use crate::session::SecureSession;
use crate::time::{Duration, Instant};
use crate::PAIRING_TYPE_DELAY_MILLIS;

/// Tracks one pairing attempt, from button-hold through the delayed typing of the public key.
pub struct PairingOrchestrator {
    started_at: Option<Instant>,
    pending_key: Option<heapless::String<44>>,
    typed: bool,
}

impl PairingOrchestrator {
    /// Creates an orchestrator with no pairing attempt in progress.
    pub fn new() -> Self {
        PairingOrchestrator {
            started_at: None,
            pending_key: None,
            typed: false,
        }
    }

    /// Whether a pairing attempt is currently in progress (keypair generated, not yet finished).
    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whether this attempt's public key has already been queued for typing.
    pub fn is_awaiting_auth(&self) -> bool {
        self.typed
    }

    /// Starts a pairing attempt: generates a fresh ephemeral keypair and arms the typing delay.
    ///
    /// Replaces any earlier, abandoned attempt.
    pub fn begin<R: RngCore + CryptoRng>(
        &mut self,
        session: &mut SecureSession,
        rng: &mut R,
        now: Instant,
    ) {
        let key = session.generate_keypair(rng);
        self.pending_key = Some(key);
        self.started_at = Some(now);
        self.typed = false;
    }

    /// Advances the attempt. Once [`PAIRING_TYPE_DELAY_MILLIS`] has elapsed since [`begin`], queues
    /// the public key for typing and returns `true` — exactly once per attempt.
    pub fn poll(&mut self, strings: &mut StringPipeline, now: Instant) -> Result<bool, CoreError> {
        let Some(started) = self.started_at else {
            return Ok(false);
        };
        if self.typed {
            return Ok(false);
        }
        if now.duration_since(started) < Duration::from_millis(PAIRING_TYPE_DELAY_MILLIS) {
            return Ok(false);
        }
        let key = self.pending_key.as_ref().ok_or(CoreError::NotInitialized)?;
        strings.push(key.as_str())?;
        self.typed = true;
        Ok(true)
    }

    /// Clears this attempt's state. Call once the peer's AUTH frame has been handled, whether it
    /// succeeded or failed.
    pub fn finish(&mut self) {
        self.started_at = None;
        self.pending_key = None;
        self.typed = false;
    }

    /// Abandons an in-progress attempt, destroying the unused ephemeral keypair.
    pub fn cancel(&mut self, session: &mut SecureSession) {
        session.destroy_ephemeral();
        self.finish();
    }
}

impl Default for PairingOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::mock::InMemoryStore;
    use crate::keystore::Keystore;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn poll_before_delay_does_not_queue_typing() {
        let mut rng = ChaCha20Rng::seed_from_u64(20);
        let mut session = SecureSession::new();
        let mut strings = StringPipeline::new();
        let mut orchestrator = PairingOrchestrator::new();

        orchestrator.begin(&mut session, &mut rng, Instant::from_millis(0));
        let queued = orchestrator
            .poll(&mut strings, Instant::from_millis(PAIRING_TYPE_DELAY_MILLIS - 1))
            .unwrap();
        assert!(!queued);
        assert!(strings.is_empty());
    }

    #[test]
    fn poll_after_delay_queues_typing_exactly_once() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let mut session = SecureSession::new();
        let mut strings = StringPipeline::new();
        let mut orchestrator = PairingOrchestrator::new();

        orchestrator.begin(&mut session, &mut rng, Instant::from_millis(0));
        let first = orchestrator
            .poll(&mut strings, Instant::from_millis(PAIRING_TYPE_DELAY_MILLIS))
            .unwrap();
        assert!(first);
        assert_eq!(strings.len(), 1);

        let second = orchestrator
            .poll(&mut strings, Instant::from_millis(PAIRING_TYPE_DELAY_MILLIS + 100))
            .unwrap();
        assert!(!second);
        assert_eq!(strings.len(), 1);
        assert!(orchestrator.is_awaiting_auth());
    }

    #[test]
    fn cancel_clears_attempt_and_destroys_keypair() {
        let mut rng = ChaCha20Rng::seed_from_u64(22);
        let mut session = SecureSession::new();
        let mut orchestrator = PairingOrchestrator::new();
        orchestrator.begin(&mut session, &mut rng, Instant::from_millis(0));
        assert!(orchestrator.is_active());

        orchestrator.cancel(&mut session);
        assert!(!orchestrator.is_active());

        let mut keystore = Keystore::new(InMemoryStore::default());
        assert_eq!(
            session.agree_and_enroll(&mut keystore, &mut rng, b"anything"),
            Err(CoreError::NoSession)
        );
    }
}
