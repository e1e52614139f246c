//! Physical button handling and device renaming — the two ways a human (rather than the peer)
//! steers the device.

use rand_core::{CryptoRng, RngCore};

use crate::error::CoreError;
use crate::keystore::{Keystore, RawStore, MAX_DEVICE_NAME_LEN};
use crate::pairing::PairingOrchestrator;
use crate::session::SecureSession;
use crate::time::Instant;

/// A physical button interaction, already debounced by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// A short press: cancels an in-progress pairing attempt, otherwise does nothing.
    Click,
    /// A held press: (re)starts pairing.
    Hold,
}

/// Dispatches button events and rename requests against the pairing and keystore state.
pub struct ControlSurface;

impl ControlSurface {
    /// Routes a button event to the pairing orchestrator.
    pub fn handle_button<R: RngCore + CryptoRng>(
        event: ButtonEvent,
        orchestrator: &mut PairingOrchestrator,
        session: &mut SecureSession,
        rng: &mut R,
        now: Instant,
    ) {
        match event {
            ButtonEvent::Hold => orchestrator.begin(session, rng, now),
            ButtonEvent::Click => {
                if orchestrator.is_active() {
                    orchestrator.cancel(session);
                }
            }
        }
    }

    /// Applies a `rename` command, rejecting names over [`MAX_DEVICE_NAME_LEN`].
    pub fn handle_rename<S: RawStore>(
        keystore: &mut Keystore<S>,
        name: &str,
    ) -> Result<(), CoreError> {
        if name.is_empty() || name.len() > MAX_DEVICE_NAME_LEN {
            return Err(CoreError::Decode);
        }
        keystore.set_device_name(name).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::mock::InMemoryStore;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn hold_starts_pairing() {
        let mut rng = ChaCha20Rng::seed_from_u64(30);
        let mut session = SecureSession::new();
        let mut orchestrator = PairingOrchestrator::new();
        ControlSurface::handle_button(
            ButtonEvent::Hold,
            &mut orchestrator,
            &mut session,
            &mut rng,
            Instant::from_millis(0),
        );
        assert!(orchestrator.is_active());
    }

    #[test]
    fn click_cancels_active_pairing() {
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        let mut session = SecureSession::new();
        let mut orchestrator = PairingOrchestrator::new();
        orchestrator.begin(&mut session, &mut rng, Instant::from_millis(0));

        ControlSurface::handle_button(
            ButtonEvent::Click,
            &mut orchestrator,
            &mut session,
            &mut rng,
            Instant::from_millis(10),
        );
        assert!(!orchestrator.is_active());
    }

    #[test]
    fn click_with_no_active_pairing_is_a_no_op() {
        let mut rng = ChaCha20Rng::seed_from_u64(32);
        let mut session = SecureSession::new();
        let mut orchestrator = PairingOrchestrator::new();
        ControlSurface::handle_button(
            ButtonEvent::Click,
            &mut orchestrator,
            &mut session,
            &mut rng,
            Instant::from_millis(10),
        );
        assert!(!orchestrator.is_active());
    }

    #[test]
    fn rename_rejects_oversized_name() {
        let mut keystore = Keystore::new(InMemoryStore::default());
        let too_long = "x".repeat(MAX_DEVICE_NAME_LEN + 1);
        assert_eq!(
            ControlSurface::handle_rename(&mut keystore, &too_long),
            Err(CoreError::Decode)
        );
    }

    #[test]
    fn rename_applies_valid_name() {
        let mut keystore = Keystore::new(InMemoryStore::default());
        ControlSurface::handle_rename(&mut keystore, "My Keyboard").unwrap();
        assert_eq!(keystore.device_name().unwrap().as_str(), "My Keyboard");
    }
}
