//! The device state machine and its fan-out to observers (status LED, peer notifications).

use crate::time::{Duration, Instant};
use crate::RECOVERY_TIMEOUT_MILLIS;

/// The device's connection/pairing state, as shown on the status LED and echoed to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// No BLE connection.
    NotConnected,
    /// Connected, but the peer has no enrollment and has not started pairing.
    Unpaired,
    /// Pairing in progress: keypair generated, public key queued or already typed.
    Pairing,
    /// A session key is derived and the command pipeline is accepting commands.
    Ready,
    /// The peer disconnected from a `Ready` session.
    Disconnected,
    /// A recoverable fault occurred (bad AUTH, decode failure, AEAD failure).
    Error,
    /// An unrecoverable fault occurred for this connection; the peer should reconnect.
    Drop,
}

/// Receives every state transition, for whatever the board wants to do with it (drive a status
/// LED, push a notification to the peer, log it).
pub trait StateObserver {
    fn on_state_changed(&mut self, state: DeviceState);
}

/// A [`StateObserver`] that does nothing, for contexts with no board to notify.
impl StateObserver for () {
    fn on_state_changed(&mut self, _state: DeviceState) {}
}

/// Tracks the current [`DeviceState`] and auto-recovers out of `Error`/`Drop` after
/// [`RECOVERY_TIMEOUT_MILLIS`].
pub struct StateMachine<O> {
    current: DeviceState,
    entered_at: Instant,
    observer: O,
}

impl<O: StateObserver> StateMachine<O> {
    /// Creates a state machine starting in `NotConnected` at `now`.
    pub fn new(observer: O, now: Instant) -> Self {
        StateMachine {
            current: DeviceState::NotConnected,
            entered_at: now,
            observer,
        }
    }

    /// The current state.
    pub fn current(&self) -> DeviceState {
        self.current
    }

    /// Moves to `new`, notifying the observer if it differs from the current state. A transition
    /// to the same state is a no-op: it does not reset the auto-recovery timer.
    pub fn transition(&mut self, new: DeviceState, now: Instant) {
        if new == self.current {
            return;
        }
        self.current = new;
        self.entered_at = now;
        self.observer.on_state_changed(new);
    }

    /// Call periodically (or whenever `now` advances) to auto-recover out of `Error`/`Drop`.
    pub fn poll(&mut self, now: Instant) {
        let recoverable = matches!(self.current, DeviceState::Error | DeviceState::Drop);
        if recoverable
            && now.duration_since(self.entered_at) >= Duration::from_millis(RECOVERY_TIMEOUT_MILLIS)
        {
            self.transition(DeviceState::NotConnected, now);
        }
    }
}
