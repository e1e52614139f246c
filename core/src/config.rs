//! Board configuration trait.
//!
//! Defines the hardware and platform capabilities this crate needs but does not implement itself:
//! persistent storage, a clock, randomness, USB HID output, and a way to notify the peer. A board
//! supplies one type implementing each and hands the whole thing to [`crate::worker`].

use rand_core::{CryptoRng, RngCore};

use crate::hid::{ConsumerReport, KeyboardReport, MouseReport, SystemControlReport};
use crate::keystore::RawStore;
use crate::state::StateObserver;
use crate::time::Clock;

/// Receives HID reports to forward to the USB host.
pub trait HidSink {
    /// Sends a keyboard report.
    fn keyboard(&mut self, report: KeyboardReport);
    /// Sends a mouse report.
    fn mouse(&mut self, report: MouseReport);
    /// Sends a consumer-control report.
    fn consumer(&mut self, report: ConsumerReport);
    /// Sends a system-control report.
    fn system_control(&mut self, report: SystemControlReport);
}

/// Sends a framed record to the connected peer, e.g. as a GATT notification.
pub trait Notifier {
    /// Sends `bytes` (an already-encoded [`crate::wire::ResponsePacket`]) to the peer.
    fn notify(&mut self, bytes: &[u8]);
}

/// Trait for this crate's board configurations.
///
/// This defines the types to be used throughout the worker and its subsystems: persistent
/// storage, a time source, a randomness source, USB HID sinks, and a peer notifier.
pub trait Board {
    /// Persistent key/value storage backing the keystore.
    type Store: RawStore;

    /// A time source with millisecond resolution.
    type Clock: Clock;

    /// A cryptographically secure randomness source, seeded from a hardware TRNG.
    type Rng: RngCore + CryptoRng;

    /// The USB HID class driver.
    type Hid: HidSink;

    /// The BLE GATT notification channel.
    type Notifier: Notifier;

    /// Receives state transitions, e.g. to drive a status LED.
    type StateObserver: StateObserver;
}
