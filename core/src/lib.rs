//! Secure-session and packet-pipeline core of a wireless keystroke-injection appliance.
//!
//! A remote peer drives this device over a connection-oriented attribute protocol (BLE GATT).
//! This crate owns everything between the raw attribute bytes and USB HID reports: ECDH pairing
//! and enrollment, the AEAD record layer, the bounded command pipeline, HID report encoding, and
//! the device state machine. It does not talk to any radio, USB controller, LED, or button
//! directly — those are external collaborators reached through the traits in [`config`].
//!
//! Crate is `#![no_std]`: the target is a small MCU. Test modules opt back into `std` locally.

#![no_std]
#![warn(rust_2018_idioms)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod control;
pub mod crypto;
pub mod error;
pub mod hid;
pub mod keystore;
pub mod pairing;
pub mod pipeline;
pub mod session;
pub mod state;
pub mod time;
pub mod wire;
pub mod worker;

pub use self::error::CoreError;

/// Number of enrollments the keystore retains before wiping and starting over.
pub const MAX_PAIRED_DEVICES: usize = 5;

/// Capacity of the command pipeline (inbound attribute writes awaiting the packet worker).
pub const COMMAND_QUEUE_CAPACITY: usize = 50;

/// Capacity of the keyboard-typing string queue.
pub const STRING_QUEUE_CAPACITY: usize = 18;

/// Maximum length, in bytes, of a single queued typing string.
pub const MAX_QUEUE_STRING_LEN: usize = 256;

/// Maximum decrypted (inner) payload size of a DATA packet.
pub const MAX_DATA_LEN: usize = 201;

/// Minimum length of an inbound attribute write that can possibly decode: IV + TAG + HEADER.
pub const MIN_ATTRIBUTE_LEN: usize = 12 + 16 + 4;

/// Inter-character delay floor, in milliseconds, for keyboard typing (slow mode or not).
pub const SLOW_MODE_MILLIS: u32 = 5;

/// How long the device stays in `Error`/`Drop` before auto-recovering to `NotConnected`.
pub const RECOVERY_TIMEOUT_MILLIS: u32 = 3_000;

/// Delay, in milliseconds, between entering `Pairing` and typing the public key.
pub const PAIRING_TYPE_DELAY_MILLIS: u32 = 5_000;

/// Default advertised device name, overridable via the `rename` command.
pub const DEFAULT_DEVICE_NAME: &str = "Toothpaste";
