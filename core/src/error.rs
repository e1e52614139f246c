//! Crate-wide error type.
//!
//! Every subsystem defines its own narrower error enum and converts into [`CoreError`] at the
//! point where it crosses into the packet worker, which is the only place core errors are mapped
//! to state transitions and response notifications.

use core::fmt;

/// Unified error type surfaced to the packet worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    /// Keystore read/write failure.
    Storage,
    /// Peer public key had the wrong length or an invalid leading byte.
    InvalidPeerKey,
    /// The ECDH backend rejected the agreement (e.g. point not on curve).
    AgreementFailed,
    /// HKDF expansion failed.
    Hkdf,
    /// Session key setup failed for a reason other than HKDF itself.
    KeySetup,
    /// AEAD tag mismatch, or the outer record was malformed.
    AuthFailure,
    /// A HID interface did not become ready within its timeout.
    NotReady,
    /// The command queue was at capacity.
    QueueFull,
    /// An AUTH packet named a fingerprint with no enrollment.
    PeerUnknown,
    /// Outer or inner record failed to parse.
    Decode,
    /// Operation attempted before `Session::init()`.
    NotInitialized,
    /// Operation required an active session key that isn't present.
    NoSession,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CoreError::Storage => "keystore read/write failure",
            CoreError::InvalidPeerKey => "invalid peer public key",
            CoreError::AgreementFailed => "ECDH agreement failed",
            CoreError::Hkdf => "HKDF expansion failed",
            CoreError::KeySetup => "session key setup failed",
            CoreError::AuthFailure => "AEAD authentication failure",
            CoreError::NotReady => "HID interface not ready",
            CoreError::QueueFull => "command queue full",
            CoreError::PeerUnknown => "peer fingerprint not enrolled",
            CoreError::Decode => "malformed record",
            CoreError::NotInitialized => "session not initialized",
            CoreError::NoSession => "no active session key",
        })
    }
}

impl From<crate::crypto::CryptoError> for CoreError {
    fn from(e: crate::crypto::CryptoError) -> Self {
        match e {
            crate::crypto::CryptoError::InvalidPeerKey => CoreError::InvalidPeerKey,
            crate::crypto::CryptoError::AgreementFailed => CoreError::AgreementFailed,
            crate::crypto::CryptoError::Hkdf => CoreError::Hkdf,
            crate::crypto::CryptoError::AuthFailure => CoreError::AuthFailure,
        }
    }
}

impl From<crate::keystore::StorageError> for CoreError {
    fn from(_: crate::keystore::StorageError) -> Self {
        CoreError::Storage
    }
}

impl From<crate::wire::codec::Error> for CoreError {
    fn from(_: crate::wire::codec::Error) -> Self {
        CoreError::Decode
    }
}
