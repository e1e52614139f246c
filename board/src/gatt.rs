//! Notifier wiring [`quillkey_core::config::Notifier`] to the BLE GATT server's notify path.
//!
//! The GATT server itself — service/characteristic table, connection handling, MTU negotiation —
//! is an external collaborator; this module only owns the one characteristic handle the core
//! needs to push response packets back to the connected peer.

use heapless::Vec;
use quillkey_core::config::Notifier;

const MAX_NOTIFY_LEN: usize = 64;

/// Buffers the most recent response packet for the GATT stack's notify task to drain.
///
/// A real board replaces `pending` with a direct call into its GATT server's
/// `notify(connection_handle, characteristic, bytes)`; this glue keeps that call out of
/// `quillkey-core` by making `notify` infallible and deferring delivery to whatever polls
/// `take_pending`.
pub struct GattNotifier {
    pending: Option<Vec<u8, MAX_NOTIFY_LEN>>,
}

impl GattNotifier {
    pub fn new() -> Self {
        GattNotifier { pending: None }
    }

    /// Takes the most recently notified packet, if one hasn't been drained yet.
    pub fn take_pending(&mut self) -> Option<Vec<u8, MAX_NOTIFY_LEN>> {
        self.pending.take()
    }
}

impl Default for GattNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for GattNotifier {
    fn notify(&mut self, bytes: &[u8]) {
        let mut buf = Vec::new();
        if buf.extend_from_slice(bytes).is_ok() {
            self.pending = Some(buf);
        }
        // Oversized response packets can't happen in practice (`ResponsePacket::encode` is
        // bounded well under `MAX_NOTIFY_LEN`); silently dropping here just avoids a panic if
        // that assumption is ever violated.
    }
}
