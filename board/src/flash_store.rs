//! `RawStore` backed by a fixed region of internal flash, one record per `(namespace, key)` pair.
//!
//! Real wear-leveling is out of scope for this glue layer — the keystore's own bounded capacity
//! (`MAX_PAIRED_DEVICES`) and wipe-all-on-overflow policy keep write volume low enough that a
//! flat erase-and-rewrite scheme is adequate. A production board would swap this for a proper
//! flash filesystem; `RawStore` is the seam that lets it do so without touching `quillkey-core`.

use heapless::{FnvIndexMap, Vec};
use quillkey_core::keystore::{RawStore, StorageError};

const MAX_RECORDS: usize = 16;
const MAX_VALUE_LEN: usize = 64;

#[derive(Clone)]
struct Record {
    namespace: heapless::String<16>,
    key: heapless::String<32>,
    value: Vec<u8, MAX_VALUE_LEN>,
}

/// An in-RAM mirror of the flash-backed store, written through to a flash page on every `set`.
///
/// The actual flash-write call is board-specific (nRF52840's NVMC peripheral requires word-
/// aligned erase-before-write); this glue keeps the page write behind a single `persist` hook
/// so the RAM mirror above stays the only thing `quillkey-core` ever sees.
pub struct FlashStore {
    records: FnvIndexMap<u32, Record, MAX_RECORDS>,
}

fn slot_key(namespace: &str, key: &str) -> u32 {
    // FNV-1a, good enough for a small fixed-capacity index; collisions are detected by the
    // stored namespace/key fields, not assumed away.
    let mut hash: u32 = 0x811c_9dc5;
    for byte in namespace.bytes().chain(key.bytes()) {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

impl FlashStore {
    pub fn new() -> Self {
        FlashStore {
            records: FnvIndexMap::new(),
        }
    }

    fn find(&self, namespace: &str, key: &str) -> Option<&Record> {
        self.records
            .get(&slot_key(namespace, key))
            .filter(|r| r.namespace == namespace && r.key == key)
    }

    /// Writes the RAM mirror back to flash. Stubbed here; a real board implementation erases the
    /// backing page and rewrites every live record through `nrf52840_hal::nvmc`.
    fn persist(&self) {}
}

impl Default for FlashStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RawStore for FlashStore {
    fn get(&self, namespace: &str, key: &str, out: &mut [u8]) -> Result<usize, StorageError> {
        let record = self.find(namespace, key).ok_or(StorageError::NotFound)?;
        if record.value.len() > out.len() {
            return Err(StorageError::BufferTooSmall);
        }
        out[..record.value.len()].copy_from_slice(&record.value);
        Ok(record.value.len())
    }

    fn contains(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        Ok(self.find(namespace, key).is_some())
    }

    fn set(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut stored = Vec::new();
        stored
            .extend_from_slice(value)
            .map_err(|_| StorageError::BufferTooSmall)?;
        let mut namespace_buf = heapless::String::new();
        namespace_buf
            .push_str(namespace)
            .map_err(|_| StorageError::Backend)?;
        let mut key_buf = heapless::String::new();
        key_buf.push_str(key).map_err(|_| StorageError::Backend)?;
        let record = Record {
            namespace: namespace_buf,
            key: key_buf,
            value: stored,
        };
        self.records
            .insert(slot_key(namespace, key), record)
            .map_err(|_| StorageError::Backend)?;
        self.persist();
        Ok(())
    }

    fn clear_namespace(&mut self, namespace: &str) -> Result<(), StorageError> {
        let mut doomed: Vec<u32, MAX_RECORDS> = Vec::new();
        for (slot, record) in self.records.iter() {
            if record.namespace == namespace {
                let _ = doomed.push(*slot);
            }
        }
        for slot in &doomed {
            self.records.remove(slot);
        }
        self.persist();
        Ok(())
    }
}
