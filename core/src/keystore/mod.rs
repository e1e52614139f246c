//! Bounded, persistent peer-key storage.
//!
//! The logical policy (capacity `N`, wipe-on-overflow, namespacing by fingerprint) lives here and
//! is backend-agnostic. A board plugs in a [`RawStore`] — flash, a file, or (in tests) a plain
//! in-memory map — and gets [`Keystore`]'s bounded-map semantics on top of it for free, the same
//! way the teacher's `PacketQueue` trait separates queue policy from the concrete buffer.

use sha2::{Digest, Sha256};

use crate::MAX_PAIRED_DEVICES;

/// Length, in hex characters, of a [`Fingerprint`].
pub const FINGERPRINT_LEN: usize = 12;

const SECURITY_NAMESPACE: &str = "security";
const IDENTITY_NAMESPACE: &str = "identity";
const PAIRED_DEVICES_KEY: &str = "pairedDevices";
const DEVICE_NAME_KEY: &str = "blename";

/// Maximum length of a stored device name.
pub const MAX_DEVICE_NAME_LEN: usize = 32;

/// A 12-hex-character identity derived from a peer's base64 public key.
///
/// Deterministic and pure: the same base64 string always yields the same fingerprint, across
/// reboots, because it is a plain digest with no device-specific salt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Computes the fingerprint of a peer's base64-encoded public key.
    ///
    /// The source hashes with MD5; this port uses SHA-256 truncated to 6 bytes (12 hex chars),
    /// which the spec explicitly sanctions as a stronger drop-in (96 bits is plenty for an
    /// identity-only lookup key with no collision-resistance requirement beyond "don't alias two
    /// enrolled peers together by accident").
    pub fn of(base64_public_key: &[u8]) -> Self {
        let digest = Sha256::digest(base64_public_key);
        let mut hex = [0u8; FINGERPRINT_LEN];
        for (i, byte) in digest[..FINGERPRINT_LEN / 2].iter().enumerate() {
            hex[i * 2] = hex_nibble(byte >> 4);
            hex[i * 2 + 1] = hex_nibble(byte & 0x0f);
        }
        Fingerprint(hex)
    }

    /// Returns the fingerprint as a borrowed ASCII hex string.
    pub fn as_str(&self) -> &str {
        // Safe: every byte comes from `hex_nibble`, which only ever emits ASCII.
        core::str::from_utf8(&self.0).unwrap_or("")
    }
}

fn hex_nibble(n: u8) -> u8 {
    match n {
        0..=9 => b'0' + n,
        _ => b'a' + (n - 10),
    }
}

/// Errors a [`RawStore`] or [`Keystore`] can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// No value under the requested namespace/key.
    NotFound,
    /// The backend rejected the read or write (flash fault, bad checksum, etc.).
    Backend,
    /// A caller-supplied buffer or string was too small for the stored value.
    BufferTooSmall,
}

/// Low-level namespaced byte storage a board provides.
///
/// Implementors only need get/set/contains/clear over `(namespace, key) -> bytes`; `Keystore`
/// layers the bounded-map and eviction policy of §4.2 on top.
pub trait RawStore {
    /// Reads the value at `(namespace, key)` into `out`, returning the number of bytes written.
    fn get(&self, namespace: &str, key: &str, out: &mut [u8]) -> Result<usize, StorageError>;

    /// Returns whether `(namespace, key)` currently has a value.
    fn contains(&self, namespace: &str, key: &str) -> Result<bool, StorageError>;

    /// Writes `value` at `(namespace, key)`, completing synchronously before returning.
    fn set(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Erases every key in `namespace`, leaving other namespaces untouched.
    fn clear_namespace(&mut self, namespace: &str) -> Result<(), StorageError>;
}

/// Bounded persistent map from [`Fingerprint`] to a 32-byte shared secret, capacity
/// [`MAX_PAIRED_DEVICES`].
pub struct Keystore<S> {
    store: S,
}

impl<S: RawStore> Keystore<S> {
    /// Wraps a raw backend.
    pub fn new(store: S) -> Self {
        Keystore { store }
    }

    /// Returns whether a shared secret is enrolled under `fingerprint`.
    pub fn exists(&self, fingerprint: &Fingerprint) -> Result<bool, StorageError> {
        self.store.contains(SECURITY_NAMESPACE, fingerprint.as_str())
    }

    /// Loads the shared secret enrolled under `fingerprint`.
    pub fn load(&self, fingerprint: &Fingerprint) -> Result<[u8; 32], StorageError> {
        let mut out = [0u8; 32];
        let n = self
            .store
            .get(SECURITY_NAMESPACE, fingerprint.as_str(), &mut out)?;
        if n != out.len() {
            return Err(StorageError::BufferTooSmall);
        }
        Ok(out)
    }

    /// Enrolls `shared` under `fingerprint`.
    ///
    /// If the keystore is at (or was never below) capacity, every existing enrollment is wiped
    /// and the count reset to zero before this one is inserted — per §4.2/§9.4, a coarse but
    /// intentional policy: it drops *all* enrollments, not just the oldest.
    pub fn put(&mut self, fingerprint: &Fingerprint, shared: &[u8; 32]) -> Result<(), StorageError> {
        let count = self.enrollment_count()?;
        if count >= MAX_PAIRED_DEVICES as u32 {
            self.store.clear_namespace(SECURITY_NAMESPACE)?;
            self.write_count(0)?;
        }
        self.store
            .set(SECURITY_NAMESPACE, fingerprint.as_str(), shared)?;
        let new_count = self.enrollment_count()?.saturating_add(1);
        self.write_count(new_count)
    }

    /// Returns the current enrollment count, treating an uninitialized counter as zero.
    pub fn enrollment_count(&self) -> Result<u32, StorageError> {
        let mut bytes = [0u8; 4];
        match self.store.get(SECURITY_NAMESPACE, PAIRED_DEVICES_KEY, &mut bytes) {
            Ok(_) => Ok(u32::from_le_bytes(bytes)),
            Err(StorageError::NotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_count(&mut self, count: u32) -> Result<(), StorageError> {
        self.store
            .set(SECURITY_NAMESPACE, PAIRED_DEVICES_KEY, &count.to_le_bytes())
    }

    /// Reads the persisted device name, falling back to [`crate::DEFAULT_DEVICE_NAME`] if unset.
    pub fn device_name(&self) -> Result<heapless::String<MAX_DEVICE_NAME_LEN>, StorageError> {
        let mut buf = [0u8; MAX_DEVICE_NAME_LEN];
        match self.store.get(IDENTITY_NAMESPACE, DEVICE_NAME_KEY, &mut buf) {
            Ok(n) => {
                let s = core::str::from_utf8(&buf[..n]).map_err(|_| StorageError::Backend)?;
                let mut out = heapless::String::new();
                out.push_str(s).map_err(|_| StorageError::BufferTooSmall)?;
                Ok(out)
            }
            Err(StorageError::NotFound) => {
                let mut out = heapless::String::new();
                out.push_str(crate::DEFAULT_DEVICE_NAME)
                    .map_err(|_| StorageError::BufferTooSmall)?;
                Ok(out)
            }
            Err(e) => Err(e),
        }
    }

    /// Sets the persisted device name.
    pub fn set_device_name(&mut self, name: &str) -> Result<(), StorageError> {
        if name.len() > MAX_DEVICE_NAME_LEN {
            return Err(StorageError::BufferTooSmall);
        }
        self.store
            .set(IDENTITY_NAMESPACE, DEVICE_NAME_KEY, name.as_bytes())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::string::String;
    use std::vec::Vec;

    /// An in-memory [`RawStore`] for tests.
    #[derive(Default)]
    pub struct InMemoryStore {
        map: HashMap<(String, String), Vec<u8>>,
    }

    impl RawStore for InMemoryStore {
        fn get(&self, namespace: &str, key: &str, out: &mut [u8]) -> Result<usize, StorageError> {
            let value = self
                .map
                .get(&(namespace.into(), key.into()))
                .ok_or(StorageError::NotFound)?;
            if value.len() > out.len() {
                return Err(StorageError::BufferTooSmall);
            }
            out[..value.len()].copy_from_slice(value);
            Ok(value.len())
        }

        fn contains(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
            Ok(self.map.contains_key(&(namespace.into(), key.into())))
        }

        fn set(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), StorageError> {
            self.map
                .insert((namespace.into(), key.into()), value.to_vec());
            Ok(())
        }

        fn clear_namespace(&mut self, namespace: &str) -> Result<(), StorageError> {
            self.map.retain(|(ns, _), _| ns != namespace);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::InMemoryStore;
    use super::*;

    #[test]
    fn fingerprint_is_pure() {
        let a = Fingerprint::of(b"same-base64-key==");
        let b = Fingerprint::of(b"same-base64-key==");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_is_twelve_hex_chars() {
        let fp = Fingerprint::of(b"anything");
        assert_eq!(fp.as_str().len(), FINGERPRINT_LEN);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn put_then_load_round_trips() {
        let mut ks = Keystore::new(InMemoryStore::default());
        let fp = Fingerprint::of(b"peer-one");
        let secret = [0x11u8; 32];
        ks.put(&fp, &secret).unwrap();
        assert!(ks.exists(&fp).unwrap());
        assert_eq!(ks.load(&fp).unwrap(), secret);
        assert_eq!(ks.enrollment_count().unwrap(), 1);
    }

    #[test]
    fn capacity_overflow_wipes_all_not_just_oldest() {
        let mut ks = Keystore::new(InMemoryStore::default());
        let mut fps = std::vec::Vec::new();
        for i in 0..MAX_PAIRED_DEVICES {
            let fp = Fingerprint::of(format!("peer-{i}").as_bytes());
            ks.put(&fp, &[i as u8; 32]).unwrap();
            fps.push(fp);
        }
        assert_eq!(ks.enrollment_count().unwrap(), MAX_PAIRED_DEVICES as u32);

        let sixth = Fingerprint::of(b"peer-six");
        ks.put(&sixth, &[0xffu8; 32]).unwrap();

        assert_eq!(ks.enrollment_count().unwrap(), 1);
        assert!(ks.exists(&sixth).unwrap());
        for fp in &fps {
            assert!(!ks.exists(fp).unwrap());
        }
    }

    #[test]
    fn device_name_round_trips_utf8() {
        let mut ks = Keystore::new(InMemoryStore::default());
        ks.set_device_name("Dvörak's 键盘").unwrap();
        assert_eq!(ks.device_name().unwrap().as_str(), "Dvörak's 键盘");
    }

    #[test]
    fn device_name_defaults_when_unset() {
        let ks = Keystore::new(InMemoryStore::default());
        assert_eq!(ks.device_name().unwrap().as_str(), crate::DEFAULT_DEVICE_NAME);
    }
}
