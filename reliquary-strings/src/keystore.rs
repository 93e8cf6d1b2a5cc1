//! The decryption key store: maps encrypted strings and assets to the
//! keys needed to decrypt them.
//!
//! Keys are observed incrementally — from a live capture, or a replayed dump
//! — so the store is append-only: a later write of the same identity simply
//! replaces the previous record, but nothing is ever evicted. Readers (the
//! string pack, filter jobs) and writers (the key-observation feed) share
//! the map under a single [`parking_lot::RwLock`], matching the
//! reader/writer cache pattern used elsewhere in this workbench for
//! concurrent, append-mostly state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;

/// A 4-component position, matching the archive's `ImVec4`-shaped payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// A decryption key observed for one encrypted string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextKeyRecord {
    /// The decryption key itself.
    pub key: u64,
    /// Unix timestamp the key was observed at.
    pub time: i64,
    /// The session identifier the observation was made under.
    pub session: u32,
    /// The map identifier the observation was made on.
    pub map: u32,
    /// The observer's position at the time of observation.
    pub position: Position,
    /// Monotonically increasing index, assigned at insertion time.
    ///
    /// This preserves observation order even though the backing map is
    /// keyed by string id, matching the `stringDecryptionKeysByOrder`
    /// side-vector kept by the tool this engine reverse-engineers.
    pub insertion_order_index: u32,
}

/// The kind of asset an [`AssetKey`] unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptedAssetType {
    /// A voice-over audio asset.
    Voice = 1,
}

/// A decryption key for a non-text encrypted asset (currently only voice).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetKey {
    /// The decryption key itself.
    pub key: u64,
}

#[derive(Default)]
struct Inner {
    text_keys: HashMap<u32, TextKeyRecord>,
    asset_keys: HashMap<(EncryptedAssetType, u32), AssetKey>,
}

/// The key store: concurrent, append-only maps of observed decryption keys.
pub struct Keystore {
    inner: RwLock<Inner>,
    next_order: AtomicU32,
}

impl Default for Keystore {
    fn default() -> Self {
        Self::new()
    }
}

impl Keystore {
    /// Creates an empty key store.
    pub fn new() -> Self {
        Keystore {
            inner: RwLock::new(Inner::default()),
            next_order: AtomicU32::new(0),
        }
    }

    /// Records (or replaces) the decryption key for `string_id`.
    ///
    /// `record.insertion_order_index` is overwritten with this store's own
    /// monotonic counter: observation order is tracked by the store, not by
    /// the caller, so that replaying the same observation twice does not
    /// perturb ordering.
    pub fn add_text_key(&self, string_id: u32, mut record: TextKeyRecord) {
        record.insertion_order_index = self.next_order.fetch_add(1, Ordering::Relaxed);
        self.inner.write().text_keys.insert(string_id, record);
        tracing::debug!(string_id, "recorded text decryption key");
    }

    /// Looks up the decryption key for `string_id`, if observed.
    pub fn get_text_key(&self, string_id: u32) -> Option<TextKeyRecord> {
        self.inner.read().text_keys.get(&string_id).copied()
    }

    /// Records (or replaces) the decryption key for `(kind, asset_id)`.
    pub fn add_asset_key(&self, kind: EncryptedAssetType, asset_id: u32, key: AssetKey) {
        self.inner
            .write()
            .asset_keys
            .insert((kind, asset_id), key);
    }

    /// Looks up the decryption key for `(kind, asset_id)`, if observed.
    pub fn get_asset_key(&self, kind: EncryptedAssetType, asset_id: u32) -> Option<AssetKey> {
        self.inner.read().asset_keys.get(&(kind, asset_id)).copied()
    }

    /// The number of distinct text keys currently stored.
    pub fn text_key_count(&self) -> usize {
        self.inner.read().text_keys.len()
    }
}
