//! The read side of the engine's persisted JSON config: user schemas,
//! custom display names, bookmarks and the demangling dictionary.
//!
//! Absent or malformed config degrades to [`GameConfig::default`] rather
//! than failing the whole load — the engine is fully usable, if less
//! friendly, with zero user schemas.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use reliquary_strings::{AssetKey, EncryptedAssetType, TextKeyRecord};

/// The deserialized shape of the on-disk JSON config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// User-chosen display names, keyed by an object's GUID rendered via
    /// its `Display` impl (JSON object keys must be strings).
    #[serde(default)]
    pub display_names: HashMap<String, String>,
    /// Bookmarked object GUIDs, rendered via `Display`.
    #[serde(default)]
    pub bookmarks: Vec<String>,
    /// Word list seeding the demangling dictionary attack.
    #[serde(default)]
    pub bruteforce_dictionary: Vec<String>,
    /// Names of enums shared across multiple `TypeInfo` schemas, available
    /// for a `Symbol`'s `shared_enum_name` to reference.
    #[serde(default)]
    pub shared_enum_names: Vec<String>,
    /// Names of struct layouts shared across multiple `TypeInfo` schemas.
    #[serde(default)]
    pub shared_struct_type_names: Vec<String>,
    /// Free-form author annotations on conversation scripts, keyed by an
    /// identifying string (a conversation GUID or index).
    #[serde(default)]
    pub conversation_annotations: HashMap<String, String>,
}

impl GameConfig {
    /// Parses `text` as a `GameConfig`. Returns `None` (never an error) on
    /// any parse failure, per this type's degrade-to-empty contract.
    pub fn parse(text: &str) -> Option<GameConfig> {
        serde_json::from_str(text).ok()
    }
}

/// One row observed in the external decryption-key store's SQLite
/// `Texts`/`Assets` tables, translated into a keystore insertion.
///
/// The SQLite reader itself is a collaborator boundary: this crate only
/// defines the translated shape and the [`KeySource`] trait a reader
/// implements, not the reader.
#[derive(Debug, Clone)]
pub enum KeyObservation {
    /// A row from the `Texts` table.
    Text {
        /// The global string id this key decrypts.
        string_id: u32,
        /// The observed key and its provenance.
        record: TextKeyRecord,
    },
    /// A row from the `Assets` table.
    Asset {
        /// The asset's encrypted-content kind.
        kind: EncryptedAssetType,
        /// The asset's id.
        asset_id: u32,
        /// The observed key.
        key: AssetKey,
    },
}

/// A source of newly observed decryption keys, polled by the engine at
/// roughly 1 Hz, tracking a per-table high-water mark.
pub trait KeySource {
    /// Returns every key observed since `high_water_mark`, along with the
    /// new high-water mark to pass on the next poll.
    fn poll_since(&self, high_water_mark: i64) -> (Vec<KeyObservation>, i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_defaults() {
        let config = GameConfig::parse("{}").unwrap();
        assert!(config.display_names.is_empty());
        assert!(config.bookmarks.is_empty());
    }

    #[test]
    fn test_malformed_config_degrades_to_none() {
        assert!(GameConfig::parse("not json").is_none());
    }

    #[test]
    fn test_roundtrip_through_serde_json() {
        let mut config = GameConfig::default();
        config.bruteforce_dictionary.push("Sword".into());
        let text = serde_json::to_string(&config).unwrap();
        let parsed = GameConfig::parse(&text).unwrap();
        assert_eq!(parsed.bruteforce_dictionary, vec!["Sword".to_string()]);
    }
}
