//! Per-language string decryption and the key store that backs it.
//!
//! [`TextManager`] owns one [`StringFile`] per `(language, file index)` and
//! resolves a global string id to a file/local-index pair; [`StringFile`]
//! decodes a string's term sequence lazily, applying placeholder
//! substitution and fix-ups (see [`format`]) and deferring to [`Keystore`]
//! for decryption.

#![warn(missing_docs)]

mod error;
pub mod format;
mod keystore;
mod strings;

pub use crate::error::StringError;
pub use crate::keystore::{AssetKey, EncryptedAssetType, Keystore, Position, TextKeyRecord};
pub use crate::strings::{
    ConcatKind, Language, RawString, RawTerm, ResolvedString, StringFile, StringStatus,
    TermBoundary, TextManager,
};
