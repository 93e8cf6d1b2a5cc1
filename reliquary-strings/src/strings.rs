//! The string pack: per-language string files with on-demand decode
//! and decryption.

use std::collections::HashMap;

use parking_lot::RwLock;
use reliquary_common::FileId;

use crate::error::StringError;
use crate::format::{self, Fixup, TextParam};
use crate::keystore::Keystore;

/// Term concatenation kind for one piece of a string's on-disk encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatKind {
    /// This term references another string by index, recursively.
    Coded,
    /// This term is an inline literal run of text.
    Literal,
}

/// Whether a term is the last piece of a string or more follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermBoundary {
    /// No further terms follow this one.
    Final,
    /// At least one more term follows.
    Intermediate,
}

/// One piece of a string's on-disk encoding.
#[derive(Debug, Clone)]
pub struct RawTerm {
    /// Whether this term ends the string.
    pub boundary: TermBoundary,
    /// Whether this term is a literal run or a reference to another string.
    pub concat: ConcatKind,
    /// For [`ConcatKind::Literal`], the inline text.
    pub literal: String,
    /// For [`ConcatKind::Coded`], the local index of the referenced string.
    pub coded_ref: u32,
    /// Fix-up spans over this term's literal text, if any.
    pub fixups: Vec<Fixup>,
}

/// The raw, not-yet-decoded on-disk record for one string.
#[derive(Debug, Clone, Default)]
pub struct RawString {
    /// Whether this string is stored encrypted.
    pub encrypted: bool,
    /// The term sequence composing the decoded text.
    pub terms: Vec<RawTerm>,
}

/// The resolution status of a requested string, mirroring the four states
/// the engine must always collapse interpretation failures into (never a
/// raw undecoded byte blob).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringStatus {
    /// No record exists for this id.
    Missing,
    /// Stored and readable without a key.
    Unencrypted,
    /// Stored encrypted and no key is available yet.
    Encrypted,
    /// Stored encrypted and successfully decrypted.
    Decrypted,
}

/// A resolved string: its text (if any could be produced) and status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedString {
    /// The resolution status.
    pub status: StringStatus,
    /// The decoded text, present for [`StringStatus::Unencrypted`] and
    /// [`StringStatus::Decrypted`].
    pub text: Option<String>,
}

impl ResolvedString {
    fn missing() -> Self {
        ResolvedString {
            status: StringStatus::Missing,
            text: None,
        }
    }

    fn encrypted() -> Self {
        ResolvedString {
            status: StringStatus::Encrypted,
            text: None,
        }
    }
}

/// One language/file-index's worth of strings, decoded and cached lazily.
pub struct StringFile {
    global_string_id_base: u32,
    raw: Vec<RawString>,
    cache: RwLock<HashMap<u32, ResolvedString>>,
}

impl StringFile {
    /// Builds a string file from its raw, on-disk decoded records.
    ///
    /// `global_string_id_base` is the string id of local index 0, used to
    /// look decryption keys up in the [`Keystore`] (which is keyed globally).
    pub fn new(global_string_id_base: u32, raw: Vec<RawString>) -> Self {
        StringFile {
            global_string_id_base,
            raw,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves the string at local `index`, consulting `keystore` for a
    /// decryption key and `resolve_coded` to recursively resolve
    /// `ConcatKind::Coded` references.
    pub fn get(
        &self,
        index: u32,
        keystore: &Keystore,
        resolve_coded: &dyn Fn(u32) -> Option<String>,
    ) -> ResolvedString {
        if let Some(hit) = self.cache.read().get(&index) {
            return hit.clone();
        }

        let resolved = self.decode(index, keystore, resolve_coded);
        self.cache.write().insert(index, resolved.clone());
        resolved
    }

    fn decode(
        &self,
        index: u32,
        keystore: &Keystore,
        resolve_coded: &dyn Fn(u32) -> Option<String>,
    ) -> ResolvedString {
        let Some(raw) = self.raw.get(index as usize) else {
            return ResolvedString::missing();
        };

        if raw.encrypted {
            let global_id = self.global_string_id_base + index;
            if keystore.get_text_key(global_id).is_none() {
                return ResolvedString::encrypted();
            }
        }

        let mut text = String::new();
        for term in &raw.terms {
            let piece = match term.concat {
                ConcatKind::Literal => term.literal.clone(),
                ConcatKind::Coded => resolve_coded(term.coded_ref).unwrap_or_default(),
            };
            let piece = format::apply_fixups(&piece, &term.fixups, None);
            text.push_str(&piece);
            if term.boundary == TermBoundary::Final {
                break;
            }
        }

        ResolvedString {
            status: if raw.encrypted {
                StringStatus::Decrypted
            } else {
                StringStatus::Unencrypted
            },
            text: Some(text),
        }
    }
}

/// A simple language tag, e.g. `"en"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(pub String);

/// Owns every [`StringFile`] for every language, and answers id-based
/// lookups by dividing the global string id into `(file_index, local_index)`.
pub struct TextManager {
    strings_per_file: u32,
    files: HashMap<(Language, u32), StringFile>,
    file_ids: HashMap<Language, Vec<FileId>>,
}

impl TextManager {
    /// Creates a text manager with the given per-file string count.
    pub fn new(strings_per_file: u32) -> Self {
        TextManager {
            strings_per_file,
            files: HashMap::new(),
            file_ids: HashMap::new(),
        }
    }

    /// Registers a decoded string file at `(language, file_index)`.
    pub fn insert_file(&mut self, language: Language, file_index: u32, file_id: FileId, file: StringFile) {
        self.file_ids
            .entry(language.clone())
            .or_default()
            .push(file_id);
        self.files.insert((language, file_index), file);
    }

    /// Resolves `get_string(language, id)`.
    pub fn get_string(
        &self,
        language: &Language,
        id: u32,
        keystore: &Keystore,
    ) -> Result<ResolvedString, StringError> {
        if self.strings_per_file == 0 {
            return Err(StringError::UnknownLanguage(language.0.clone()));
        }
        let file_index = id / self.strings_per_file;
        let local_index = id % self.strings_per_file;

        let Some(file) = self.files.get(&(language.clone(), file_index)) else {
            return Err(StringError::UnknownLanguage(language.0.clone()));
        };

        let resolve_coded = |coded_index: u32| -> Option<String> {
            file.get(coded_index, keystore, &|_| None).text
        };

        Ok(file.get(local_index, keystore, &resolve_coded))
    }

    /// Substitutes placeholders in string `id`'s text with `params`, then
    /// applies fix-ups and the `%%` escape.
    pub fn format_string(
        &self,
        language: &Language,
        id: u32,
        params: &[TextParam],
        keystore: &Keystore,
    ) -> Result<String, StringError> {
        let resolved = self.get_string(language, id, keystore)?;
        let template = resolved.text.unwrap_or_default();
        Ok(format::apply_params(&template, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal_term(text: &str) -> RawTerm {
        RawTerm {
            boundary: TermBoundary::Final,
            concat: ConcatKind::Literal,
            literal: text.to_owned(),
            coded_ref: 0,
            fixups: vec![],
        }
    }

    #[test]
    fn test_unencrypted_roundtrip() {
        let file = StringFile::new(
            0,
            vec![RawString {
                encrypted: false,
                terms: vec![literal_term("hello")],
            }],
        );
        let keystore = Keystore::new();
        let resolved = file.get(0, &keystore, &|_| None);
        assert_eq!(resolved.status, StringStatus::Unencrypted);
        assert_eq!(resolved.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_missing_index() {
        let file = StringFile::new(0, vec![]);
        let keystore = Keystore::new();
        let resolved = file.get(5, &keystore, &|_| None);
        assert_eq!(resolved.status, StringStatus::Missing);
    }

    #[test]
    fn test_encrypted_without_key_is_encrypted_status() {
        let file = StringFile::new(
            0,
            vec![RawString {
                encrypted: true,
                terms: vec![literal_term("secret")],
            }],
        );
        let keystore = Keystore::new();
        let resolved = file.get(0, &keystore, &|_| None);
        assert_eq!(resolved.status, StringStatus::Encrypted);
        assert!(resolved.text.is_none());
    }

    #[test]
    fn test_text_manager_divmod_dispatch() {
        let mut manager = TextManager::new(2);
        let language = Language("en".to_owned());
        let file0 = StringFile::new(0, vec![literal_string("a"), literal_string("b")]);
        let file1 = StringFile::new(2, vec![literal_string("c"), literal_string("d")]);
        manager.insert_file(language.clone(), 0, FileId(1), file0);
        manager.insert_file(language.clone(), 1, FileId(2), file1);

        let keystore = Keystore::new();
        assert_eq!(
            manager
                .get_string(&language, 3, &keystore)
                .unwrap()
                .text
                .as_deref(),
            Some("d")
        );
    }

    fn literal_string(text: &str) -> RawString {
        RawString {
            encrypted: false,
            terms: vec![literal_term(text)],
        }
    }
}
