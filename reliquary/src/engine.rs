//! The `Engine`: owns every collaborator a long-running session needs,
//! in place of the process-wide globals a naive port would reach for.

use std::collections::HashMap;

use reliquary_archive::{ArchiveReader, LayoutRegistry};
use reliquary_common::Guid;
use reliquary_filter::FilterScheduler;
use reliquary_graph::{
    ContentGraph, ContentNamespace, ContentObject, ContentObjectId, ContentType, ContentTypeId,
    DisplayNameOverrides,
};
use reliquary_strings::{AssetKey, EncryptedAssetType, Keystore, Language, ResolvedString, StringError, TextKeyRecord, TextManager};
use reliquary_symbols::{Query, StructLayout, SymbolError};

use crate::config::GameConfig;

impl DisplayNameOverrides for GameConfig {
    fn override_for(&self, guid: &Guid) -> Option<String> {
        self.display_names.get(&guid.to_string()).cloned()
    }
}

/// The five list-view domains, each with its own [`FilterScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDomain {
    Files,
    Strings,
    Content,
    Conversations,
    Events,
}

/// The schedulers backing every list-view domain's search/filter/sort jobs.
pub struct EngineSchedulers {
    files: FilterScheduler<u32>,
    strings: FilterScheduler<u32>,
    content: FilterScheduler<ContentObjectId>,
    conversations: FilterScheduler<u32>,
    events: FilterScheduler<u32>,
}

impl EngineSchedulers {
    fn new(worker_count: usize) -> Self {
        EngineSchedulers {
            files: FilterScheduler::new(worker_count),
            strings: FilterScheduler::new(worker_count),
            content: FilterScheduler::new(worker_count),
            conversations: FilterScheduler::new(worker_count),
            events: FilterScheduler::new(worker_count),
        }
    }

    /// The Files-domain scheduler (file ids).
    pub fn files(&self) -> &FilterScheduler<u32> {
        &self.files
    }

    /// The Strings-domain scheduler (global string ids).
    pub fn strings(&self) -> &FilterScheduler<u32> {
        &self.strings
    }

    /// The Content-domain scheduler (content object ids).
    pub fn content(&self) -> &FilterScheduler<ContentObjectId> {
        &self.content
    }

    /// The Conversations-domain scheduler.
    pub fn conversations(&self) -> &FilterScheduler<u32> {
        &self.conversations
    }

    /// The Events-domain scheduler.
    pub fn events(&self) -> &FilterScheduler<u32> {
        &self.events
    }
}

/// Owns the fully-loaded content graph plus every other per-session
/// collaborator: layout schemas, text manager, key store, filter
/// schedulers, and config.
///
/// Construction runs the full loader pipeline; by the time an `Engine`
/// exists, loading is implicitly complete — there is no partially-loaded
/// `Engine` value.
pub struct Engine {
    graph: ContentGraph,
    #[allow(dead_code)]
    layouts: LayoutRegistry,
    text_manager: TextManager,
    keystore: Keystore,
    config: GameConfig,
    type_infos: HashMap<ContentTypeId, StructLayout>,
    schedulers: EngineSchedulers,
}

impl Engine {
    /// Assembles an `Engine` from its already-constructed collaborators.
    /// Loading (`ContentLoader::load`) and string-file parsing happen
    /// before this call; the engine itself only wires the pieces together.
    pub fn new(
        graph: ContentGraph,
        layouts: LayoutRegistry,
        text_manager: TextManager,
        keystore: Keystore,
        config: GameConfig,
    ) -> Self {
        Engine {
            graph,
            layouts,
            text_manager,
            keystore,
            config,
            type_infos: HashMap::new(),
            schedulers: EngineSchedulers::new(4),
        }
    }

    /// Registers (or replaces) the struct layout used to interpret objects
    /// of `type_id`, seeding it with the autogenerated GUID/UID/DataID/Name
    /// overlays first.
    pub fn set_type_layout(&mut self, type_id: ContentTypeId, mut layout: StructLayout) {
        reliquary_symbols::seed_autogenerated_layout(self.graph.content_type(type_id), &mut layout);
        self.type_infos.insert(type_id, layout);
    }

    /// `get_type(type_idx) -> &ContentType`
    pub fn get_type(&self, type_id: ContentTypeId) -> &ContentType {
        self.graph.content_type(type_id)
    }

    /// `get_object_by_guid`
    pub fn get_object_by_guid(&self, guid: &Guid) -> Option<&ContentObject> {
        self.graph.get_object_by_guid(guid)
    }

    /// `get_object_by_data_id(type, data_id)`: scans `type`'s registered
    /// objects for a matching scoped `DataID`.
    pub fn get_object_by_data_id(&self, type_id: ContentTypeId, data_id: u32) -> Option<&ContentObject> {
        self.graph
            .content_type(type_id)
            .objects
            .iter()
            .map(|&id| self.graph.object(id))
            .find(|obj| obj.data_id == Some(data_id))
    }

    /// `get_object_by_data_ptr`
    pub fn get_object_by_data_ptr(&self, file: u32, offset: u32) -> Option<&ContentObject> {
        self.graph.get_object_by_data_ptr(file, offset)
    }

    /// `root_namespace`
    pub fn root_namespace(&self) -> Option<&ContentNamespace> {
        self.graph.root_namespace()
    }

    /// Resolves `object`'s display name via the priority chain documented
    /// on [`ContentGraph::get_display_name`], consulting this engine's
    /// config for user overrides.
    pub fn display_name(&self, object: ContentObjectId) -> String {
        self.graph.get_display_name(object, &self.config)
    }

    /// `query(object, path)`: starts a path-expression traversal rooted at
    /// `object`, using the layout registered via [`Engine::set_type_layout`].
    pub fn query<'a>(&'a self, reader: &'a dyn ArchiveReader, object: ContentObjectId) -> Query<'a> {
        Query::new(
            &self.graph,
            reader,
            move |id: ContentObjectId| self.type_infos.get(&self.graph.object(id).type_id),
            object,
        )
    }

    /// `get_string(language, id)`
    pub fn get_string(&self, language: &Language, id: u32) -> Result<ResolvedString, StringError> {
        self.text_manager.get_string(language, id, &self.keystore)
    }

    /// `format_string(id, params...)`
    pub fn format_string(
        &self,
        language: &Language,
        id: u32,
        params: &[reliquary_strings::format::TextParam],
    ) -> Result<String, StringError> {
        self.text_manager.format_string(language, id, params, &self.keystore)
    }

    /// `mangle_full_name`
    pub fn mangle_full_name(&self, name: &str) -> String {
        reliquary_mangle::mangle_full_name(name)
    }

    /// `add_text_key`
    pub fn add_text_key(&self, string_id: u32, record: TextKeyRecord) {
        self.keystore.add_text_key(string_id, record);
    }

    /// `get_text_key`
    pub fn get_text_key(&self, string_id: u32) -> Option<TextKeyRecord> {
        self.keystore.get_text_key(string_id)
    }

    /// `add_asset_key`
    pub fn add_asset_key(&self, kind: EncryptedAssetType, asset_id: u32, key: AssetKey) {
        self.keystore.add_asset_key(kind, asset_id, key);
    }

    /// `get_asset_key`
    pub fn get_asset_key(&self, kind: EncryptedAssetType, asset_id: u32) -> Option<AssetKey> {
        self.keystore.get_asset_key(kind, asset_id)
    }

    /// Ingests newly observed decryption keys from a [`crate::KeySource`],
    /// advancing past `high_water_mark`.
    pub fn ingest_keys(&self, source: &dyn crate::KeySource, high_water_mark: i64) -> i64 {
        let (observations, next_mark) = source.poll_since(high_water_mark);
        for observation in observations {
            match observation {
                crate::KeyObservation::Text { string_id, record } => {
                    self.add_text_key(string_id, record);
                }
                crate::KeyObservation::Asset { kind, asset_id, key } => {
                    self.add_asset_key(kind, asset_id, key);
                }
            }
        }
        next_mark
    }

    /// The content-domain filter scheduler, for `filter_strings`-style
    /// async search jobs.
    pub fn content_scheduler(&self) -> &FilterScheduler<ContentObjectId> {
        self.schedulers.content()
    }

    /// The read-only game config this engine was constructed with.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

/// A symbol-resolution convenience wrapper, so callers don't need to
/// import [`SymbolError`] just to propagate it through [`crate::EngineError`].
pub type QueryResult<T> = Result<T, SymbolError>;
