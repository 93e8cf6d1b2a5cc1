//! The content graph itself: the arena plus its lookup indices.

use std::cell::RefCell;
use std::collections::HashMap;

use reliquary_common::Guid;

use crate::error::LoaderError;
use crate::ids::{ContentNamespaceId, ContentObjectId, ContentTypeId};
use crate::types::{ContentName, ContentNamespace, ContentObject, ContentType};

/// A stable priority chain of ways to name an object for display, used when
/// no more specific resolution (a name field, a `ContentName` overlay)
/// applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackName {
    /// `typeIdx<<22 | dataId`, rendered as hex.
    TypeAndDataId(u32),
    /// A scoped UID, rendered as hex.
    Uid(u32),
    /// The object's GUID, rendered via its `Display` impl.
    Guid(Guid),
    /// The object's arena index, used when nothing else is available.
    ArenaIndex(ContentObjectId),
}

impl std::fmt::Display for FallbackName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackName::TypeAndDataId(id) => write!(f, "<ID: {id:#010X}>"),
            FallbackName::Uid(uid) => write!(f, "<UID: {uid:#010X}>"),
            FallbackName::Guid(guid) => write!(f, "<{guid}>"),
            FallbackName::ArenaIndex(id) => write!(f, "<#{}>", id.0),
        }
    }
}

/// A user-supplied override for an object's display name, keyed by GUID.
pub trait DisplayNameOverrides {
    /// Returns a user-chosen name for `guid`, if one has been configured.
    fn override_for(&self, guid: &Guid) -> Option<String>;
}

/// An override source with no entries, for callers with no configured names.
pub struct NoOverrides;

impl DisplayNameOverrides for NoOverrides {
    fn override_for(&self, _guid: &Guid) -> Option<String> {
        None
    }
}

/// The append-only arena of types, namespaces and objects produced by
/// [`crate::ContentLoader::load`], plus the lookup indices built over it.
#[derive(Debug, Default)]
pub struct ContentGraph {
    pub(crate) types: Vec<ContentType>,
    pub(crate) namespaces: Vec<ContentNamespace>,
    pub(crate) objects: Vec<ContentObject>,

    pub(crate) by_guid: HashMap<Guid, ContentObjectId>,
    pub(crate) by_data_ptr: HashMap<(u32, u32), ContentObjectId>,
    pub(crate) by_name: HashMap<String, Vec<ContentObjectId>>,
    pub(crate) by_namespace_name: HashMap<String, Vec<ContentNamespaceId>>,
}

/// A query over [`ContentGraph::matches_filter`].
///
/// Carries its own match-memoization cache, scoped to this filter instance:
/// two `ContentFilter`s evaluated against the same graph never see each
/// other's cached verdicts, and a fresh filter starts with an empty cache.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    /// Case-insensitive substring match against an object's display name.
    pub name_contains: Option<String>,
    /// Exact GUID match.
    pub guid: Option<Guid>,
    /// Inclusive UID range.
    pub uid_range: Option<(u32, u32)>,
    /// Inclusive data-id range.
    pub data_id_range: Option<(u32, u32)>,
    /// Exact type-index match.
    pub type_id: Option<ContentTypeId>,

    object_match_cache: RefCell<HashMap<u32, bool>>,
    namespace_match_cache: RefCell<HashMap<u32, bool>>,
}

impl ContentFilter {
    fn is_empty(&self) -> bool {
        self.name_contains.is_none()
            && self.guid.is_none()
            && self.uid_range.is_none()
            && self.data_id_range.is_none()
            && self.type_id.is_none()
    }
}

impl ContentGraph {
    pub(crate) fn new() -> Self {
        ContentGraph::default()
    }

    /// Looks up an object by its unique GUID.
    pub fn get_object_by_guid(&self, guid: &Guid) -> Option<&ContentObject> {
        self.by_guid.get(guid).map(|id| &self.objects[id.0 as usize])
    }

    /// Looks up an object by its resolved `(file, offset)` payload location.
    pub fn get_object_by_data_ptr(&self, file: u32, offset: u32) -> Option<&ContentObject> {
        self.by_data_ptr
            .get(&(file, offset))
            .map(|id| &self.objects[id.0 as usize])
    }

    /// Looks up every object sharing a short display name.
    pub fn get_objects_by_name(&self, name: &str) -> &[ContentObjectId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the object identified by `id`.
    pub fn object(&self, id: ContentObjectId) -> &ContentObject {
        &self.objects[id.0 as usize]
    }

    /// Returns the namespace identified by `id`.
    pub fn namespace(&self, id: ContentNamespaceId) -> &ContentNamespace {
        &self.namespaces[id.0 as usize]
    }

    /// Returns the type identified by `id`.
    pub fn content_type(&self, id: ContentTypeId) -> &ContentType {
        &self.types[id.0 as usize]
    }

    /// Returns a mutable reference to the type identified by `id`, for
    /// callers (the symbol-engine crate) seeding schema fields onto a
    /// freshly-registered type.
    pub fn content_type_mut(&mut self, id: ContentTypeId) -> &mut ContentType {
        &mut self.types[id.0 as usize]
    }

    /// The single namespace with no parent.
    pub fn root_namespace(&self) -> Option<&ContentNamespace> {
        self.namespaces.iter().find(|ns| ns.parent.is_none())
    }

    /// Appends a fresh, empty type to the arena and returns its id.
    pub fn register_type(&mut self) -> ContentTypeId {
        let id = ContentTypeId(self.types.len() as u32);
        self.types.push(ContentType::new(id));
        id
    }

    pub(crate) fn register_namespace(
        &mut self,
        domain: crate::types::NamespaceDomain,
        name: String,
        parent: Option<ContentNamespaceId>,
    ) -> ContentNamespaceId {
        let id = ContentNamespaceId(self.namespaces.len() as u32);
        self.namespaces
            .push(ContentNamespace::new(id, domain, name.clone(), parent));
        self.by_namespace_name.entry(name).or_default().push(id);
        if let Some(parent) = parent {
            self.namespaces[parent.0 as usize].children.push(id);
        }
        id
    }

    pub(crate) fn register_object(
        &mut self,
        type_id: ContentTypeId,
        data: crate::ids::AbsoluteRef,
        guid: Option<Guid>,
    ) -> Result<ContentObjectId, LoaderError> {
        let id = ContentObjectId(self.objects.len() as u32);
        if let Some(guid) = guid {
            if self.by_guid.contains_key(&guid) {
                return Err(LoaderError::DuplicateIdentity { guid });
            }
            self.by_guid.insert(guid, id);
        }
        self.by_data_ptr.insert((data.file.0, data.offset), id);
        let mut object = ContentObject::new(id, type_id, data);
        object.guid = guid;
        self.objects.push(object);
        self.types[type_id.0 as usize].objects.push(id);
        Ok(id)
    }

    pub(crate) fn set_name_overlay(&mut self, object: ContentObjectId, name: ContentName) {
        if !name.short_name.is_empty() {
            self.by_name
                .entry(name.short_name.clone())
                .or_default()
                .push(object);
        }
        self.objects[object.0 as usize].name_overlay = Some(name);
    }

    /// Computes each object's lazily-bound payload length.
    ///
    /// Clamps to the nearest known pointer-referent within the same file if
    /// one is recorded, else falls back to `boundaries`' next-entry offset
    /// for that file, else a single byte.
    pub(crate) fn finalize(&mut self, boundaries: &HashMap<u32, Vec<u32>>) {
        let mut sorted_ptrs: HashMap<u32, Vec<u32>> = HashMap::new();
        for object in &self.objects {
            sorted_ptrs
                .entry(object.data.file.0)
                .or_default()
                .push(object.data.offset);
        }
        for offsets in sorted_ptrs.values_mut() {
            offsets.sort_unstable();
            offsets.dedup();
        }

        for object in &mut self.objects {
            let file = object.data.file.0;
            let start = object.data.offset;
            let next_ptr = sorted_ptrs
                .get(&file)
                .and_then(|offsets| offsets.iter().find(|&&o| o > start).copied());
            let next_boundary = boundaries
                .get(&file)
                .and_then(|bounds| bounds.iter().filter(|&&b| b > start).min().copied());
            let end = match (next_ptr, next_boundary) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => start + 1,
            };
            object.data_len = Some(end.saturating_sub(start).max(1));
        }
    }

    /// Resolves an object's display name via the priority chain documented
    /// on this type: user overrides, then a name-overlay, then a stable
    /// fallback identifier.
    ///
    /// Name-field-path traversal (the highest-priority source, when a type
    /// declares one) is layered on top of this by the symbol-engine crate,
    /// which has the `StructLayout` information this crate does not.
    pub fn get_display_name(
        &self,
        object: ContentObjectId,
        overrides: &dyn DisplayNameOverrides,
    ) -> String {
        let obj = self.object(object);
        if let Some(guid) = &obj.guid {
            if let Some(name) = overrides.override_for(guid) {
                return name;
            }
        }
        if let Some(overlay) = &obj.name_overlay {
            if !overlay.short_name.is_empty() {
                return overlay.short_name.clone();
            }
        }
        if let Some(data_id) = obj.data_id {
            return FallbackName::TypeAndDataId(
                reliquary_common::fallback_id(obj.type_id.0, data_id),
            )
            .to_string();
        }
        if let Some(uid) = obj.uid {
            return FallbackName::Uid(uid).to_string();
        }
        if let Some(guid) = obj.guid {
            return FallbackName::Guid(guid).to_string();
        }
        FallbackName::ArenaIndex(object).to_string()
    }

    fn object_matches_self(&self, object: &ContentObject, filter: &ContentFilter) -> bool {
        if let Some(wanted) = &filter.guid {
            if object.guid.as_ref() != Some(wanted) {
                return false;
            }
        }
        if let Some((lo, hi)) = filter.uid_range {
            match object.uid {
                Some(uid) if uid >= lo && uid <= hi => {}
                _ => return false,
            }
        }
        if let Some((lo, hi)) = filter.data_id_range {
            match object.data_id {
                Some(id) if id >= lo && id <= hi => {}
                _ => return false,
            }
        }
        if let Some(type_id) = filter.type_id {
            if object.type_id != type_id {
                return false;
            }
        }
        if let Some(needle) = &filter.name_contains {
            let name = self.get_display_name(object.index(), &NoOverrides);
            if !name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }

    /// Evaluates `filter` against an object, memoising the result in
    /// `filter`'s own cache.
    ///
    /// A match is true if the object itself satisfies every present
    /// criterion, or if any of its nested children match.
    pub fn matches_filter(&self, object: ContentObjectId, filter: &ContentFilter) -> bool {
        if filter.is_empty() {
            return true;
        }
        if let Some(&cached) = filter.object_match_cache.borrow().get(&object.0) {
            return cached;
        }
        let obj = self.object(object);
        let direct = self.object_matches_self(obj, filter);
        let result = direct
            || obj
                .children
                .iter()
                .any(|&child| self.matches_filter(child, filter));
        filter.object_match_cache.borrow_mut().insert(object.0, result);
        result
    }

    /// Evaluates `filter` against a namespace: matches if any direct entry
    /// or child namespace matches, memoised in `filter`'s own cache the same
    /// way as object matches.
    pub fn namespace_matches_filter(
        &self,
        namespace: ContentNamespaceId,
        filter: &ContentFilter,
    ) -> bool {
        if filter.is_empty() {
            return true;
        }
        if let Some(&cached) = filter.namespace_match_cache.borrow().get(&namespace.0) {
            return cached;
        }
        let ns = self.namespace(namespace);
        let result = ns
            .entries
            .iter()
            .any(|&obj| self.matches_filter(obj, filter))
            || ns
                .children
                .iter()
                .any(|&child| self.namespace_matches_filter(child, filter));
        filter
            .namespace_match_cache
            .borrow_mut()
            .insert(namespace.0, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AbsoluteRef, FileIndex};
    use crate::types::NamespaceDomain;

    fn guid(n: u32) -> Guid {
        Guid::from_bytes([
            (n >> 24) as u8,
            (n >> 16) as u8,
            (n >> 8) as u8,
            n as u8,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ])
    }

    #[test]
    fn test_register_object_and_lookup() {
        let mut graph = ContentGraph::new();
        let ty = graph.register_type();
        let data = AbsoluteRef {
            file: FileIndex(0),
            offset: 16,
        };
        let id = graph.register_object(ty, data, Some(guid(1))).unwrap();
        assert_eq!(graph.get_object_by_guid(&guid(1)).unwrap().index(), id);
        assert_eq!(graph.get_object_by_data_ptr(0, 16).unwrap().index(), id);
    }

    #[test]
    fn test_duplicate_guid_is_fatal() {
        let mut graph = ContentGraph::new();
        let ty = graph.register_type();
        let data_a = AbsoluteRef {
            file: FileIndex(0),
            offset: 0,
        };
        let data_b = AbsoluteRef {
            file: FileIndex(0),
            offset: 8,
        };
        graph.register_object(ty, data_a, Some(guid(5))).unwrap();
        let err = graph.register_object(ty, data_b, Some(guid(5))).unwrap_err();
        assert!(matches!(err, LoaderError::DuplicateIdentity { .. }));
    }

    #[test]
    fn test_display_name_fallback_chain() {
        let mut graph = ContentGraph::new();
        let ty = graph.register_type();
        let data = AbsoluteRef {
            file: FileIndex(0),
            offset: 0,
        };
        let id = graph.register_object(ty, data, None).unwrap();
        graph.objects[id.0 as usize].uid = Some(42);
        let name = graph.get_display_name(id, &NoOverrides);
        assert_eq!(name, "<UID: 0x0000002A>");
    }

    #[test]
    fn test_display_name_overlay_wins_over_fallback() {
        let mut graph = ContentGraph::new();
        let ty = graph.register_type();
        let data = AbsoluteRef {
            file: FileIndex(0),
            offset: 0,
        };
        let id = graph.register_object(ty, data, None).unwrap();
        graph.set_name_overlay(
            id,
            ContentName {
                short_name: "Sword".into(),
                full_name: "Weapons.Sword".into(),
            },
        );
        assert_eq!(graph.get_display_name(id, &NoOverrides), "Sword");
    }

    #[test]
    fn test_finalize_clamps_to_next_pointer() {
        let mut graph = ContentGraph::new();
        let ty = graph.register_type();
        let a = graph
            .register_object(
                ty,
                AbsoluteRef {
                    file: FileIndex(0),
                    offset: 0,
                },
                None,
            )
            .unwrap();
        graph
            .register_object(
                ty,
                AbsoluteRef {
                    file: FileIndex(0),
                    offset: 32,
                },
                None,
            )
            .unwrap();
        graph.finalize(&HashMap::new());
        assert_eq!(graph.object(a).data_len, Some(32));
    }

    #[test]
    fn test_matches_filter_checks_descendants() {
        let mut graph = ContentGraph::new();
        let ty = graph.register_type();
        let parent = graph
            .register_object(
                ty,
                AbsoluteRef {
                    file: FileIndex(0),
                    offset: 0,
                },
                None,
            )
            .unwrap();
        let child = graph
            .register_object(
                ty,
                AbsoluteRef {
                    file: FileIndex(0),
                    offset: 8,
                },
                Some(guid(9)),
            )
            .unwrap();
        graph.objects[parent.0 as usize].children.push(child);
        graph.finalize(&HashMap::new());
        let filter = ContentFilter {
            guid: Some(guid(9)),
            ..Default::default()
        };
        assert!(graph.matches_filter(parent, &filter));
        assert!(!graph.matches_filter(
            parent,
            &ContentFilter {
                guid: Some(guid(404)),
                ..Default::default()
            }
        ));
    }

    #[test]
    fn test_independent_filters_do_not_share_cached_verdicts() {
        let mut graph = ContentGraph::new();
        let ty = graph.register_type();
        let object = graph
            .register_object(
                ty,
                AbsoluteRef {
                    file: FileIndex(0),
                    offset: 0,
                },
                Some(guid(1)),
            )
            .unwrap();
        graph.finalize(&HashMap::new());

        let matching = ContentFilter {
            guid: Some(guid(1)),
            ..Default::default()
        };
        let non_matching = ContentFilter {
            guid: Some(guid(2)),
            ..Default::default()
        };
        // Evaluate the non-matching filter first so a graph-global cache
        // keyed only on object id would poison the matching filter's result.
        assert!(!graph.matches_filter(object, &non_matching));
        assert!(graph.matches_filter(object, &matching));
        // Re-checking confirms each filter's own cache, not a shared one.
        assert!(!graph.matches_filter(object, &non_matching));
    }

    #[test]
    fn test_root_namespace_lookup() {
        let mut graph = ContentGraph::new();
        let root = graph.register_namespace(NamespaceDomain::Root, "root".into(), None);
        graph.register_namespace(NamespaceDomain::Items, "Items".into(), Some(root));
        assert_eq!(graph.root_namespace().unwrap().index(), root);
    }
}
