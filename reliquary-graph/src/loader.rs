//! The three-(plus-one)-stage loader that turns parsed content-pack files
//! into a populated [`ContentGraph`].

use std::collections::HashMap;

use reliquary_common::Guid;
use tracing::{debug, warn};

use crate::error::LoaderError;
use crate::graph::ContentGraph;
use crate::ids::{AbsoluteRef, ContentNamespaceId, ContentObjectId, ContentTypeId, FileIndex};
use crate::types::{ContentName, NamespaceDomain, ReferenceKind};

/// One content-pack file's already-parsed intermediate form, as produced by
/// `reliquary-archive`'s layout cursors. This crate consumes this shape
/// rather than raw chunk bytes, keeping the fix-up algorithm below decoupled
/// from field-path extraction.
#[derive(Debug, Clone, Default)]
pub struct RawFile {
    /// Per-type overlay descriptors, present only in the root file.
    pub type_infos: Vec<RawTypeInfo>,
    /// Namespace declarations, present only in the root file.
    pub namespaces: Vec<RawNamespace>,
    /// Every object entry declared by this file.
    pub entries: Vec<RawEntry>,
    /// Explicit tracked-reference fix-ups: `(source entry index, target)`.
    pub tracked_refs: Vec<(usize, RawFixupTarget)>,
    /// Every pointer-shaped fix-up seen anywhere in this file's payload,
    /// gathered for the S4 "Any"-reference pass. `(source entry index, target)`.
    pub any_refs: Vec<(usize, RawFixupTarget)>,
    /// Byte offsets at which the file declares a new index entry begins,
    /// used by [`ContentGraph::finalize`] to bound an object's length when
    /// no closer pointer is known.
    pub entry_boundaries: Vec<u32>,
}

/// A per-type overlay descriptor as declared by the root file.
#[derive(Debug, Clone, Default)]
pub struct RawTypeInfo {
    pub guid_offset: Option<u32>,
    pub uid_offset: Option<u32>,
    pub data_id_offset: Option<u32>,
    pub name_offset: Option<u32>,
    pub track_references: bool,
}

/// A namespace declaration as read from the root file.
#[derive(Debug, Clone)]
pub struct RawNamespace {
    pub domain: NamespaceDomain,
    pub name: String,
    /// Index into the owning `RawFile::namespaces` of the parent, or `None`
    /// for the root namespace.
    pub parent: Option<usize>,
}

/// An index entry describing one object.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub type_index: u32,
    /// Index into the root file's `namespaces`, if directly namespaced.
    pub namespace_index: Option<usize>,
    /// A fix-up target naming this object's containing root object, if nested.
    pub root: Option<RawFixupTarget>,
    pub offset: u32,
    pub guid: Option<Guid>,
    pub uid: Option<u32>,
    pub data_id: Option<u32>,
    pub short_name: Option<String>,
    pub full_name: Option<String>,
}

/// A not-yet-resolved fix-up target, as produced by the archive's cursor
/// layer before this crate turns it into an [`AbsoluteRef`].
#[derive(Debug, Clone, Copy)]
pub enum RawFixupTarget {
    /// An absolute offset within the same file's payload.
    Local(u32),
    /// An offset paired with the index of the file it targets, within the
    /// loader's input file list.
    External { file_index: usize, offset: u32 },
}

/// Loads content-pack files into a fresh [`ContentGraph`].
///
/// Expects `files[0]` to be the root file: the only file carrying type and
/// namespace declarations, per the on-disk format.
pub struct ContentLoader;

impl ContentLoader {
    /// Runs the full S1-S4 pipeline over `files`, returning the populated
    /// graph. Per-entry inconsistencies are logged and the entry skipped;
    /// only a duplicate GUID aborts the load entirely.
    pub fn load(files: &[RawFile]) -> Result<ContentGraph, LoaderError> {
        let mut graph = ContentGraph::new();

        // S1: gather every object's declared data pointer, keyed the same
        // way S2 will register objects, so external-root and any-ref
        // fix-ups can be checked against a complete oracle before any
        // object exists yet.
        let mut known_pointers: HashMap<(u32, u32), (usize, usize)> = HashMap::new();
        for (file_index, file) in files.iter().enumerate() {
            for (entry_index, entry) in file.entries.iter().enumerate() {
                known_pointers.insert((file_index as u32, entry.offset), (file_index, entry_index));
            }
        }

        // S2.6-7: type infos and namespaces, root file only.
        let mut type_ids = Vec::new();
        if let Some(root) = files.first() {
            for info in &root.type_infos {
                let id = graph.register_type();
                let t = &mut graph.types[id.0 as usize];
                t.guid_offset = info.guid_offset;
                t.uid_offset = info.uid_offset;
                t.data_id_offset = info.data_id_offset;
                t.name_offset = info.name_offset;
                t.track_references = info.track_references;
                type_ids.push(id);
            }

            let mut namespace_ids: Vec<Option<ContentNamespaceId>> =
                vec![None; root.namespaces.len()];
            let mut root_count = 0;
            // Parents are always declared before children in a well-formed
            // file, so a single forward pass suffices; a namespace whose
            // parent hasn't been assigned yet is treated as a second root
            // candidate and rejected below.
            for (index, raw_ns) in root.namespaces.iter().enumerate() {
                let parent_id = match raw_ns.parent {
                    None => {
                        root_count += 1;
                        None
                    }
                    Some(parent_index) => match namespace_ids.get(parent_index).copied().flatten() {
                        Some(id) => Some(id),
                        None => {
                            warn!(parent_index, "namespace parent not yet registered, skipping");
                            continue;
                        }
                    },
                };
                let id = graph.register_namespace(raw_ns.domain, raw_ns.name.clone(), parent_id);
                namespace_ids[index] = Some(id);
            }
            if root_count > 1 {
                return Err(LoaderError::MultipleRootNamespaces);
            }
            if root_count == 0 {
                return Err(LoaderError::MissingRootNamespace);
            }

            // S2.8 pass 2a: construct every object first, without wiring
            // root/namespace attachment yet, since a root reference may
            // name an entry that appears later in creation order.
            let mut entry_object_ids: Vec<Vec<Option<ContentObjectId>>> =
                files.iter().map(|f| vec![None; f.entries.len()]).collect();

            for (file_index, file) in files.iter().enumerate() {
                for (entry_index, entry) in file.entries.iter().enumerate() {
                    let Some(&type_id) = type_ids.get(entry.type_index as usize) else {
                        warn!(type_index = entry.type_index, "unknown type index, skipping entry");
                        continue;
                    };
                    let data = AbsoluteRef {
                        file: FileIndex(file_index as u32),
                        offset: entry.offset,
                    };
                    let object_id = match graph.register_object(type_id, data, entry.guid) {
                        Ok(id) => id,
                        Err(err @ LoaderError::DuplicateIdentity { .. }) => return Err(err),
                        Err(err) => {
                            warn!(%err, "skipping entry");
                            continue;
                        }
                    };
                    {
                        let obj = &mut graph.objects[object_id.0 as usize];
                        obj.uid = entry.uid;
                        obj.data_id = entry.data_id;
                    }
                    if let (Some(short), Some(full)) = (&entry.short_name, &entry.full_name) {
                        graph.set_name_overlay(
                            object_id,
                            ContentName {
                                short_name: short.clone(),
                                full_name: full.clone(),
                            },
                        );
                    }
                    entry_object_ids[file_index][entry_index] = Some(object_id);
                }
            }

            // S2.8 pass 2b: wire namespace/root attachment now that every
            // object exists.
            for (file_index, file) in files.iter().enumerate() {
                for (entry_index, entry) in file.entries.iter().enumerate() {
                    let Some(object_id) = entry_object_ids[file_index][entry_index] else {
                        continue;
                    };
                    match entry.root {
                        None => {
                            let Some(ns_index) = entry.namespace_index else {
                                debug!(entry_index, "entry has neither root nor namespace");
                                continue;
                            };
                            let Some(ns_id) = namespace_ids.get(ns_index).copied().flatten() else {
                                warn!(ns_index, "unknown namespace index, skipping entry");
                                continue;
                            };
                            graph.objects[object_id.0 as usize].namespace = Some(ns_id);
                            graph.namespaces[ns_id.0 as usize].entries.push(object_id);
                        }
                        Some(target) => {
                            let resolved = resolve_root_target(&known_pointers, &entry_object_ids, file_index, target);
                            match resolved {
                                Some(root_id) => {
                                    graph.objects[object_id.0 as usize].root = Some(root_id);
                                    graph.objects[root_id.0 as usize].children.push(object_id);
                                    graph.objects[root_id.0 as usize]
                                        .add_outgoing(object_id, ReferenceKind::Root);
                                    graph.objects[object_id.0 as usize]
                                        .add_incoming(root_id, ReferenceKind::Root);
                                }
                                None => {
                                    warn!(entry_index, "root reference did not resolve, skipping attachment");
                                }
                            }
                        }
                    }
                }
            }

            // S3: tracked references.
            for (file_index, file) in files.iter().enumerate() {
                for (source_entry, target) in &file.tracked_refs {
                    let Some(source_id) = entry_object_ids[file_index]
                        .get(*source_entry)
                        .copied()
                        .flatten()
                    else {
                        continue;
                    };
                    let Some(target_id) =
                        resolve_root_target(&known_pointers, &entry_object_ids, file_index, *target)
                    else {
                        warn!(file_index, source_entry, "tracked reference target not found");
                        continue;
                    };
                    graph.objects[source_id.0 as usize]
                        .add_outgoing(target_id, ReferenceKind::Tracked);
                    graph.objects[target_id.0 as usize]
                        .add_incoming(source_id, ReferenceKind::Tracked);
                }
            }

            // S4: weak "Any" references, tolerant of unresolved endpoints.
            for (file_index, file) in files.iter().enumerate() {
                for (source_entry, target) in &file.any_refs {
                    let Some(source_id) = entry_object_ids[file_index]
                        .get(*source_entry)
                        .copied()
                        .flatten()
                    else {
                        continue;
                    };
                    let Some(target_id) =
                        resolve_root_target(&known_pointers, &entry_object_ids, file_index, *target)
                    else {
                        continue;
                    };
                    graph.objects[source_id.0 as usize].add_outgoing(target_id, ReferenceKind::Any);
                    graph.objects[target_id.0 as usize].add_incoming(source_id, ReferenceKind::Any);
                }
            }

            let mut boundaries: HashMap<u32, Vec<u32>> = HashMap::new();
            for (file_index, file) in files.iter().enumerate() {
                boundaries.insert(file_index as u32, file.entry_boundaries.clone());
            }
            graph.finalize(&boundaries);
        }

        Ok(graph)
    }
}

fn resolve_root_target(
    known_pointers: &HashMap<(u32, u32), (usize, usize)>,
    entry_object_ids: &[Vec<Option<ContentObjectId>>],
    source_file_index: usize,
    target: RawFixupTarget,
) -> Option<ContentObjectId> {
    let (file_index, offset) = match target {
        RawFixupTarget::Local(offset) => (source_file_index, offset),
        RawFixupTarget::External { file_index, offset } => (file_index, offset),
    };
    let (owning_file, entry_index) = known_pointers.get(&(file_index as u32, offset)).copied()?;
    entry_object_ids.get(owning_file)?.get(entry_index).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_info() -> RawTypeInfo {
        RawTypeInfo {
            guid_offset: Some(0),
            uid_offset: Some(16),
            data_id_offset: Some(20),
            name_offset: None,
            track_references: true,
        }
    }

    fn guid(n: u8) -> Guid {
        Guid::from_bytes([n; 16])
    }

    #[test]
    fn test_load_single_file_with_namespace() {
        let file = RawFile {
            type_infos: vec![type_info()],
            namespaces: vec![RawNamespace {
                domain: NamespaceDomain::Root,
                name: "root".into(),
                parent: None,
            }],
            entries: vec![RawEntry {
                type_index: 0,
                namespace_index: Some(0),
                root: None,
                offset: 0,
                guid: Some(guid(1)),
                uid: Some(1),
                data_id: Some(100),
                short_name: None,
                full_name: None,
            }],
            tracked_refs: vec![],
            any_refs: vec![],
            entry_boundaries: vec![],
        };
        let graph = ContentLoader::load(&[file]).unwrap();
        assert!(graph.get_object_by_guid(&guid(1)).is_some());
        assert_eq!(graph.root_namespace().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_load_rejects_duplicate_guid() {
        let file = RawFile {
            type_infos: vec![type_info()],
            namespaces: vec![RawNamespace {
                domain: NamespaceDomain::Root,
                name: "root".into(),
                parent: None,
            }],
            entries: vec![
                RawEntry {
                    type_index: 0,
                    namespace_index: Some(0),
                    root: None,
                    offset: 0,
                    guid: Some(guid(2)),
                    uid: None,
                    data_id: None,
                    short_name: None,
                    full_name: None,
                },
                RawEntry {
                    type_index: 0,
                    namespace_index: Some(0),
                    root: None,
                    offset: 32,
                    guid: Some(guid(2)),
                    uid: None,
                    data_id: None,
                    short_name: None,
                    full_name: None,
                },
            ],
            tracked_refs: vec![],
            any_refs: vec![],
            entry_boundaries: vec![],
        };
        let err = ContentLoader::load(&[file]).unwrap_err();
        assert!(matches!(err, LoaderError::DuplicateIdentity { .. }));
    }

    #[test]
    fn test_load_rejects_multiple_roots() {
        let file = RawFile {
            type_infos: vec![type_info()],
            namespaces: vec![
                RawNamespace {
                    domain: NamespaceDomain::Root,
                    name: "root1".into(),
                    parent: None,
                },
                RawNamespace {
                    domain: NamespaceDomain::Root,
                    name: "root2".into(),
                    parent: None,
                },
            ],
            entries: vec![],
            tracked_refs: vec![],
            any_refs: vec![],
            entry_boundaries: vec![],
        };
        let err = ContentLoader::load(&[file]).unwrap_err();
        assert!(matches!(err, LoaderError::MultipleRootNamespaces));
    }

    #[test]
    fn test_nested_root_reference_wires_child() {
        let file = RawFile {
            type_infos: vec![type_info()],
            namespaces: vec![RawNamespace {
                domain: NamespaceDomain::Root,
                name: "root".into(),
                parent: None,
            }],
            entries: vec![
                RawEntry {
                    type_index: 0,
                    namespace_index: Some(0),
                    root: None,
                    offset: 0,
                    guid: Some(guid(3)),
                    uid: None,
                    data_id: None,
                    short_name: None,
                    full_name: None,
                },
                RawEntry {
                    type_index: 0,
                    namespace_index: None,
                    root: Some(RawFixupTarget::Local(0)),
                    offset: 64,
                    guid: Some(guid(4)),
                    uid: None,
                    data_id: None,
                    short_name: None,
                    full_name: None,
                },
            ],
            tracked_refs: vec![],
            any_refs: vec![],
            entry_boundaries: vec![],
        };
        let graph = ContentLoader::load(&[file]).unwrap();
        let parent = graph.get_object_by_guid(&guid(3)).unwrap();
        let child = graph.get_object_by_guid(&guid(4)).unwrap();
        assert_eq!(parent.children, vec![child.index()]);
        assert_eq!(child.root, Some(parent.index()));
    }

    #[test]
    fn test_tracked_reference_recorded_both_ways() {
        let file = RawFile {
            type_infos: vec![type_info()],
            namespaces: vec![RawNamespace {
                domain: NamespaceDomain::Root,
                name: "root".into(),
                parent: None,
            }],
            entries: vec![
                RawEntry {
                    type_index: 0,
                    namespace_index: Some(0),
                    root: None,
                    offset: 0,
                    guid: Some(guid(5)),
                    uid: None,
                    data_id: None,
                    short_name: None,
                    full_name: None,
                },
                RawEntry {
                    type_index: 0,
                    namespace_index: Some(0),
                    root: None,
                    offset: 64,
                    guid: Some(guid(6)),
                    uid: None,
                    data_id: None,
                    short_name: None,
                    full_name: None,
                },
            ],
            tracked_refs: vec![(0, RawFixupTarget::Local(64))],
            any_refs: vec![],
            entry_boundaries: vec![],
        };
        let graph = ContentLoader::load(&[file]).unwrap();
        let source = graph.get_object_by_guid(&guid(5)).unwrap();
        let target = graph.get_object_by_guid(&guid(6)).unwrap();
        assert!(source
            .outgoing
            .contains(&(target.index(), ReferenceKind::Tracked)));
        assert!(target
            .incoming
            .contains(&(source.index(), ReferenceKind::Tracked)));
    }

    #[test]
    fn test_any_reference_tolerates_missing_endpoint() {
        let file = RawFile {
            type_infos: vec![type_info()],
            namespaces: vec![RawNamespace {
                domain: NamespaceDomain::Root,
                name: "root".into(),
                parent: None,
            }],
            entries: vec![RawEntry {
                type_index: 0,
                namespace_index: Some(0),
                root: None,
                offset: 0,
                guid: Some(guid(7)),
                uid: None,
                data_id: None,
                short_name: None,
                full_name: None,
            }],
            tracked_refs: vec![],
            any_refs: vec![(0, RawFixupTarget::Local(9999))],
            entry_boundaries: vec![],
        };
        let graph = ContentLoader::load(&[file]).unwrap();
        let source = graph.get_object_by_guid(&guid(7)).unwrap();
        assert!(source.outgoing.is_empty());
    }
}
