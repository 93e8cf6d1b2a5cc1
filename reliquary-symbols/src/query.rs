//! Path-expression traversal over a [`ContentObject`]'s bytes.
//!
//! [`Query`] is an `Iterator` that owns an explicit stack of [`Frame`]s
//! rather than recursing, so a pointer chain of arbitrary depth can't blow
//! the call stack — the same shape `symbolic-symcache`'s own lookup
//! iterators use for walking nested inline ranges.

use std::collections::HashSet;

use reliquary_archive::ArchiveReader;
use reliquary_graph::{ContentGraph, ContentObjectId};

use crate::error::SymbolError;
use crate::types::{Comparator, StructLayout, Symbol, SymbolType};

/// A resolved value at one traversal step.
#[derive(Debug, Clone)]
pub struct SymbolResult {
    /// The owning object this value was read from.
    pub object: ContentObjectId,
    /// The byte offset within that object's payload.
    pub offset: u32,
    /// The symbol whose interpretation produced this value.
    pub symbol: Symbol,
    /// The extracted, type-projected value.
    pub value: ResolvedValue,
}

/// A symbol's value, projected to a small set of renderable shapes.
#[derive(Debug, Clone)]
pub enum ResolvedValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Guid(reliquary_common::Guid),
    ContentPointer(Option<ContentObjectId>),
    Bytes(Vec<u8>),
}

impl ResolvedValue {
    /// Projects this value to `i64` for condition evaluation: integers and
    /// flags project directly; strings project to their hash; content
    /// pointers project to the target's raw arena index.
    pub fn project_for_condition(&self) -> i64 {
        match self {
            ResolvedValue::Int(v) => *v,
            ResolvedValue::UInt(v) => *v as i64,
            ResolvedValue::Float(v) => *v as i64,
            ResolvedValue::Text(s) => string_hash(s) as i64,
            ResolvedValue::Guid(g) => g.data1 as i64,
            ResolvedValue::ContentPointer(Some(id)) => id.0 as i64,
            ResolvedValue::ContentPointer(None) => -1,
            ResolvedValue::Bytes(_) => 0,
        }
    }
}

fn string_hash(s: &str) -> u64 {
    let mut hash: u64 = 0xCBF2_9CE4_8422_2325;
    for byte in s.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

/// One level of the traversal stack.
struct Frame<'a> {
    object: ContentObjectId,
    layout: &'a StructLayout,
    /// Byte offset of this frame's struct within the owning object's payload.
    base_offset: u32,
    /// Entries still to visit in this frame, innermost-first (we pop from
    /// the back, so this is stored in reverse traversal order).
    pending: Vec<(u32, &'a Symbol)>,
    /// Offsets that have already yielded an active symbol in this frame.
    /// `pending` visits a given offset's overlays in insertion order, so the
    /// first active one recorded here suppresses the rest.
    emitted_offsets: HashSet<u32>,
}

/// A path-expression traversal over one object's bytes.
pub struct Query<'a> {
    graph: &'a ContentGraph,
    reader: &'a dyn ArchiveReader,
    type_layouts: Box<dyn Fn(ContentObjectId) -> Option<&'a StructLayout> + 'a>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Query<'a> {
    /// Starts a traversal of `object`'s type layout, as resolved by
    /// `type_layouts`.
    pub fn new(
        graph: &'a ContentGraph,
        reader: &'a dyn ArchiveReader,
        type_layouts: impl Fn(ContentObjectId) -> Option<&'a StructLayout> + 'a,
        object: ContentObjectId,
    ) -> Self {
        let type_layouts: Box<dyn Fn(ContentObjectId) -> Option<&'a StructLayout> + 'a> =
            Box::new(type_layouts);
        let mut query = Query {
            graph,
            reader,
            type_layouts,
            stack: Vec::new(),
        };
        if let Some(layout) = (query.type_layouts)(object) {
            query.push_frame(object, layout, 0);
        }
        query
    }

    fn push_frame(&mut self, object: ContentObjectId, layout: &'a StructLayout, base_offset: u32) {
        let mut pending: Vec<(u32, &'a Symbol)> = layout
            .iter()
            .flat_map(|(offset, symbols)| symbols.iter().map(move |s| (offset, s)))
            .collect();
        pending.reverse();
        self.stack.push(Frame {
            object,
            layout,
            base_offset,
            pending,
            emitted_offsets: HashSet::new(),
        });
    }

    fn read_bytes(&self, object: ContentObjectId, offset: u32, len: u32) -> Option<Vec<u8>> {
        let obj = self.graph.object(object);
        let data = self.reader.get_file(reliquary_common::FileId(obj.data.file.0));
        let start = (obj.data.offset + offset) as usize;
        let end = start + len as usize;
        data.get(start..end).map(|s| s.to_vec())
    }

    fn condition_holds(&self, frame: &Frame<'a>, symbol: &Symbol) -> Result<bool, SymbolError> {
        let Some(cond) = &symbol.condition else {
            return Ok(true);
        };
        let Some((sib_offset, sib_symbol)) = frame.layout.field_named(&cond.sibling_field) else {
            return Err(SymbolError::ConditionSiblingMissing(cond.sibling_field.clone()));
        };
        let Some(bytes) = self.read_bytes(frame.object, frame.base_offset + sib_offset, sib_symbol.symbol_type.byte_size()) else {
            return Ok(false);
        };
        let value = extract_scalar(&sib_symbol.symbol_type, &bytes);
        Ok(cond
            .comparator
            .evaluate(value.project_for_condition(), cond.value))
    }
}

fn extract_scalar(ty: &SymbolType, bytes: &[u8]) -> ResolvedValue {
    match ty {
        SymbolType::Int(_) => {
            let mut buf = [0u8; 8];
            buf[..bytes.len().min(8)].copy_from_slice(&bytes[..bytes.len().min(8)]);
            let raw = i64::from_le_bytes(buf);
            let shift = 64 - bytes.len().min(8) * 8;
            ResolvedValue::Int((raw << shift) >> shift)
        }
        SymbolType::UInt(_) | SymbolType::StringId | SymbolType::FileId | SymbolType::Token32 | SymbolType::Token64 => {
            let mut buf = [0u8; 8];
            buf[..bytes.len().min(8)].copy_from_slice(&bytes[..bytes.len().min(8)]);
            ResolvedValue::UInt(u64::from_le_bytes(buf))
        }
        SymbolType::Float => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[..4.min(bytes.len())]);
            ResolvedValue::Float(f32::from_le_bytes(buf) as f64)
        }
        SymbolType::Double => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes[..8.min(bytes.len())]);
            ResolvedValue::Float(f64::from_le_bytes(buf))
        }
        SymbolType::Guid => {
            let mut buf = [0u8; 16];
            buf[..bytes.len().min(16)].copy_from_slice(&bytes[..bytes.len().min(16)]);
            ResolvedValue::Guid(reliquary_common::Guid::from_bytes(buf))
        }
        _ => ResolvedValue::Bytes(bytes.to_vec()),
    }
}

impl<'a> Iterator for Query<'a> {
    type Item = Result<SymbolResult, SymbolError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame_idx = self.stack.len().checked_sub(1)?;
            let Some((offset, symbol)) = self.stack[frame_idx].pending.pop() else {
                self.stack.pop();
                if self.stack.is_empty() {
                    return None;
                }
                continue;
            };

            if self.stack[frame_idx].emitted_offsets.contains(&offset) {
                continue;
            }

            let active = match self.condition_holds(&self.stack[frame_idx], symbol) {
                Ok(active) => active,
                Err(err) => return Some(Err(err)),
            };
            if !active {
                continue;
            }
            self.stack[frame_idx].emitted_offsets.insert(offset);

            let object = self.stack[frame_idx].object;
            let base = self.stack[frame_idx].base_offset;
            let abs_offset = base + offset;
            let Some(bytes) = self.read_bytes(object, abs_offset, symbol.symbol_type.byte_size()) else {
                continue;
            };

            let value = match &symbol.symbol_type {
                SymbolType::ContentPointer => {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(&bytes[..8.min(bytes.len())]);
                    let ptr = u64::from_le_bytes(buf);
                    let target = if ptr == 0 {
                        None
                    } else {
                        self.graph.get_object_by_data_ptr((ptr >> 32) as u32, ptr as u32).map(|o| o.index())
                    };
                    if let Some(target_id) = target {
                        if let Some(layout) = (self.type_layouts)(target_id) {
                            self.push_frame(target_id, layout, 0);
                        }
                    }
                    ResolvedValue::ContentPointer(target)
                }
                SymbolType::Guid => {
                    let mut buf = [0u8; 16];
                    buf.copy_from_slice(&bytes[..16.min(bytes.len())]);
                    let guid = reliquary_common::Guid::from_bytes(buf);
                    if let Some(target) = self.graph.get_object_by_guid(&guid) {
                        let target_id = target.index();
                        if let Some(layout) = (self.type_layouts)(target_id) {
                            self.push_frame(target_id, layout, 0);
                        }
                    }
                    ResolvedValue::Guid(guid)
                }
                other => extract_scalar(other, &bytes),
            };

            return Some(Ok(SymbolResult {
                object,
                offset: abs_offset,
                symbol: symbol.clone(),
                value,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use reliquary_archive::{ArchiveFileRecord, MftEntry};
    use reliquary_common::{ByteView, FileId, Guid};
    use reliquary_graph::{ContentLoader, NamespaceDomain, RawEntry, RawFile, RawNamespace, RawTypeInfo};

    use super::*;
    use crate::types::{Condition, IntWidth, Symbol};

    struct FakeReader {
        files: HashMap<u32, Vec<u8>>,
    }

    impl ArchiveReader for FakeReader {
        fn get_file(&self, id: FileId) -> ByteView<'static> {
            match self.files.get(&id.0) {
                Some(bytes) => ByteView::from_vec(bytes.clone()),
                None => ByteView::from_vec(Vec::new()),
            }
        }

        fn get_file_mft_entry(&self, _id: FileId) -> Option<MftEntry> {
            None
        }

        fn get_files(&self) -> Vec<ArchiveFileRecord> {
            Vec::new()
        }
    }

    fn type_info() -> RawTypeInfo {
        RawTypeInfo {
            guid_offset: Some(0),
            uid_offset: None,
            data_id_offset: None,
            name_offset: None,
            track_references: false,
        }
    }

    fn one_object_graph(guid: Guid) -> reliquary_graph::ContentGraph {
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
                guid: Some(guid),
                uid: None,
                data_id: None,
                short_name: None,
                full_name: None,
            }],
            tracked_refs: vec![],
            any_refs: vec![],
            entry_boundaries: vec![],
        };
        ContentLoader::load(&[file]).unwrap()
    }

    #[test]
    fn test_query_yields_scalar_field() {
        let guid = Guid::from_bytes([9; 16]);
        let graph = one_object_graph(guid);
        let object = graph.get_object_by_guid(&guid).unwrap().index();

        let mut layout = StructLayout::new();
        layout.insert(16, Symbol::new("health", SymbolType::Int(IntWidth::W32)));

        let mut payload = vec![0u8; 20];
        payload[16..20].copy_from_slice(&42i32.to_le_bytes());
        let mut files = HashMap::new();
        files.insert(0, payload);
        let reader = FakeReader { files };

        let results: Vec<_> = Query::new(&graph, &reader, |_| Some(&layout), object)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(results.len(), 1);
        match results[0].value {
            ResolvedValue::Int(v) => assert_eq!(v, 42),
            _ => panic!("expected an Int"),
        }
    }

    #[test]
    fn test_query_skips_field_when_condition_fails() {
        let guid = Guid::from_bytes([10; 16]);
        let graph = one_object_graph(guid);
        let object = graph.get_object_by_guid(&guid).unwrap().index();

        let mut layout = StructLayout::new();
        layout.insert(16, Symbol::new("flag", SymbolType::Int(IntWidth::W32)));
        let mut gated = Symbol::new("gated", SymbolType::Int(IntWidth::W32));
        gated.condition = Some(Condition {
            sibling_field: "flag".into(),
            comparator: Comparator::Eq,
            value: 1,
        });
        layout.insert(20, gated);

        let mut payload = vec![0u8; 24];
        payload[16..20].copy_from_slice(&0i32.to_le_bytes());
        payload[20..24].copy_from_slice(&99i32.to_le_bytes());
        let mut files = HashMap::new();
        files.insert(0, payload);
        let reader = FakeReader { files };

        let results: Vec<_> = Query::new(&graph, &reader, |_| Some(&layout), object)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol.name, "flag");
    }

    #[test]
    fn test_query_suppresses_later_overlay_at_same_offset() {
        let guid = Guid::from_bytes([13; 16]);
        let graph = one_object_graph(guid);
        let object = graph.get_object_by_guid(&guid).unwrap().index();

        let mut layout = StructLayout::new();
        layout.insert(16, Symbol::new("flag", SymbolType::Int(IntWidth::W32)));
        // Two unconditional overlays at the same offset: both are active,
        // so only the first-inserted one should surface.
        layout.insert(20, Symbol::new("as_int", SymbolType::Int(IntWidth::W32)));
        layout.insert(20, Symbol::new("as_flags", SymbolType::UInt(IntWidth::W32)));

        let mut payload = vec![0u8; 24];
        payload[16..20].copy_from_slice(&1i32.to_le_bytes());
        payload[20..24].copy_from_slice(&7i32.to_le_bytes());
        let mut files = HashMap::new();
        files.insert(0, payload);
        let reader = FakeReader { files };

        let results: Vec<_> = Query::new(&graph, &reader, |_| Some(&layout), object)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].symbol.name, "as_int");
    }

    #[test]
    fn test_query_recurses_into_content_pointer_target() {
        let parent_guid = Guid::from_bytes([11; 16]);
        let child_guid = Guid::from_bytes([12; 16]);
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
                    guid: Some(parent_guid),
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
                    guid: Some(child_guid),
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
        let parent = graph.get_object_by_guid(&parent_guid).unwrap().index();
        let child = graph.get_object_by_guid(&child_guid).unwrap().index();

        let mut child_layout = StructLayout::new();
        child_layout.insert(16, Symbol::new("name_id", SymbolType::Int(IntWidth::W32)));
        let mut parent_layout = StructLayout::new();
        parent_layout.insert(16, Symbol::new("target", SymbolType::ContentPointer));

        // Both objects live in the same backing file at their declared offsets.
        let mut single_file = vec![0u8; 84];
        single_file[16..24].copy_from_slice(&(64u64).to_le_bytes());
        single_file[64 + 16..64 + 20].copy_from_slice(&7i32.to_le_bytes());
        let mut files = HashMap::new();
        files.insert(0, single_file);
        let reader = FakeReader { files };

        let layouts = |id: ContentObjectId| {
            if id == child {
                Some(&child_layout)
            } else if id == parent {
                Some(&parent_layout)
            } else {
                None
            }
        };
        let results: Vec<_> = Query::new(&graph, &reader, layouts, parent)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(results.len(), 2);
        match results[1].value {
            ResolvedValue::Int(v) => assert_eq!(v, 7),
            _ => panic!("expected recursion into the child layout"),
        }
    }
}
