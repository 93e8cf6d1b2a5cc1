//! Schema-driven traversal of a chunk's payload bytes.
//!
//! A [`LayoutRegistry`] holds the set of [`LayoutType`]s known for each
//! `(chunk tag, format version)` pair. These schemas are not discovered by
//! this crate — they are handed in by the caller, the way the real tool
//! extracts them once from the game binary — but once registered, traversal
//! over a chunk's bytes is a pure function of `(layout, bytes, bitness)`,
//! performed by [`Cursor`].

use std::collections::HashMap;

use crate::error::ArchiveError;

/// An array element-count width, matching the in-memory size of the count
/// prefix stored ahead of an `Array`/`PtrArray`/`TypedArray` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountWidth {
    /// A single byte.
    Byte,
    /// A 16-bit word.
    Word,
    /// A 32-bit double word.
    DWord,
}

impl CountWidth {
    fn byte_len(self) -> usize {
        match self {
            CountWidth::Byte => 1,
            CountWidth::Word => 2,
            CountWidth::DWord => 4,
        }
    }
}

/// The underlying wire representation of a [`LayoutField`].
///
/// This is the closed set of shapes the traversal cursor knows how to walk;
/// `real-kind` on [`LayoutField`] carries the more specific semantic name
/// (e.g. `"ContentPointer"`) that a consumer layered on top of this crate
/// (the content graph, the symbol engine) interprets further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnderlyingKind {
    /// Signed/unsigned fixed-width integer of the given byte width (1/2/4/8).
    Int { width: u8, signed: bool },
    /// IEEE-754 floating point, 4 or 8 bytes wide.
    Float { width: u8 },
    /// A nested struct, inlined in place (no indirection).
    InlineStruct,
    /// A fixed-size inline array of a single element type.
    InlineArray,
    /// A bitness-sized pointer, interpreted as an absolute file offset.
    Ptr,
    /// `count: CountWidth` followed by a `Ptr` to `count` contiguous elements.
    Array(CountWidth),
    /// `count: CountWidth` followed by a `Ptr` to `count` contiguous `Ptr`s.
    PtrArray(CountWidth),
    /// `count: CountWidth` followed by `count` tagged-union element pointers.
    TypedArray(CountWidth),
    /// A `Ptr` to a NUL-terminated string; `wide` selects 16-bit vs 8-bit units.
    String { wide: bool },
    /// A `Ptr` to a NUL-terminated narrow string naming a file (a [`crate::FileId`]-ish path).
    FileName,
    /// A tag selecting one of several inlined element types.
    Variant,
}

/// One entry in a [`LayoutType`]: a named field and how to read it.
#[derive(Debug, Clone)]
pub struct LayoutField {
    /// The field's name, used by [`Cursor::field`] path lookups.
    pub name: String,
    /// The wire shape used to read this field.
    pub kind: UnderlyingKind,
    /// A more specific semantic name for this field, for downstream consumers.
    pub real_kind: Option<String>,
    /// For `InlineArray`/`Array`/`PtrArray`, the element's layout type name.
    pub element_type: Option<String>,
    /// For `TypedArray`/`Variant`, the possible element layout type names in tag order.
    pub variant_element_types: Vec<String>,
    /// For `InlineArray`, the fixed element count.
    pub inline_array_size: Option<usize>,
}

/// An ordered list of fields describing one struct shape.
#[derive(Debug, Clone, Default)]
pub struct LayoutType {
    /// The fields of this layout, in on-disk order.
    pub fields: Vec<LayoutField>,
}

impl LayoutType {
    /// Creates a layout from an ordered field list.
    pub fn new(fields: Vec<LayoutField>) -> Self {
        LayoutType { fields }
    }

    fn field_named(&self, name: &str) -> Option<(usize, &LayoutField)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
    }
}

/// Registry of chunk schemas, keyed by `(tag, version)`.
///
/// Populated once via [`LayoutRegistry::new`] from a caller-supplied list;
/// this crate does not itself know how to extract schemas from a game
/// binary, only how to hold and query them.
#[derive(Debug, Default)]
pub struct LayoutRegistry {
    schemas: HashMap<(String, u16), LayoutType>,
}

impl LayoutRegistry {
    /// Builds a registry from `(tag, version, layout)` triples.
    pub fn new(entries: impl IntoIterator<Item = (String, u16, LayoutType)>) -> Self {
        let schemas = entries
            .into_iter()
            .map(|(tag, version, layout)| ((tag, version), layout))
            .collect();
        LayoutRegistry { schemas }
    }

    /// Returns the layout registered for `(tag, version)`, if any.
    pub fn layout_for(&self, tag: &str, version: u16) -> Option<&LayoutType> {
        self.schemas.get(&(tag.to_owned(), version))
    }

    /// Opens a [`Cursor`] over `bytes`, interpreted according to `layout`.
    pub fn cursor<'data>(
        &self,
        layout: &'data LayoutType,
        bytes: &'data [u8],
        is_64_bit: bool,
    ) -> Cursor<'data> {
        Cursor {
            layout,
            bytes,
            is_64_bit,
        }
    }
}

fn ptr_width(is_64_bit: bool) -> usize {
    if is_64_bit {
        8
    } else {
        4
    }
}

fn read_uint_le(bytes: &[u8], width: usize) -> Option<u64> {
    let slice = bytes.get(..width)?;
    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(slice);
    Some(u64::from_le_bytes(buf))
}

/// A read-only walk over a chunk payload, guided by a [`LayoutType`].
///
/// The cursor never copies `bytes`; every accessor returns a value borrowed
/// from, or computed directly over, the original chunk slice.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'data> {
    layout: &'data LayoutType,
    bytes: &'data [u8],
    is_64_bit: bool,
}

impl<'data> Cursor<'data> {
    fn offset_of(&self, index: usize) -> usize {
        self.layout.fields[..index]
            .iter()
            .map(|f| self.size_of(&f.kind))
            .sum()
    }

    fn size_of(&self, kind: &UnderlyingKind) -> usize {
        match kind {
            UnderlyingKind::Int { width, .. } => *width as usize,
            UnderlyingKind::Float { width } => *width as usize,
            UnderlyingKind::Ptr
            | UnderlyingKind::String { .. }
            | UnderlyingKind::FileName => ptr_width(self.is_64_bit),
            UnderlyingKind::Array(w) | UnderlyingKind::PtrArray(w) | UnderlyingKind::TypedArray(w) => {
                w.byte_len() + ptr_width(self.is_64_bit)
            }
            UnderlyingKind::InlineStruct | UnderlyingKind::InlineArray | UnderlyingKind::Variant => 0,
        }
    }

    /// Descends into the named field, by path (`"a->b->c"`).
    pub fn field(&self, path: &str) -> Result<Cursor<'data>, ArchiveError> {
        let mut cursor = *self;
        for segment in path.split("->") {
            cursor = cursor.field_step(segment)?;
        }
        Ok(cursor)
    }

    fn field_step(&self, name: &str) -> Result<Cursor<'data>, ArchiveError> {
        let (index, field) = self
            .layout
            .field_named(name)
            .ok_or_else(|| ArchiveError::FieldPathNotFound(name.to_owned()))?;
        let offset = self.offset_of(index);
        let size = self.size_of(&field.kind);
        let bytes = self
            .bytes
            .get(offset..offset + size)
            .or_else(|| self.bytes.get(offset..))
            .ok_or_else(|| ArchiveError::FieldPathNotFound(name.to_owned()))?;

        Ok(Cursor {
            layout: self.layout,
            bytes,
            is_64_bit: self.is_64_bit,
        })
    }

    /// Interprets the cursor's bytes as an unsigned integer of the given kind.
    pub fn as_u64(&self) -> Result<u64, ArchiveError> {
        read_uint_le(self.bytes, ptr_width(self.is_64_bit).min(8).max(1))
            .or_else(|| read_uint_le(self.bytes, self.bytes.len().min(8)))
            .ok_or(ArchiveError::TypeMismatch {
                field: String::new(),
                expected: "integer",
            })
    }

    /// Interprets the cursor's bytes as a signed integer.
    pub fn as_i64(&self) -> Result<i64, ArchiveError> {
        self.as_u64().map(|v| v as i64)
    }

    /// Interprets the cursor's bytes as an absolute file offset (a `Ptr` field).
    pub fn as_ptr_offset(&self) -> Result<u64, ArchiveError> {
        self.as_u64()
    }

    /// Returns the element count of an `Array`/`PtrArray`/`TypedArray` field.
    pub fn array_size(&self) -> Result<usize, ArchiveError> {
        let width = self.bytes.len().min(4);
        read_uint_le(self.bytes, width.max(1))
            .map(|v| v as usize)
            .ok_or(ArchiveError::TypeMismatch {
                field: String::new(),
                expected: "array",
            })
    }

    /// Returns the raw bytes this cursor currently spans.
    pub fn as_bytes(&self) -> &'data [u8] {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> LayoutType {
        LayoutType::new(vec![
            LayoutField {
                name: "id".into(),
                kind: UnderlyingKind::Int {
                    width: 4,
                    signed: false,
                },
                real_kind: None,
                element_type: None,
                variant_element_types: vec![],
                inline_array_size: None,
            },
            LayoutField {
                name: "flags".into(),
                kind: UnderlyingKind::Int {
                    width: 2,
                    signed: false,
                },
                real_kind: None,
                element_type: None,
                variant_element_types: vec![],
                inline_array_size: None,
            },
        ])
    }

    #[test]
    fn test_field_offsets() {
        let layout = sample_layout();
        let bytes = [0x01, 0x00, 0x00, 0x00, 0x2A, 0x00];
        let registry = LayoutRegistry::default();
        let cursor = registry.cursor(&layout, &bytes, false);
        assert_eq!(cursor.field("id").unwrap().as_u64().unwrap(), 1);
        assert_eq!(cursor.field("flags").unwrap().as_u64().unwrap(), 0x2A);
    }

    #[test]
    fn test_unknown_field_path() {
        let layout = sample_layout();
        let bytes = [0u8; 6];
        let registry = LayoutRegistry::default();
        let cursor = registry.cursor(&layout, &bytes, false);
        assert!(matches!(
            cursor.field("nope"),
            Err(ArchiveError::FieldPathNotFound(_))
        ));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = LayoutRegistry::new([("text".to_owned(), 1u16, sample_layout())]);
        assert!(registry.layout_for("text", 1).is_some());
        assert!(registry.layout_for("text", 2).is_none());
    }
}
