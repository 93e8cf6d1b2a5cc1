//! The closed set of primitive symbol types, and the schema types
//! (`Symbol`, `StructLayout`, `Enum`, `Condition`, `TypeInfo`) a traversal
//! is driven by.

use std::collections::BTreeMap;

/// A scalar numeric kind, shared by [`SymbolType::Int`]/[`SymbolType::UInt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    fn byte_size(self) -> u32 {
        match self {
            IntWidth::W8 => 1,
            IntWidth::W16 => 2,
            IntWidth::W32 => 4,
            IntWidth::W64 => 8,
        }
    }
}

/// The number of components in a [`SymbolType::Point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointArity {
    Two,
    Three,
}

/// A per-symbol channel ordering for [`SymbolType::Color`] rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSwizzle {
    Rgba,
    Bgra,
    Argb,
}

/// The builtin, closed set of primitive interpretations a [`Symbol`] can
/// have. Registered by name in on-disk schemas; an unrecognized name
/// surfaces as [`crate::SymbolError::UnknownSymbolType`].
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolType {
    Int(IntWidth),
    UInt(IntWidth),
    Float,
    Double,
    /// A fixed/variable inline byte string, or (if `pointer`) a pointer to one.
    String { pointer: bool },
    /// As [`SymbolType::String`], but UTF-16.
    WString { pointer: bool },
    Guid,
    /// A 6-character packed alphabetic token.
    Token32,
    /// A 12-character packed alphabetic token.
    Token64,
    /// A `u32` index into the string pack.
    StringId,
    /// A `u32` index into the archive's file table.
    FileId,
    Color(ColorSwizzle),
    Point { element: Box<SymbolType>, arity: PointArity },
    RawPointer { element: Box<SymbolType> },
    /// A `u64` payload pointer that must resolve to a known content object.
    ContentPointer,
    Array { element: Box<SymbolType> },
    /// A `(size, pointer)` pair whose element type is opaque to the schema.
    ArrayContent,
    /// A tagged value: a game-content-type code, up to 3 scalars, and an
    /// optional GUID.
    ParamValue,
    /// A named [`SymbolType::ParamValue`].
    ParamDeclare,
}

impl SymbolType {
    /// The raw, unaligned byte size of a value of this type.
    pub fn byte_size(&self) -> u32 {
        match self {
            SymbolType::Int(w) | SymbolType::UInt(w) => w.byte_size(),
            SymbolType::Float => 4,
            SymbolType::Double => 8,
            SymbolType::String { pointer: true } => 8,
            SymbolType::String { pointer: false } => 1,
            SymbolType::WString { pointer: true } => 8,
            SymbolType::WString { pointer: false } => 2,
            SymbolType::Guid => 16,
            SymbolType::Token32 => 4,
            SymbolType::Token64 => 8,
            SymbolType::StringId => 4,
            SymbolType::FileId => 4,
            SymbolType::Color(_) => 4,
            SymbolType::Point { element, arity } => {
                element.byte_size() * if matches!(arity, PointArity::Two) { 2 } else { 3 }
            }
            SymbolType::RawPointer { .. } => 8,
            SymbolType::ContentPointer => 8,
            SymbolType::Array { .. } => 8,
            SymbolType::ArrayContent => 12,
            SymbolType::ParamValue => 32,
            SymbolType::ParamDeclare => 36,
        }
    }

    /// The name this type is registered under in on-disk schemas.
    pub fn name(&self) -> &'static str {
        match self {
            SymbolType::Int(IntWidth::W8) => "int8",
            SymbolType::Int(IntWidth::W16) => "int16",
            SymbolType::Int(IntWidth::W32) => "int32",
            SymbolType::Int(IntWidth::W64) => "int64",
            SymbolType::UInt(IntWidth::W8) => "uint8",
            SymbolType::UInt(IntWidth::W16) => "uint16",
            SymbolType::UInt(IntWidth::W32) => "uint32",
            SymbolType::UInt(IntWidth::W64) => "uint64",
            SymbolType::Float => "float",
            SymbolType::Double => "double",
            SymbolType::String { pointer: false } => "String",
            SymbolType::String { pointer: true } => "String*",
            SymbolType::WString { pointer: false } => "WString",
            SymbolType::WString { pointer: true } => "WString*",
            SymbolType::Guid => "GUID",
            SymbolType::Token32 => "Token32",
            SymbolType::Token64 => "Token64",
            SymbolType::StringId => "StringID",
            SymbolType::FileId => "FileID",
            SymbolType::Color(_) => "Color",
            SymbolType::Point { arity: PointArity::Two, .. } => "Point2",
            SymbolType::Point { arity: PointArity::Three, .. } => "Point3",
            SymbolType::RawPointer { .. } => "RawPointer",
            SymbolType::ContentPointer => "ContentPointer",
            SymbolType::Array { .. } => "Array",
            SymbolType::ArrayContent => "ArrayContent",
            SymbolType::ParamValue => "ParamValue",
            SymbolType::ParamDeclare => "ParamDeclare",
        }
    }
}

/// A predicate gating whether a [`Symbol`] is active at a given offset,
/// evaluated against a named sibling field in the same layout frame.
#[derive(Debug, Clone)]
pub struct Condition {
    /// The name of the sibling field whose value is tested.
    pub sibling_field: String,
    /// The comparator to apply.
    pub comparator: Comparator,
    /// The value the sibling is compared against.
    pub value: i64,
}

/// A condition comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Non-zero bitwise AND: any of `value`'s bits are set in the sibling.
    AnyBits,
    /// Zero bitwise AND: none of `value`'s bits are set in the sibling.
    NoBits,
}

impl Comparator {
    /// Evaluates this comparator given the sibling's projected value.
    pub fn evaluate(self, sibling_value: i64, value: i64) -> bool {
        match self {
            Comparator::Eq => sibling_value == value,
            Comparator::Ne => sibling_value != value,
            Comparator::Lt => sibling_value < value,
            Comparator::Le => sibling_value <= value,
            Comparator::Gt => sibling_value > value,
            Comparator::Ge => sibling_value >= value,
            Comparator::AnyBits => (sibling_value & value) != 0,
            Comparator::NoBits => (sibling_value & value) == 0,
        }
    }
}

/// A named enumeration used to render an integer symbol's value as text.
#[derive(Debug, Clone, Default)]
pub struct Enum {
    /// The enum's shared name, if registered for reuse across symbols.
    pub shared_name: Option<String>,
    /// Whether this enum decomposes as independent bit flags.
    pub flags: bool,
    /// Known values, in declaration order.
    pub values: Vec<(u64, String)>,
}

impl Enum {
    /// Renders `value`: a flags enum decomposes into known bit names
    /// (descending) joined by `" | "` with any leftover bits rendered as
    /// a trailing hex literal; a non-flags enum resolves an exact match
    /// or falls back to the raw integer with a marker.
    pub fn render(&self, value: u64) -> String {
        if self.flags {
            let mut parts = Vec::new();
            let mut remaining = value;
            let mut sorted: Vec<&(u64, String)> = self.values.iter().collect();
            sorted.sort_by(|a, b| b.0.cmp(&a.0));
            for (bits, name) in sorted {
                if *bits != 0 && (remaining & bits) == *bits {
                    parts.push(name.clone());
                    remaining &= !bits;
                }
            }
            if remaining != 0 {
                parts.push(format!("{remaining:#X}"));
            }
            if parts.is_empty() {
                "0".to_string()
            } else {
                parts.join(" | ")
            }
        } else {
            match self.values.iter().find(|(bits, _)| *bits == value) {
                Some((_, name)) => name.clone(),
                None => format!("{value} <enum-not-found>"),
            }
        }
    }
}

/// One entry in a [`StructLayout`]: how to interpret a range of bytes.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// The field's name.
    pub name: String,
    /// The field's primitive interpretation.
    pub symbol_type: SymbolType,
    /// For pointer/array types, the layout of the pointed-to/elements, if
    /// an inline (not shared-by-name) layout was authored.
    pub element_layout: Option<StructLayout>,
    /// As `element_layout`, but referencing a layout registered elsewhere
    /// by name; a lookup failure degrades to `element_layout`.
    pub shared_element_type_name: Option<String>,
    /// Overrides the type's default alignment for this field, if present.
    pub alignment_override: Option<u32>,
    /// An inline enum overlay for rendering this field's value.
    pub enum_overlay: Option<Enum>,
    /// As `enum_overlay`, but referencing an enum registered elsewhere by
    /// name; a lookup failure degrades to `enum_overlay`.
    pub shared_enum_name: Option<String>,
    /// Gates whether this symbol is active at its offset.
    pub condition: Option<Condition>,
    /// Whether this field is surfaced in table/grid views.
    pub table_flag: bool,
    /// UI hint: whether this field's children start collapsed.
    pub folded: bool,
    /// Element-size hint for `ArrayContent`, whose element type is opaque.
    pub element_size_hint: Option<u32>,
    /// Set for engine-synthesized entries (GUID/UID/DataID/Name overlays),
    /// never user-authored and never persisted over a user edit.
    pub auto_generated: bool,
}

impl Symbol {
    /// A minimal, non-conditional, non-auto-generated symbol with defaults
    /// for every optional field.
    pub fn new(name: impl Into<String>, symbol_type: SymbolType) -> Self {
        Symbol {
            name: name.into(),
            symbol_type,
            element_layout: None,
            shared_element_type_name: None,
            alignment_override: None,
            enum_overlay: None,
            shared_enum_name: None,
            condition: None,
            table_flag: false,
            folded: false,
            element_size_hint: None,
            auto_generated: false,
        }
    }

    /// This symbol's default alignment: its raw size, or an override.
    pub fn alignment(&self) -> u32 {
        self.alignment_override
            .unwrap_or_else(|| self.symbol_type.byte_size().max(1))
    }

    /// The aligned size of this symbol: `ceil(size / alignment) * alignment`.
    pub fn aligned_size(&self) -> u32 {
        let size = self.symbol_type.byte_size();
        let align = self.alignment();
        ((size + align - 1) / align) * align
    }
}

/// An ordered multimap `offset -> Symbol`, describing how to interpret one
/// type's payload bytes. A `BTreeMap<u32, Vec<Symbol>>` rather than a plain
/// map: conditional overlays legitimately share an offset, and traversal
/// must walk offsets in ascending order.
#[derive(Debug, Clone, Default)]
pub struct StructLayout {
    entries: BTreeMap<u32, Vec<Symbol>>,
}

impl StructLayout {
    /// An empty layout.
    pub fn new() -> Self {
        StructLayout::default()
    }

    /// Inserts `symbol` at `offset`, appended after any existing entries
    /// already registered there.
    pub fn insert(&mut self, offset: u32, symbol: Symbol) {
        self.entries.entry(offset).or_default().push(symbol);
    }

    /// Iterates `(offset, symbols-at-offset)` pairs in ascending offset order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Symbol])> {
        self.entries.iter().map(|(&offset, symbols)| (offset, symbols.as_slice()))
    }

    /// Finds the first symbol named `name`, regardless of offset.
    pub fn field_named(&self, name: &str) -> Option<(u32, &Symbol)> {
        self.entries.iter().find_map(|(&offset, symbols)| {
            symbols.iter().find(|s| s.name == name).map(|s| (offset, s))
        })
    }
}

/// Per-game-type schema metadata driving display-name/icon/map resolution
/// and the struct layout traversal.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// The type's user-facing name.
    pub name: String,
    /// Free-form author notes.
    pub notes: String,
    /// The byte distinguishing this type's datalink variant, if any.
    pub datalink_type_byte: Option<u8>,
    /// The struct layout traversal is driven by.
    pub struct_layout: StructLayout,
    /// Arrow-delimited field paths tried in order to compute an object's
    /// display name.
    pub name_field_paths: Vec<String>,
    /// Arrow-delimited field paths tried in order to compute an object's icon.
    pub icon_field_paths: Vec<String>,
    /// Arrow-delimited field paths tried in order to compute an object's
    /// containing map.
    pub map_field_paths: Vec<String>,
    /// Sample GUIDs of objects of this type, for author reference.
    pub example_guids: Vec<reliquary_common::Guid>,
    /// Schema version tag.
    pub version_tag: String,
}

impl TypeInfo {
    /// A new `TypeInfo` with an empty layout and no field-path hints.
    pub fn new(name: impl Into<String>) -> Self {
        TypeInfo {
            name: name.into(),
            notes: String::new(),
            datalink_type_byte: None,
            struct_layout: StructLayout::new(),
            name_field_paths: Vec::new(),
            icon_field_paths: Vec::new(),
            map_field_paths: Vec::new(),
            example_guids: Vec::new(),
            version_tag: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_size_rounds_up() {
        let mut symbol = Symbol::new("flag", SymbolType::UInt(IntWidth::W8));
        symbol.alignment_override = Some(4);
        assert_eq!(symbol.aligned_size(), 4);
    }

    #[test]
    fn test_condition_comparators() {
        assert!(Comparator::AnyBits.evaluate(0b0110, 0b0100));
        assert!(!Comparator::AnyBits.evaluate(0b0110, 0b1000));
        assert!(Comparator::NoBits.evaluate(0b0110, 0b1000));
        assert!(Comparator::Ge.evaluate(5, 5));
    }

    #[test]
    fn test_enum_render_flags_with_leftover() {
        let e = Enum {
            shared_name: None,
            flags: true,
            values: vec![(0x1, "A".into()), (0x2, "B".into()), (0x4, "C".into())],
        };
        assert_eq!(e.render(0x5), "A | C");
        assert_eq!(e.render(0x9), "A | 0x8");
    }

    #[test]
    fn test_enum_render_non_flags_not_found() {
        let e = Enum {
            shared_name: None,
            flags: false,
            values: vec![(1, "One".into())],
        };
        assert_eq!(e.render(1), "One");
        assert_eq!(e.render(2), "2 <enum-not-found>");
    }

    #[test]
    fn test_struct_layout_preserves_insertion_order_per_offset() {
        let mut layout = StructLayout::new();
        layout.insert(0, Symbol::new("a", SymbolType::UInt(IntWidth::W32)));
        layout.insert(0, Symbol::new("b", SymbolType::UInt(IntWidth::W32)));
        let (_, symbols) = layout.iter().next().unwrap();
        assert_eq!(symbols[0].name, "a");
        assert_eq!(symbols[1].name, "b");
    }
}
