//! Stable arena indices used throughout the content graph.
//!
//! Objects and namespaces live in a single append-only arena owned by
//! [`crate::ContentGraph`]; every cross-reference is one of these small
//! `Copy` handles rather than a pointer or `Rc`, the same "central table,
//! `u32` handle" shape used for cross-table references in binary cache
//! formats this crate's traversal style is grounded on.

/// Index of a [`crate::ContentObject`] in its owning [`crate::ContentGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentObjectId(pub u32);

/// Index of a [`crate::ContentNamespace`] in its owning [`crate::ContentGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentNamespaceId(pub u32);

/// Index of a [`crate::ContentType`] in its owning [`crate::ContentGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentTypeId(pub u32);

/// Index of a source content-pack file within one [`crate::ContentLoader::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileIndex(pub u32);

/// A resolved pointer into a content-pack file's payload: `(file, offset)`.
///
/// This is the offset-based stand-in for a raw in-memory pointer: "fix-up
/// resolution" computes one of these for every fix-up target, and
/// "dereferencing" later means slicing the owning file's bytes at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AbsoluteRef {
    /// The file the target object's entry lives in.
    pub file: FileIndex,
    /// The byte offset of the target object's entry within that file's payload.
    pub offset: u32,
}
