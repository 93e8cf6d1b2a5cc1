//! The content graph: loads parsed content-pack files into a typed, indexed
//! object graph.
//!
//! [`ContentLoader::load`] runs the loader's three-plus-one-stage pipeline
//! (gather pointers, create objects and resolve fix-ups, replay tracked
//! references, then a tolerant pass over every observed pointer) and hands
//! back a populated [`ContentGraph`], which owns the arena of
//! [`ContentObject`]s and [`ContentNamespace`]s plus its lookup indices.

#![warn(missing_docs)]

mod error;
mod graph;
mod ids;
mod loader;
mod types;

pub use crate::error::LoaderError;
pub use crate::graph::{ContentFilter, ContentGraph, DisplayNameOverrides, FallbackName, NoOverrides};
pub use crate::ids::{AbsoluteRef, ContentNamespaceId, ContentObjectId, ContentTypeId, FileIndex};
pub use crate::loader::{ContentLoader, RawEntry, RawFile, RawFixupTarget, RawNamespace, RawTypeInfo};
pub use crate::types::{
    ContentName, ContentNamespace, ContentObject, ContentType, NamespaceDomain, ReferenceKind,
};
