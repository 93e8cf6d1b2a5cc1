//! Parsing of the game's chunked pack-file container and the schema-driven
//! traversal used to interpret a chunk's payload.
//!
//! This crate defines the thin [`ArchiveReader`] boundary the engine needs
//! from the archive container (left as an external collaborator), the
//! [`PackFile`]/[`Chunk`] zero-copy parser for the chunked format every pack
//! file shares, and the [`LayoutRegistry`]/[`Cursor`] pair that walks a
//! chunk's bytes according to a caller-supplied schema.
//!
//! Higher-level interpretation — the content graph, the fix-up resolution
//! pipeline, the user-authored symbol schemas — lives in the `reliquary-graph`
//! and `reliquary-symbols` crates, which are built on top of this one.

#![warn(missing_docs)]

mod error;
mod layout;
mod pack;
pub mod raw;
mod reader;

pub use crate::error::ArchiveError;
pub use crate::layout::{Cursor, CountWidth, LayoutField, LayoutRegistry, LayoutType, UnderlyingKind};
pub use crate::pack::{Chunk, ChunkIter, PackFile};
pub use crate::reader::{ArchiveFileRecord, ArchiveReader, MftEntry};
