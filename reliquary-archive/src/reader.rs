//! The `ArchiveReader` collaborator boundary.
//!
//! This crate does not implement the game's own archive container format —
//! that lives outside the engine's scope. It only defines the trait the
//! engine needs from it: random-access `(FileId) -> bytes`, plus enough
//! metadata to report declared vs. actual sizes.

use reliquary_common::{ByteView, FileId};

/// Metadata about one file as recorded in the archive's master file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MftEntry {
    /// The file's declared (compressed, on-disk) size.
    pub declared_size: u64,
    /// The file's uncompressed size, as recorded by the archive.
    pub uncompressed_size: u64,
}

/// One entry in an archive's top-level file listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFileRecord {
    /// The file's id.
    pub id: FileId,
    /// A human-readable note on where this file came from (a source pack,
    /// a patch delta, etc.), opaque to the engine.
    pub source: String,
}

/// Random-access reader over an opaque archive container.
///
/// Implementations of this trait live outside the workbench core (they
/// depend on the archive's own container format, which is out of scope
/// here); the engine is generic over any `ArchiveReader`.
pub trait ArchiveReader {
    /// Returns the raw bytes of the file named by `id`.
    ///
    /// Returns an empty [`ByteView`] if the file is missing, matching the
    /// archive's own permissive read semantics — a missing file is not an
    /// error at this layer, only further up where its absence matters.
    fn get_file(&self, id: FileId) -> ByteView<'static>;

    /// Returns the master-file-table entry for `id`, if the archive tracks one.
    fn get_file_mft_entry(&self, id: FileId) -> Option<MftEntry>;

    /// Lists every file known to the archive.
    fn get_files(&self) -> Vec<ArchiveFileRecord>;
}
