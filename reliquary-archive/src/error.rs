use thiserror::Error;

/// Errors produced while parsing a pack file or traversing it through a layout.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    /// The buffer is shorter than a single [`PackHeader`](crate::raw::PackHeader).
    #[error("pack file header is truncated")]
    HeaderTooSmall,
    /// The magic bytes do not match [`PACK_MAGIC`](crate::raw::PACK_MAGIC).
    #[error("not a pack file")]
    BadHeader,
    /// The magic bytes are the byte-swapped form of the expected magic.
    #[error("pack file has mismatched endianness")]
    WrongEndianness,
    /// A chunk's declared payload length runs past the end of the buffer.
    #[error("chunk `{tag}` payload is truncated")]
    TruncatedChunk {
        /// The four-character chunk tag.
        tag: String,
    },
    /// No schema is registered for the given `(tag, version)` pair.
    #[error("no layout registered for chunk `{tag}` version {version}")]
    UnknownChunkVersion {
        /// The four-character chunk tag.
        tag: String,
        /// The chunk's declared format version.
        version: u16,
    },
    /// A traversal path named a field that does not exist in the layout.
    #[error("field path `{0}` not found")]
    FieldPathNotFound(String),
    /// A traversal path expected a different [`UnderlyingKind`](crate::UnderlyingKind).
    #[error("type mismatch at field `{field}`: expected {expected}")]
    TypeMismatch {
        /// The field path where the mismatch occurred.
        field: String,
        /// The kind that was expected at this position.
        expected: &'static str,
    },
    /// The requested file could not be read from the archive.
    #[error("archive I/O error")]
    Io(#[from] std::io::Error),
}
