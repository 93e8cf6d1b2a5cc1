//! Parsing of the chunked pack-file container (`PackFile`).

use std::mem;

use crate::error::ArchiveError;
use crate::raw::{self, ChunkPreamble, PackHeader, PACK_MAGIC, PACK_MAGIC_FLIPPED};

/// One chunk within a [`PackFile`]: a four-character tag, a format version,
/// and a borrowed slice over its payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'data> {
    tag: [u8; 4],
    version: u16,
    payload: &'data [u8],
}

impl<'data> Chunk<'data> {
    /// The four-character chunk tag, e.g. `"text"`.
    pub fn tag(&self) -> &str {
        std::str::from_utf8(&self.tag).unwrap_or("????")
    }

    /// The chunk's declared format version.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// The raw payload bytes following the chunk preamble.
    pub fn payload(&self) -> &'data [u8] {
        self.payload
    }
}

/// A parsed, zero-copy view over a pack file's header and chunk sequence.
///
/// `PackFile` retains a borrow of the source bytes; chunks are produced
/// lazily by walking the declared preamble/payload lengths rather than
/// copied up front.
#[derive(Debug)]
pub struct PackFile<'data> {
    is_64_bit: bool,
    chunks_start: &'data [u8],
}

impl<'data> PackFile<'data> {
    /// Parses a pack file's header and validates it, without yet walking
    /// the chunk sequence.
    pub fn parse(buf: &'data [u8]) -> Result<Self, ArchiveError> {
        let header_size = mem::size_of::<PackHeader>();
        if buf.len() < header_size {
            return Err(ArchiveError::HeaderTooSmall);
        }

        // SAFETY: we just checked that `buf` is at least `header_size` bytes,
        // and `PackHeader` is a `#[repr(C)]` POD type with no padding gaps
        // relative to its declared byte layout.
        let header = unsafe { &*(buf.as_ptr() as *const PackHeader) };

        if header.magic == PACK_MAGIC_FLIPPED {
            return Err(ArchiveError::WrongEndianness);
        }
        if header.magic != PACK_MAGIC {
            return Err(ArchiveError::BadHeader);
        }
        if header.header_size as usize != header_size {
            return Err(ArchiveError::BadHeader);
        }

        Ok(PackFile {
            is_64_bit: header.is_64_bit != 0,
            chunks_start: &buf[header_size..],
        })
    }

    /// Whether this pack file targets a 64-bit address space.
    ///
    /// Consumed by the [`LayoutRegistry`](crate::LayoutRegistry) to select
    /// pointer width when interpreting `Ptr`-kind fields.
    pub fn is_64_bit(&self) -> bool {
        self.is_64_bit
    }

    /// Returns an iterator over this pack file's chunks, in on-disk order.
    pub fn iter_chunks(&self) -> ChunkIter<'data> {
        ChunkIter {
            remaining: self.chunks_start,
            error: None,
        }
    }

    /// Returns the first chunk matching `tag`, if any.
    ///
    /// Stops at the first parse error encountered while scanning, which the
    /// caller can recover by calling [`PackFile::iter_chunks`] directly.
    pub fn query_chunk(&self, tag: &str) -> Option<Chunk<'data>> {
        self.iter_chunks()
            .filter_map(Result::ok)
            .find(|chunk| chunk.tag() == tag)
    }

    /// Returns the first chunk in the file, if any.
    pub fn first_chunk(&self) -> Option<Result<Chunk<'data>, ArchiveError>> {
        self.iter_chunks().next()
    }
}

/// Iterator over the chunks of a [`PackFile`].
///
/// Each step re-validates that the declared payload length fits in the
/// remaining buffer; a truncated chunk yields one `Err` and ends iteration,
/// since the remainder of the buffer can no longer be reliably framed.
#[derive(Debug)]
pub struct ChunkIter<'data> {
    remaining: &'data [u8],
    error: Option<()>,
}

impl<'data> Iterator for ChunkIter<'data> {
    type Item = Result<Chunk<'data>, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() || self.remaining.is_empty() {
            return None;
        }

        let preamble_size = mem::size_of::<ChunkPreamble>();
        if self.remaining.len() < preamble_size {
            self.error = Some(());
            return Some(Err(ArchiveError::TruncatedChunk {
                tag: "????".to_owned(),
            }));
        }

        // SAFETY: checked above that at least `preamble_size` bytes remain.
        let preamble = unsafe { &*(self.remaining.as_ptr() as *const ChunkPreamble) };
        let payload_len = preamble.payload_len as usize;
        let tag = preamble.tag;
        let version = preamble.version;

        let mut chunk_len = preamble_size + payload_len;
        chunk_len += raw::align_to_eight(chunk_len);

        if self.remaining.len() < chunk_len {
            self.error = Some(());
            let tag_str = std::str::from_utf8(&tag).unwrap_or("????").to_owned();
            return Some(Err(ArchiveError::TruncatedChunk { tag: tag_str }));
        }

        let payload = &self.remaining[preamble_size..preamble_size + payload_len];
        self.remaining = &self.remaining[chunk_len..];

        Some(Ok(Chunk {
            tag,
            version,
            payload,
        }))
    }
}
