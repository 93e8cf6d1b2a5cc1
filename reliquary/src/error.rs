use thiserror::Error;

/// The umbrella error type returned by [`crate::Engine`]'s convenience
/// methods.
///
/// This crate stays a thin facade: it defines no error *kinds* of its own,
/// only aggregates each sub-crate's via `#[from]`, the same shape
/// `symbolic`'s own umbrella crate uses over `symbolic-debuginfo`'s and
/// `symbolic-symcache`'s error types.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// A pack-file structural error (`reliquary-archive`).
    #[error(transparent)]
    Archive(#[from] reliquary_archive::ArchiveError),
    /// A content-graph load error (`reliquary-graph`).
    #[error(transparent)]
    Loader(#[from] reliquary_graph::LoaderError),
    /// A symbol traversal error (`reliquary-symbols`).
    #[error(transparent)]
    Symbol(#[from] reliquary_symbols::SymbolError),
    /// A string resolution error (`reliquary-strings`).
    #[error(transparent)]
    String(#[from] reliquary_strings::StringError),
}
