use thiserror::Error;

/// Errors produced while decoding or looking up strings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StringError {
    /// No string files are registered for the requested language.
    #[error("unknown language {0:?}")]
    UnknownLanguage(String),
    /// `string_id` divides out past the registered file count for its language.
    #[error("string id {0} is out of range")]
    IndexOutOfRange(u32),
    /// The on-disk term sequence referenced a concat target outside the string table.
    #[error("malformed string data at index {0}")]
    Malformed(u32),
}
