use thiserror::Error;

/// Errors produced while resolving a path expression against a layout.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SymbolError {
    /// A symbol named a `SymbolType` not in the builtin closed set.
    #[error("unknown symbol type {0:?}")]
    UnknownSymbolType(String),
    /// A path segment did not match any field in the current layout frame.
    #[error("field path segment not found: {0:?}")]
    FieldPathNotFound(String),
    /// A symbol's condition named a sibling field absent from its layout frame.
    #[error("condition sibling field not found: {0:?}")]
    ConditionSiblingMissing(String),
    /// A value's declared type did not match what traversal expected at an offset.
    #[error("type mismatch at offset {offset}: expected {expected}")]
    TypeMismatch {
        /// The expected type name.
        expected: &'static str,
        /// The byte offset at which the mismatch occurred.
        offset: u32,
    },
}
