use reliquary_common::Guid;
use thiserror::Error;

/// Errors produced while loading content-pack files into a [`crate::ContentGraph`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoaderError {
    /// Two objects declared the same GUID. Fatal: it would make the
    /// GUID index ambiguous for the rest of the graph's lifetime.
    #[error("duplicate content object GUID {guid}")]
    DuplicateIdentity {
        /// The GUID that was observed twice.
        guid: Guid,
    },
    /// More than one namespace in the root file has no parent.
    #[error("more than one root namespace declared")]
    MultipleRootNamespaces,
    /// No namespace in the root file has a parent, leaving no root.
    #[error("no root namespace declared")]
    MissingRootNamespace,
    /// An entry named a type index outside the registered type table.
    #[error("entry referenced unknown type index {0}")]
    UnknownTypeIndex(u32),
}
