//! A reverse-engineering workbench for packed game content archives.
//!
//! This crate is a thin facade over a handful of independent crates, each
//! responsible for one layer:
//!
//! - [`archive`] — pack-file framing, chunk iteration, field-layout cursors.
//! - [`graph`] — the loaded content graph: typed objects, namespaces,
//!   references, indexed by GUID/pointer/name.
//! - [`symbols`] — path-expression traversal over an object's bytes via a
//!   user- or engine-authored struct layout.
//! - [`strings`] — per-language string decryption and the key store.
//! - [`mangle`] — deterministic name mangling and dictionary demangling.
//! - [`filter`] — per-domain cancellable search/sort job scheduling.
//!
//! [`Engine`] wires these together into the single owning value a
//! long-running session holds, replacing the process-wide globals the
//! system this crate reverse-engineers relies on internally.

#![warn(missing_docs)]

mod config;
mod engine;
mod error;

#[doc(inline)]
pub use reliquary_archive as archive;
#[doc(inline)]
pub use reliquary_common as common;
#[doc(inline)]
pub use reliquary_filter as filter;
#[doc(inline)]
pub use reliquary_graph as graph;
#[doc(inline)]
pub use reliquary_mangle as mangle;
#[doc(inline)]
pub use reliquary_strings as strings;
#[doc(inline)]
pub use reliquary_symbols as symbols;

pub use crate::config::{GameConfig, KeyObservation, KeySource};
pub use crate::engine::{Engine, EngineSchedulers, FilterDomain};
pub use crate::error::EngineError;
