//! The symbol engine: interprets a [`reliquary_graph::ContentObject`]'s
//! bytes according to a user- or engine-authored [`StructLayout`], following
//! `->`-delimited field paths and pointer chains.

#![warn(missing_docs)]

mod autogen;
mod error;
mod query;
mod types;

pub use crate::autogen::seed_autogenerated_layout;
pub use crate::error::SymbolError;
pub use crate::query::{Query, ResolvedValue, SymbolResult};
pub use crate::types::{
    ColorSwizzle, Comparator, Condition, Enum, IntWidth, PointArity, StructLayout, Symbol,
    SymbolType, TypeInfo,
};
