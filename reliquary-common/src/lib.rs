//! Common functionality shared by the archive, graph and symbol crates.
//!
//! This crate exposes a small set of building blocks:
//!
//!  - [`ByteView`]: uniform access to binary data, whether memory-mapped or owned in memory.
//!  - [`SelfCell`]: self-referential storage for a byte buffer and a borrowed parse of it.
//!  - [`FileId`], [`Guid`], [`ScopedId`]: the identity spaces used across the engine.
//!
//! This module is part of the `reliquary` workbench.
//!
//! # Features
//!
//! - `serde` (optional): implements `serde::Serialize`/`Deserialize` for
//!   [`Guid`], encoded as its dashed hex text.

#![warn(missing_docs)]

mod byteview;
mod cell;
mod ids;

pub use crate::byteview::*;
pub use crate::cell::*;
pub use crate::ids::*;
