//! Deterministic name mangling and dictionary-attack demangling.
//!
//! [`mangle_full_name`] is the one-way function the archive's own tooling
//! uses to turn a display name into its on-disk form. Since it cannot be
//! inverted directly, [`bruteforce_demangle`] recovers likely display names
//! by mangling dictionary-derived candidates and keeping the ones that land
//! on a wanted on-disk value.

#![warn(missing_docs)]

mod dictionary;
mod mangle;

pub use crate::dictionary::{bruteforce_demangle, DemangleHit, DictionaryOptions, JoinStyle};
pub use crate::mangle::{mangle_full_name, mangle_segment, MANGLE_SEGMENT_LEN};
