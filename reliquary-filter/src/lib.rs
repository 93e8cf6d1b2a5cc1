//! Per-domain filter/search job scheduling.
//!
//! One [`FilterScheduler`] exists per list-view domain (Files, Strings,
//! Content, Conversations, Events). Submitting a job cancels whichever job
//! is currently running for that domain, then evaluates the new predicate
//! on a small fixed worker pool; [`parallel_filter`] and [`complex_sort`]
//! are the building blocks a domain's job closure composes.

#![warn(missing_docs)]

mod scheduler;
mod sort;

pub use crate::scheduler::{FilterScheduler, JobHandle, Progress, POLL_INTERVAL};
pub use crate::sort::{complex_sort, parallel_filter};
