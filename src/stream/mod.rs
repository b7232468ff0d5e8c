//! # Typed pipelines
//!
//! A [`Pipeline`] is built over a source collection, chains any number of
//! stages and ends with exactly one terminal operation:
//!
//! ```text
//! source → filter → expand → map → sort → limit/skip → terminal
//! ```
//!
//! Every stage is optional. Terminals return `Result` because a pipeline can
//! only be consumed once.
//!
//! ## Sources
//!
//! - [`Pipeline::from_vec`] owns its elements.
//! - [`Pipeline::over`] reads a [`SharedSource`] either as a snapshot taken at
//!   construction or as a live view read when the terminal runs.
//!
//! ## Aggregates
//!
//! [`Pipeline::average`] returns `Option<f64>`: the mean of nothing is absent,
//! not zero. [`AbsentPolicy`] turns that absence into a default or an error
//! when the caller asks for it.
//!
//! ## Grouping vs. partitioning
//!
//! [`Pipeline::group_by`] only contains keys that were observed, so empty
//! input gives an empty map. [`Pipeline::partition_by`] always contains both
//! `true` and `false`, even when one side (or both) is empty.

pub mod collectors;
pub mod pipeline;
pub mod source;

pub use collectors::AbsentPolicy;
pub use pipeline::{Comparator, Pipeline, Predicate};
pub use source::{SharedSource, SourceMode};
