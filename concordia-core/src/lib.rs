//! Shared primitives for the Concordia expression-concordance workspace.
//!
//! `concordia-core` provides the foundation that the other Concordia crates
//! build on:
//!
//! - **Error types** — [`ConcordiaError`] and [`Result`] for structured error handling
//! - **Traits** — [`Summarizable`] for stage log summaries

pub mod error;
pub mod traits;

pub use error::{ConcordiaError, Result};
pub use traits::*;
