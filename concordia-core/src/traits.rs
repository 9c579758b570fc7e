//! Traits shared across the Concordia crates.

/// One-line, human-readable description of a result, used in log output.
///
/// Implemented by the matrices and tables each pipeline stage produces, so a
/// stage can report what it built without knowing the concrete type.
pub trait Summarizable {
    fn summary(&self) -> String;
}
