//! Expression-concordance domain for the Concordia workspace.
//!
//! This crate turns per-method differential expression tables into
//! comparable matrices and correlates methods over user-declared equivalent
//! experiments:
//!
//! - **Conditions** — [`normalize_condition`] maps free-text experiment labels to a canonical form
//! - **Genes** — [`GeneCollapser`] folds isoform identifiers into their family
//! - **Matrices** — [`LabeledMatrix`] with pivots, outer joins and row z-scores
//! - **Building** — [`build_matrices`] produces the wide, paired and long views
//! - **Grouping** — [`GroupSet`] of equivalent `(method, label)` identities
//! - **Concordance** — [`run_concordance`] rebuilds by group and correlates methods
//! - **Panels** — scatter and Bland–Altman summaries against a reference method
//!
//! # Quick start
//!
//! ```
//! use concordia_omics::{build_matrices, BuildOptions, Dataset, QuantRecord};
//!
//! let rnaseq = Dataset::new("RNA-seq", vec![
//!     QuantRecord::new("6h light", "GATA-4_t1", 0.01, 1.5),
//!     QuantRecord::new("6h light", "GATA-4_t2", 0.03, 2.5),
//! ]);
//! let qpcr = Dataset::new("RT-qPCR", vec![
//!     QuantRecord::new("Light, 6 hours", "GATA-4", 0.02, 1.8),
//! ]);
//! let built = build_matrices(&[rnaseq, qpcr], &BuildOptions::default()).unwrap();
//!
//! // Both labels normalize to the same condition; isoforms collapse and average.
//! assert_eq!(built.combined.col_labels(), &["6h light\nRNA-seq", "6h light\nRT-qPCR"]);
//! assert_eq!(built.combined.value(&"GATA-4".to_string(), "6h light\nRNA-seq"), Some(2.0));
//! ```

pub mod builder;
pub mod concordance;
pub mod condition;
pub mod gene;
pub mod grouping;
pub mod matrix;
pub mod observation;
pub mod panels;
pub mod regroup;

pub use builder::{build_long_table, build_matrices, BuildOptions, BuiltMatrices, CollisionPolicy};
pub use concordance::{run_concordance, Concordance};
pub use condition::normalize_condition;
pub use gene::GeneCollapser;
pub use grouping::{EquivalenceGroup, GroupSet};
pub use matrix::{LabeledMatrix, PairedKey};
pub use observation::{Dataset, Identity, LongTable, Observation, ObservedIdentity, QuantRecord};
pub use panels::{panels_for, ComparisonPanel, PanelOutcome};
pub use regroup::GroupedMatrices;
