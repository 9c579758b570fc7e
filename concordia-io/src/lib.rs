//! File input and output for the Concordia workspace.
//!
//! - **Tables** — tab-delimited quantification tables with header-pattern
//!   column resolution ([`read_quant_table`], [`build_matrices_from_files`])
//! - **Reports** — pair detail CSV, group audit lists, TSV matrix exports and
//!   comparison panel summaries

pub mod report;
pub mod table;

pub use report::{
    ensure_output_dir, write_details, write_group_audit, write_matrix, write_pairwise_matrices,
    write_panels,
};
pub use table::{build_matrices_from_files, read_datasets, read_quant_table, DatasetSource};
