//! Regression comparison of mesh datasets written by numerical solvers.
//!
//! Two outputs are equivalent when they describe the same cells, in any
//! storage order, with field values equal up to a fixed absolute tolerance.
//! Provides container loading, mesh assembly, the order-independent
//! comparator and run reporting.

pub mod assemble;
pub mod container;
pub mod diff;
pub mod driver;
pub mod error;
#[cfg(feature = "hdf5")]
pub mod hdf5_source;
pub mod report;
pub mod source;

pub use assemble::{CellArray, FieldMap, construct_cells, construct_fields};
pub use container::{Dataset, Group, Node, Values};
pub use diff::{Mismatch, TOLERANCE, Verdict, compare_meshes};
pub use driver::{CompareConfig, compare_files, run, run_with};
pub use error::{MeshError, MeshResult};
pub use report::{ComparisonOutcome, RunReport};
pub use source::{Format, JsonSource, MeshSource};
