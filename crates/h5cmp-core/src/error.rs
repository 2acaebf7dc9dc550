//! Structural errors raised while loading or assembling a mesh.
//!
//! A structural error means the input could not be interpreted as a mesh at
//! all. It is distinct from a comparison mismatch, which is a successful
//! comparison with a negative verdict (see [`crate::diff::Verdict`]).

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh loading and assembly.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that abort a comparison run.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HDF5 error: {0}")]
    Hdf5(String),

    /// The file format was requested but support was not compiled in.
    #[error("{0} support is not available (rebuild with the `{0}` feature)")]
    BackendUnavailable(&'static str),

    #[error("missing member: {path}")]
    MissingMember { path: String },

    #[error("{path} is not a group")]
    NotAGroup { path: String },

    #[error("{path} is not a dataset")]
    NotADataset { path: String },

    /// A dataset's element count does not match its declared shape.
    #[error("dataset {path}: shape {shape:?} needs {expected} values, found {found}")]
    DatasetSize {
        path: String,
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },

    #[error("dataset {path}: expected {expected} dimensions, found shape {shape:?}")]
    Rank {
        path: String,
        expected: usize,
        shape: Vec<usize>,
    },

    #[error("invalid connectivity in {path}: {message}")]
    InvalidConnectivity { path: String, message: String },

    #[error("connectivity index {index} out of range for {num_points} points")]
    IndexOutOfRange { index: usize, num_points: usize },

    #[error("mesh has no blocks")]
    EmptyMesh,

    /// Blocks or field chunks whose trailing shapes cannot be concatenated.
    #[error("cannot concatenate {what}: shape {existing:?} vs {incoming:?}")]
    Incompatible {
        what: String,
        existing: Vec<usize>,
        incoming: Vec<usize>,
    },

    #[error("field {name} has {found} values in {side} mesh, expected {expected}")]
    FieldLength {
        name: String,
        side: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("field {name} has shape {first:?} in first mesh and {second:?} in second")]
    FieldShape {
        name: String,
        first: Vec<usize>,
        second: Vec<usize>,
    },
}

impl MeshError {
    pub(crate) fn missing(path: impl Into<String>) -> Self {
        MeshError::MissingMember { path: path.into() }
    }

    /// Qualify a member lookup error with the path of the parent group.
    pub(crate) fn within(self, parent: &str) -> Self {
        match self {
            MeshError::MissingMember { path } => MeshError::MissingMember {
                path: format!("{parent}/{path}"),
            },
            MeshError::NotAGroup { path } => MeshError::NotAGroup {
                path: format!("{parent}/{path}"),
            },
            MeshError::NotADataset { path } => MeshError::NotADataset {
                path: format!("{parent}/{path}"),
            },
            other => other,
        }
    }
}

#[cfg(feature = "hdf5")]
impl From<hdf5::Error> for MeshError {
    fn from(e: hdf5::Error) -> Self {
        MeshError::Hdf5(e.to_string())
    }
}
