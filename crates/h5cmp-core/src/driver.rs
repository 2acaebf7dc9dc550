//! Comparison driver: file naming and the sequential, fail-fast run loop.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::diff::{Verdict, compare_meshes};
use crate::error::MeshResult;
use crate::report::{ComparisonOutcome, RunReport};
use crate::source::{Format, MeshSource};

/// Name of the root group holding the mesh in every input file.
pub const MESH_ROOT: &str = "mesh";

/// What to compare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Base name of the first input, without extension.
    pub file1: String,
    /// Base name of the second input, without extension.
    pub file2: String,
    /// Inclusive index range; `None` compares the two base files once.
    pub range: Option<(i64, i64)>,
    pub format: Format,
}

impl CompareConfig {
    pub fn single(file1: impl Into<String>, file2: impl Into<String>, format: Format) -> Self {
        Self {
            file1: file1.into(),
            file2: file2.into(),
            range: None,
            format,
        }
    }

    /// Range mode is only active when both ends are given.
    pub fn with_bounds(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.range = match (start, end) {
            (Some(s), Some(e)) => Some((s, e)),
            (None, None) => None,
            _ => {
                warn!("--start and --end must be given together, comparing base files only");
                None
            }
        };
        self
    }

    /// File pairs to compare, in execution order.
    pub fn pairs(&self) -> Vec<(Option<i64>, PathBuf, PathBuf)> {
        let ext = self.format.extension();
        match self.range {
            Some((start, end)) => {
                if start > end {
                    warn!(start, end, "empty index range, nothing to compare");
                }
                (start..=end)
                    .map(|i| {
                        (
                            Some(i),
                            PathBuf::from(format!("{}{}.{}", self.file1, i, ext)),
                            PathBuf::from(format!("{}{}.{}", self.file2, i, ext)),
                        )
                    })
                    .collect()
            }
            None => vec![(
                None,
                PathBuf::from(format!("{}.{}", self.file1, ext)),
                PathBuf::from(format!("{}.{}", self.file2, ext)),
            )],
        }
    }
}

/// Load the mesh group of both files and compare them.
pub fn compare_files(source: &dyn MeshSource, path1: &Path, path2: &Path) -> MeshResult<Verdict> {
    let mesh1 = source.load_group(path1, MESH_ROOT)?;
    let mesh2 = source.load_group(path2, MESH_ROOT)?;
    compare_meshes(&mesh1, &mesh2)
}

/// Compare every configured pair in order, stopping after the first pair
/// that differs. Structural errors abort the run immediately.
pub fn run(config: &CompareConfig, source: &dyn MeshSource) -> MeshResult<RunReport> {
    run_with(config, source, |_| {})
}

/// Like [`run`], handing each outcome to `on_outcome` as soon as it is
/// recorded, so outcomes before a structural error are still seen.
pub fn run_with(
    config: &CompareConfig,
    source: &dyn MeshSource,
    mut on_outcome: impl FnMut(&ComparisonOutcome),
) -> MeshResult<RunReport> {
    let pairs = config.pairs();
    let mut report = RunReport::new(pairs.len());

    for (index, file1, file2) in pairs {
        info!(file1 = %file1.display(), file2 = %file2.display(), "comparing");
        let verdict = compare_files(source, &file1, &file2)?;
        let same = verdict.is_same();
        let outcome = ComparisonOutcome {
            index,
            file1,
            file2,
            verdict,
        };
        on_outcome(&outcome);
        report.record(outcome);
        if !same {
            break;
        }
    }
    Ok(report)
}
