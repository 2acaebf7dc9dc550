//! File backends that materialize a container group into memory.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::container::Group;
use crate::error::{MeshError, MeshResult};

/// Something that can read the named root group of a file.
///
/// Implementations must release the file before returning.
pub trait MeshSource {
    fn load_group(&self, path: &Path, root: &str) -> MeshResult<Group>;
}

/// On-disk container format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Hdf5,
    Json,
}

impl Format {
    /// Extension appended to base file names (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            Format::Hdf5 => "h5",
            Format::Json => "json",
        }
    }

    /// Backend reading this format.
    pub fn source(self) -> MeshResult<Box<dyn MeshSource>> {
        match self {
            Format::Json => Ok(Box::new(JsonSource)),
            #[cfg(feature = "hdf5")]
            Format::Hdf5 => Ok(Box::new(crate::hdf5_source::Hdf5Source)),
            #[cfg(not(feature = "hdf5"))]
            Format::Hdf5 => Err(MeshError::BackendUnavailable("hdf5")),
        }
    }
}

impl core::fmt::Display for Format {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Reads the serde representation of [`Group`] from a JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSource;

impl MeshSource for JsonSource {
    fn load_group(&self, path: &Path, root: &str) -> MeshResult<Group> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MeshError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => MeshError::Io(e),
        })?;
        let document: Group = serde_json::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), members = document.len(), "loaded JSON container");
        document.into_group(root)
    }
}

/// Write a container document in the layout [`JsonSource`] reads.
pub fn save_json(document: &Group, path: impl AsRef<Path>) -> MeshResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Dataset;

    #[test]
    fn test_extension() {
        assert_eq!(Format::Hdf5.extension(), "h5");
        assert_eq!(Format::Json.to_string(), "json");
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn test_hdf5_is_default_backend() {
        assert_eq!(Format::default(), Format::Hdf5);
        let dir = tempfile::tempdir().unwrap();
        let err = Format::Hdf5
            .source()
            .unwrap()
            .load_group(&dir.path().join("absent.h5"), "mesh")
            .unwrap_err();
        assert!(matches!(err, MeshError::FileNotFound { .. }));
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn test_hdf5_unavailable_without_feature() {
        assert!(matches!(
            Format::Hdf5.source(),
            Err(MeshError::BackendUnavailable("hdf5"))
        ));
    }

    #[test]
    fn test_json_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.json");
        let mesh = Group::new().with("points", Dataset::float(&[1, 2], vec![0.5, 0.25]));
        save_json(&Group::new().with("mesh", mesh.clone()), &path).unwrap();

        let loaded = JsonSource.load_group(&path, "mesh").unwrap();
        assert_eq!(loaded, mesh);
    }

    #[test]
    fn test_json_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonSource
            .load_group(&dir.path().join("absent.json"), "mesh")
            .unwrap_err();
        assert!(matches!(err, MeshError::FileNotFound { .. }));
    }

    #[test]
    fn test_json_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        save_json(&Group::new().with("grid", Group::new()), &path).unwrap();
        let err = JsonSource.load_group(&path, "mesh").unwrap_err();
        assert!(matches!(err, MeshError::MissingMember { .. }));
    }
}
