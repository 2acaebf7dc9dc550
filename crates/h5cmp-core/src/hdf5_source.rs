//! HDF5 backend (feature `hdf5`).

use std::path::Path;

use hdf5::types::TypeDescriptor;
use tracing::debug;

use crate::container::{Dataset, Group};
use crate::error::{MeshError, MeshResult};
use crate::source::MeshSource;

/// Reads a group of an HDF5 file recursively into memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Source;

impl MeshSource for Hdf5Source {
    fn load_group(&self, path: &Path, root: &str) -> MeshResult<Group> {
        if !path.exists() {
            return Err(MeshError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = hdf5::File::open(path)?;
        if !file.link_exists(root) {
            return Err(MeshError::missing(root));
        }
        let group = read_group(&file.group(root)?)?;
        debug!(path = %path.display(), members = group.len(), "loaded HDF5 group");
        Ok(group)
    }
}

fn leaf_name(h5_path: &str) -> &str {
    h5_path.rsplit('/').next().unwrap_or(h5_path)
}

fn read_group(group: &hdf5::Group) -> MeshResult<Group> {
    let mut out = Group::new();
    for sub in group.groups()? {
        let name = sub.name();
        out.insert(leaf_name(&name), read_group(&sub)?);
    }
    for ds in group.datasets()? {
        let name = ds.name();
        out.insert(leaf_name(&name), read_dataset(&ds)?);
    }
    Ok(out)
}

fn read_dataset(ds: &hdf5::Dataset) -> MeshResult<Dataset> {
    let shape = ds.shape();
    match ds.dtype()?.to_descriptor()? {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
            Ok(Dataset::int(&shape, ds.read_raw::<i64>()?))
        }
        TypeDescriptor::Float(_) => Ok(Dataset::float(&shape, ds.read_raw::<f64>()?)),
        other => Err(MeshError::Hdf5(format!(
            "dataset {} has unsupported type {other:?}",
            ds.name()
        ))),
    }
}
