//! In-memory hierarchical container.
//!
//! A loaded input file is materialized once into a tree of [`Group`]s and
//! [`Dataset`]s, independently of the backend it came from. The assembler
//! only ever sees this tree, never an open file handle.

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};

/// A node of the container tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

impl From<Dataset> for Node {
    fn from(dataset: Dataset) -> Self {
        Node::Dataset(dataset)
    }
}

/// Named children, iterated in lexicographic name order (the HDF5 default
/// link order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub members: BTreeMap<String, Node>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<Node>) {
        self.members.insert(name.into(), node.into());
    }

    /// Builder form of [`Group::insert`].
    pub fn with(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.insert(name, node);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn member(&self, name: &str) -> MeshResult<&Node> {
        self.members.get(name).ok_or_else(|| MeshError::missing(name))
    }

    pub fn group(&self, name: &str) -> MeshResult<&Group> {
        match self.member(name)? {
            Node::Group(g) => Ok(g),
            Node::Dataset(_) => Err(MeshError::NotAGroup { path: name.into() }),
        }
    }

    pub fn dataset(&self, name: &str) -> MeshResult<&Dataset> {
        match self.member(name)? {
            Node::Dataset(d) => Ok(d),
            Node::Group(_) => Err(MeshError::NotADataset { path: name.into() }),
        }
    }

    /// Detach a child group, consuming the parent.
    pub fn into_group(mut self, name: &str) -> MeshResult<Group> {
        match self.members.remove(name) {
            Some(Node::Group(g)) => Ok(g),
            Some(Node::Dataset(_)) => Err(MeshError::NotAGroup { path: name.into() }),
            None => Err(MeshError::missing(name)),
        }
    }
}

/// Raw element storage of a dataset, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Values {
    Float(Vec<f64>),
    Int(Vec<i64>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Float(v) => v.len(),
            Values::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An n-dimensional array with its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub shape: Vec<usize>,
    pub values: Values,
}

impl Dataset {
    pub fn float(shape: &[usize], values: Vec<f64>) -> Self {
        Self {
            shape: shape.to_vec(),
            values: Values::Float(values),
        }
    }

    pub fn int(shape: &[usize], values: Vec<i64>) -> Self {
        Self {
            shape: shape.to_vec(),
            values: Values::Int(values),
        }
    }

    /// Check that the element count matches the shape. A shape whose
    /// element count overflows `usize` is reported with `expected ==
    /// usize::MAX`.
    pub fn validate(&self, path: &str) -> MeshResult<()> {
        let expected = self
            .shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if expected != Some(self.values.len()) {
            return Err(MeshError::DatasetSize {
                path: path.into(),
                shape: self.shape.clone(),
                expected: expected.unwrap_or(usize::MAX),
                found: self.values.len(),
            });
        }
        Ok(())
    }

    /// Values as a float array; integer data is widened.
    pub fn to_float_array(&self, path: &str) -> MeshResult<ArrayD<f64>> {
        self.validate(path)?;
        let data = match &self.values {
            Values::Float(v) => v.clone(),
            Values::Int(v) => v.iter().map(|&x| x as f64).collect(),
        };
        ArrayD::from_shape_vec(IxDyn(&self.shape), data).map_err(|_| MeshError::Rank {
            path: path.into(),
            expected: self.shape.len(),
            shape: self.shape.clone(),
        })
    }

    /// Values as a 2-D array of non-negative indices.
    pub fn to_index_array(&self, path: &str) -> MeshResult<Array2<usize>> {
        self.validate(path)?;
        let (rows, cols) = match self.shape[..] {
            [rows, cols] => (rows, cols),
            _ => {
                return Err(MeshError::Rank {
                    path: path.into(),
                    expected: 2,
                    shape: self.shape.clone(),
                });
            }
        };
        let Values::Int(raw) = &self.values else {
            return Err(MeshError::InvalidConnectivity {
                path: path.into(),
                message: "values must be integers".into(),
            });
        };
        let data = raw
            .iter()
            .map(|&x| {
                usize::try_from(x).map_err(|_| MeshError::InvalidConnectivity {
                    path: path.into(),
                    message: format!("negative index {x}"),
                })
            })
            .collect::<MeshResult<Vec<_>>>()?;
        Array2::from_shape_vec((rows, cols), data).map_err(|e| MeshError::InvalidConnectivity {
            path: path.into(),
            message: e.to_string(),
        })
    }
}
