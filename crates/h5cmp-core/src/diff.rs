//! Order-independent mesh comparison.
//!
//! Both meshes are put into a canonical cell order by sorting on the raw
//! bytes of each cell's coordinate tuple. After alignment the geometry must
//! match exactly, while field values only have to agree within
//! [`TOLERANCE`].

use ndarray::{ArrayView2, Axis, Dimension};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assemble::{CellArray, FieldMap, construct_cells, construct_fields};
use crate::container::Group;
use crate::error::{MeshError, MeshResult};

/// Largest absolute difference at which two field values still match.
pub const TOLERANCE: f64 = 1e-14;

/// Outcome of comparing two meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Same,
    Different(Mismatch),
}

impl Verdict {
    pub fn is_same(&self) -> bool {
        matches!(self, Verdict::Same)
    }

    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            Verdict::Same => None,
            Verdict::Different(m) => Some(m),
        }
    }
}

/// The first problem found between two meshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mismatch {
    /// Cell count, vertices per cell or spatial dimension differ.
    Shape { first: Vec<usize>, second: Vec<usize> },
    /// Aligned cells whose coordinates are not identical.
    Cells {
        differing: usize,
        position: usize,
        first: Vec<Vec<f64>>,
        second: Vec<Vec<f64>>,
    },
    /// A field of the first mesh has no counterpart in the second.
    MissingField { name: String },
    /// A field has values further apart than [`TOLERANCE`].
    FieldValues {
        name: String,
        discrepancies: Vec<Discrepancy>,
    },
}

/// One out-of-tolerance field value pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Position in canonical order.
    pub position: usize,
    /// Storage index of the cell in the first mesh.
    pub cell1: usize,
    /// Storage index of the cell in the second mesh.
    pub cell2: usize,
    /// Component index within the per-cell value; empty for scalar fields.
    pub component: Vec<usize>,
    pub value1: f64,
    pub value2: f64,
    pub difference: f64,
    pub coords1: Vec<Vec<f64>>,
    pub coords2: Vec<Vec<f64>>,
}

impl core::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Mismatch::Shape { first, second } => {
                write!(f, "shapes are not compatible: {first:?} vs {second:?}")
            }
            Mismatch::Cells {
                differing,
                position,
                first,
                second,
            } => write!(
                f,
                "cells are not the same: {differing} aligned cells differ, first at position {position}: {first:?} vs {second:?}"
            ),
            Mismatch::MissingField { name } => write!(f, "{name} is not in second file"),
            Mismatch::FieldValues {
                name,
                discrepancies,
            } => {
                writeln!(
                    f,
                    "{name} is not the same: {} values differ by more than {TOLERANCE:e}",
                    discrepancies.len()
                )?;
                for d in discrepancies {
                    writeln!(f, "  {d}")?;
                }
                Ok(())
            }
        }
    }
}

impl core::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "cell {} vs {}", self.cell1, self.cell2)?;
        if !self.component.is_empty() {
            write!(f, " {:?}", self.component)?;
        }
        write!(
            f,
            ": {:?} vs {:?} (|diff| = {:e})\n    {:?} vs {:?}",
            self.value1, self.value2, self.difference, self.coords1, self.coords2
        )
    }
}

/// Canonical ordering key of one cell: its coordinates in row-major order,
/// each as 8 little-endian bytes.
pub fn canonical_key(cell: ArrayView2<'_, f64>) -> Vec<u8> {
    cell.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Cell indices sorted by [`canonical_key`].
///
/// The sort is stable: cells with identical coordinates keep their storage
/// order and are not disambiguated further.
pub fn canonical_order(cells: &CellArray) -> Vec<usize> {
    let keys: Vec<Vec<u8>> = cells.outer_iter().map(canonical_key).collect();
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    order
}

/// Canonical orders of both meshes; position `p` pairs cell `first[p]` with
/// cell `second[p]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub first: Vec<usize>,
    pub second: Vec<usize>,
}

impl Alignment {
    pub fn new(cells1: &CellArray, cells2: &CellArray) -> Self {
        Self {
            first: canonical_order(cells1),
            second: canonical_order(cells2),
        }
    }
}

/// Shape check followed by exact coordinate equality after alignment.
pub fn check_geometry(
    cells1: &CellArray,
    cells2: &CellArray,
    alignment: &Alignment,
) -> Option<Mismatch> {
    if cells1.shape() != cells2.shape() {
        return Some(Mismatch::Shape {
            first: cells1.shape().to_vec(),
            second: cells2.shape().to_vec(),
        });
    }

    let mut differing = 0usize;
    let mut first_diff = None;
    for (position, (&i, &j)) in alignment.first.iter().zip(&alignment.second).enumerate() {
        if cells1.index_axis(Axis(0), i) != cells2.index_axis(Axis(0), j) {
            differing += 1;
            first_diff.get_or_insert((position, i, j));
        }
    }
    first_diff.map(|(position, i, j)| Mismatch::Cells {
        differing,
        position,
        first: cell_coords(cells1, i),
        second: cell_coords(cells2, j),
    })
}

/// Tolerance comparison of every field of the first mesh against the
/// second. Fields only the second mesh carries are not compared.
pub fn compare_fields(
    fields1: &FieldMap,
    fields2: &FieldMap,
    cells1: &CellArray,
    cells2: &CellArray,
    alignment: &Alignment,
) -> MeshResult<Option<Mismatch>> {
    for name in fields2.keys().filter(|name| !fields1.contains_key(*name)) {
        warn!(field = %name, "field only present in second mesh, not compared");
    }

    for (name, values1) in fields1 {
        let Some(values2) = fields2.get(name) else {
            return Ok(Some(Mismatch::MissingField { name: name.clone() }));
        };
        check_length(name, "first", values1.len_of(Axis(0)), cells1)?;
        check_length(name, "second", values2.len_of(Axis(0)), cells2)?;

        let a = values1.select(Axis(0), &alignment.first);
        let b = values2.select(Axis(0), &alignment.second);
        if a.shape() != b.shape() {
            return Err(MeshError::FieldShape {
                name: name.clone(),
                first: values1.shape().to_vec(),
                second: values2.shape().to_vec(),
            });
        }

        let mut discrepancies = Vec::new();
        for ((index, &value1), &value2) in a.indexed_iter().zip(b.iter()) {
            let difference = (value1 - value2).abs();
            if difference > TOLERANCE {
                let position = index[0];
                let (cell1, cell2) = (alignment.first[position], alignment.second[position]);
                discrepancies.push(Discrepancy {
                    position,
                    cell1,
                    cell2,
                    component: index.slice()[1..].to_vec(),
                    value1,
                    value2,
                    difference,
                    coords1: cell_coords(cells1, cell1),
                    coords2: cell_coords(cells2, cell2),
                });
            }
        }
        if !discrepancies.is_empty() {
            return Ok(Some(Mismatch::FieldValues {
                name: name.clone(),
                discrepancies,
            }));
        }
        debug!(field = %name, "field matches");
    }
    Ok(None)
}

/// Compare two mesh groups up to cell permutation.
///
/// Geometry is checked before fields are assembled, so a geometry mismatch
/// is reported even when the field data is unusable.
pub fn compare_meshes(mesh1: &Group, mesh2: &Group) -> MeshResult<Verdict> {
    let cells1 = construct_cells(mesh1)?;
    let cells2 = construct_cells(mesh2)?;
    let alignment = Alignment::new(&cells1, &cells2);

    if let Some(mismatch) = check_geometry(&cells1, &cells2, &alignment) {
        return Ok(Verdict::Different(mismatch));
    }

    let fields1 = construct_fields(mesh1)?;
    let fields2 = construct_fields(mesh2)?;
    Ok(
        match compare_fields(&fields1, &fields2, &cells1, &cells2, &alignment)? {
            Some(mismatch) => Verdict::Different(mismatch),
            None => Verdict::Same,
        },
    )
}

fn check_length(
    name: &str,
    side: &'static str,
    found: usize,
    cells: &CellArray,
) -> MeshResult<()> {
    let expected = cells.len_of(Axis(0));
    if found != expected {
        return Err(MeshError::FieldLength {
            name: name.into(),
            side,
            expected,
            found,
        });
    }
    Ok(())
}

fn cell_coords(cells: &CellArray, index: usize) -> Vec<Vec<f64>> {
    cells
        .index_axis(Axis(0), index)
        .outer_iter()
        .map(|vertex| vertex.to_vec())
        .collect()
}
