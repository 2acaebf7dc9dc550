//! Mesh assembly: flatten a (possibly multi-block) mesh group into one cell
//! array and one field mapping.
//!
//! A mesh group is either a single block, recognized by a direct `points`
//! member, or a collection of named sub-blocks each shaped like a single
//! block. Sub-blocks are visited in member order and their cells and field
//! values are concatenated in that order, so row `i` of every field lines up
//! with cell `i` of the cell array.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use ndarray::{Array2, Array3, ArrayD, Axis, Ix2};
use tracing::debug;

use crate::container::{Group, Node};
use crate::error::{MeshError, MeshResult};

/// Resolved vertex coordinates, shaped `(num_cells, vertices_per_cell, spatial_dim)`.
pub type CellArray = Array3<f64>;

/// Per-cell field values by name. Axis 0 of every array is the cell axis.
pub type FieldMap = BTreeMap<String, ArrayD<f64>>;

const ROOT: &str = "mesh";

/// Whether the mesh group is a single block rather than a set of sub-blocks.
pub fn is_single_block(mesh: &Group) -> bool {
    mesh.contains("points")
}

/// Gather point coordinates through connectivity for every block and
/// concatenate the results in block order.
pub fn construct_cells(mesh: &Group) -> MeshResult<CellArray> {
    if is_single_block(mesh) {
        return gather_block(mesh, ROOT);
    }

    let mut blocks = Vec::with_capacity(mesh.len());
    for (name, node) in mesh.iter() {
        let path = format!("{ROOT}/{name}");
        let block = as_block(node, &path)?;
        blocks.push(gather_block(block, &path)?);
    }
    let Some(first) = blocks.first() else {
        return Err(MeshError::EmptyMesh);
    };
    let (_, vertices, dim) = first.dim();
    for cells in &blocks[1..] {
        let (_, v, d) = cells.dim();
        if (v, d) != (vertices, dim) {
            return Err(MeshError::Incompatible {
                what: "cell blocks".into(),
                existing: first.shape().to_vec(),
                incoming: cells.shape().to_vec(),
            });
        }
    }

    let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
    let cells = ndarray::concatenate(Axis(0), &views).map_err(|_| MeshError::Incompatible {
        what: "cell blocks".into(),
        existing: first.shape().to_vec(),
        incoming: Vec::new(),
    })?;
    debug!(blocks = blocks.len(), cells = cells.len_of(Axis(0)), "assembled cells");
    Ok(cells)
}

/// Collect field values for every block, concatenated in block order.
///
/// A field is only accumulated from the blocks that carry it; blocks without
/// it contribute nothing, so such a field ends up shorter than the cell
/// array. That shortfall is left for the comparator to surface.
pub fn construct_fields(mesh: &Group) -> MeshResult<FieldMap> {
    if is_single_block(mesh) {
        if !mesh.contains("fields") {
            return Ok(FieldMap::new());
        }
        let path = format!("{ROOT}/fields");
        let fields = mesh.group("fields").map_err(|e| e.within(ROOT))?;
        return read_fields(fields, &path);
    }

    let mut output = FieldMap::new();
    let mut contributors: BTreeMap<String, usize> = BTreeMap::new();
    let mut blocks = 0usize;
    for (name, node) in mesh.iter() {
        let path = format!("{ROOT}/{name}");
        let block = as_block(node, &path)?;
        blocks += 1;
        if !block.contains("fields") {
            continue;
        }
        let fields = block.group("fields").map_err(|e| e.within(&path))?;
        for (field, values) in read_fields(fields, &format!("{path}/fields"))? {
            *contributors.entry(field.clone()).or_default() += 1;
            match output.entry(field) {
                Entry::Vacant(slot) => {
                    slot.insert(values);
                }
                Entry::Occupied(mut slot) => {
                    let merged = concat_field(slot.key(), slot.get(), &values)?;
                    *slot.get_mut() = merged;
                }
            }
        }
    }

    for (field, count) in &contributors {
        if *count < blocks {
            debug!(field = %field, present = count, blocks, "field missing from some blocks");
        }
    }
    Ok(output)
}

fn as_block<'a>(node: &'a Node, path: &str) -> MeshResult<&'a Group> {
    match node {
        Node::Group(g) => Ok(g),
        Node::Dataset(_) => Err(MeshError::NotAGroup { path: path.into() }),
    }
}

fn gather_block(block: &Group, path: &str) -> MeshResult<CellArray> {
    let points_path = format!("{path}/points");
    let points_ds = block.dataset("points").map_err(|e| e.within(path))?;
    let points: Array2<f64> = points_ds
        .to_float_array(&points_path)?
        .into_dimensionality::<Ix2>()
        .map_err(|_| MeshError::Rank {
            path: points_path.clone(),
            expected: 2,
            shape: points_ds.shape.clone(),
        })?;
    let conn = block
        .dataset("connectivity")
        .map_err(|e| e.within(path))?
        .to_index_array(&format!("{path}/connectivity"))?;

    let (num_points, dim) = points.dim();
    let (num_cells, vertices) = conn.dim();
    if let Some(&index) = conn.iter().find(|&&i| i >= num_points) {
        return Err(MeshError::IndexOutOfRange { index, num_points });
    }

    let flat: Vec<usize> = conn.iter().copied().collect();
    points
        .select(Axis(0), &flat)
        .into_shape_with_order((num_cells, vertices, dim))
        .map_err(|_| MeshError::Rank {
            path: points_path,
            expected: 3,
            shape: vec![num_cells, vertices, dim],
        })
}

fn read_fields(fields: &Group, path: &str) -> MeshResult<FieldMap> {
    let mut out = FieldMap::new();
    for (name, node) in fields.iter() {
        let field_path = format!("{path}/{name}");
        let Node::Dataset(dataset) = node else {
            return Err(MeshError::NotADataset { path: field_path });
        };
        let values = dataset.to_float_array(&field_path)?;
        if values.ndim() == 0 {
            return Err(MeshError::Rank {
                path: field_path,
                expected: 1,
                shape: Vec::new(),
            });
        }
        out.insert(name.to_string(), values);
    }
    Ok(out)
}

fn concat_field(
    name: &str,
    existing: &ArrayD<f64>,
    incoming: &ArrayD<f64>,
) -> MeshResult<ArrayD<f64>> {
    let incompatible = || MeshError::Incompatible {
        what: format!("field {name}"),
        existing: existing.shape().to_vec(),
        incoming: incoming.shape().to_vec(),
    };
    if existing.shape()[1..] != incoming.shape()[1..] {
        return Err(incompatible());
    }
    ndarray::concatenate(Axis(0), &[existing.view(), incoming.view()]).map_err(|_| incompatible())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Dataset;

    fn block(points: &[[f64; 2]], conn: &[[i64; 3]]) -> Group {
        Group::new()
            .with("points", Dataset::float(&[points.len(), 2], points.concat()))
            .with("connectivity", Dataset::int(&[conn.len(), 3], conn.concat()))
    }

    fn with_field(block: Group, name: &str, values: &[f64]) -> Group {
        let fields = Group::new().with(name, Dataset::float(&[values.len()], values.to_vec()));
        block.with("fields", fields)
    }

    const SQUARE: [[f64; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    #[test]
    fn test_single_block_gather() {
        let mesh = block(&SQUARE, &[[0, 1, 2], [0, 2, 3]]);
        let cells = construct_cells(&mesh).unwrap();
        assert_eq!(cells.dim(), (2, 3, 2));
        assert_eq!(cells[[1, 2, 0]], 0.0);
        assert_eq!(cells[[1, 2, 1]], 1.0);
        assert_eq!(cells[[0, 1, 0]], 1.0);
    }

    #[test]
    fn test_single_block_without_fields() {
        let mesh = block(&SQUARE, &[[0, 1, 2]]);
        assert!(construct_fields(&mesh).unwrap().is_empty());
    }

    #[test]
    fn test_multi_block_concatenates_in_member_order() {
        let b0 = with_field(block(&SQUARE, &[[0, 1, 2]]), "u", &[1.0]);
        let b1 = with_field(block(&SQUARE, &[[0, 2, 3]]), "u", &[2.0]);
        // inserted out of order; member order is by name
        let mesh = Group::new().with("block_1", b1).with("block_0", b0);

        let cells = construct_cells(&mesh).unwrap();
        assert_eq!(cells.dim(), (2, 3, 2));
        assert_eq!(cells[[0, 1, 0]], 1.0); // vertex 1 of block_0's triangle
        assert_eq!(cells[[1, 2, 1]], 1.0); // vertex 3 of block_1's triangle

        let fields = construct_fields(&mesh).unwrap();
        assert_eq!(fields["u"].as_slice().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_field_missing_from_a_block_is_under_populated() {
        let b0 = with_field(block(&SQUARE, &[[0, 1, 2]]), "u", &[1.0]);
        let b1 = block(&SQUARE, &[[0, 2, 3]]);
        let mesh = Group::new().with("a", b0).with("b", b1);

        let cells = construct_cells(&mesh).unwrap();
        let fields = construct_fields(&mesh).unwrap();
        assert_eq!(cells.len_of(Axis(0)), 2);
        assert_eq!(fields["u"].len_of(Axis(0)), 1);
    }

    #[test]
    fn test_missing_points_is_structural() {
        let mesh = Group::new().with(
            "b0",
            Group::new().with("connectivity", Dataset::int(&[1, 3], vec![0, 1, 2])),
        );
        let err = construct_cells(&mesh).unwrap_err();
        match err {
            MeshError::MissingMember { path } => assert_eq!(path, "mesh/b0/points"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_index_out_of_range() {
        let mesh = block(&SQUARE, &[[0, 1, 4]]);
        assert!(matches!(
            construct_cells(&mesh),
            Err(MeshError::IndexOutOfRange {
                index: 4,
                num_points: 4
            })
        ));
    }

    #[test]
    fn test_empty_multi_block() {
        let mesh = Group::new();
        assert!(matches!(construct_cells(&mesh), Err(MeshError::EmptyMesh)));
        assert!(construct_fields(&mesh).unwrap().is_empty());
    }

    #[test]
    fn test_blocks_with_different_cell_kinds() {
        let tri = block(&SQUARE, &[[0, 1, 2]]);
        let quad = Group::new()
            .with("points", Dataset::float(&[4, 2], SQUARE.concat()))
            .with("connectivity", Dataset::int(&[1, 4], vec![0, 1, 2, 3]));
        let mesh = Group::new().with("a", tri).with("b", quad);
        assert!(matches!(
            construct_cells(&mesh),
            Err(MeshError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_vector_field_concatenation() {
        let vec_field = |v: Vec<f64>| {
            Group::new().with("velocity", Dataset::float(&[v.len() / 2, 2], v))
        };
        let b0 = block(&SQUARE, &[[0, 1, 2]]).with("fields", vec_field(vec![1.0, 2.0]));
        let b1 = block(&SQUARE, &[[0, 2, 3]]).with("fields", vec_field(vec![3.0, 4.0]));
        let mesh = Group::new().with("a", b0).with("b", b1);

        let fields = construct_fields(&mesh).unwrap();
        assert_eq!(fields["velocity"].shape(), &[2, 2]);
        assert_eq!(fields["velocity"][[1, 0]], 3.0);
    }
}
