//! Mesh builders shared by the integration tests.

#![allow(dead_code)]

use h5cmp_core::{Dataset, Group};

/// One 2-D triangle, three vertices.
pub type Tri = [[f64; 2]; 3];

/// Cells and per-cell scalar fields of one block, before it is written out.
#[derive(Debug, Clone, Default)]
pub struct BlockData {
    pub cells: Vec<Tri>,
    pub fields: Vec<(String, Vec<f64>)>,
}

impl BlockData {
    pub fn new(cells: Vec<Tri>) -> Self {
        Self {
            cells,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, values: Vec<f64>) -> Self {
        self.fields.push((name.to_string(), values));
        self
    }

    /// Block group with a shared point array: repeated vertices are stored
    /// once and referenced through connectivity.
    pub fn to_group(&self) -> Group {
        let mut points: Vec<[f64; 2]> = Vec::new();
        let mut conn: Vec<i64> = Vec::new();
        for cell in &self.cells {
            for vertex in cell {
                let idx = match points.iter().position(|p| p == vertex) {
                    Some(i) => i,
                    None => {
                        points.push(*vertex);
                        points.len() - 1
                    }
                };
                conn.push(idx as i64);
            }
        }
        let mut group = Group::new()
            .with("points", Dataset::float(&[points.len(), 2], points.concat()))
            .with("connectivity", Dataset::int(&[self.cells.len(), 3], conn));
        if !self.fields.is_empty() {
            let mut fields = Group::new();
            for (name, values) in &self.fields {
                fields.insert(name.clone(), Dataset::float(&[values.len()], values.clone()));
            }
            group.insert("fields", fields);
        }
        group
    }

    /// Same block with cells and fields permuted: new cell `k` is old cell
    /// `perm[k]`.
    pub fn permuted(&self, perm: &[usize]) -> Self {
        Self {
            cells: perm.iter().map(|&i| self.cells[i]).collect(),
            fields: self
                .fields
                .iter()
                .map(|(n, v)| (n.clone(), perm.iter().map(|&i| v[i]).collect()))
                .collect(),
        }
    }
}

/// Multi-block mesh group from named blocks.
pub fn multi_block(blocks: &[(&str, &BlockData)]) -> Group {
    let mut mesh = Group::new();
    for (name, block) in blocks {
        mesh.insert(*name, block.to_group());
    }
    mesh
}

/// File document with the mesh under the `mesh` root.
pub fn document(mesh: Group) -> Group {
    Group::new().with("mesh", mesh)
}

/// A 2x2 grid of unit squares split into 8 triangles.
pub fn grid_cells() -> Vec<Tri> {
    let mut cells = Vec::new();
    for i in 0..2 {
        for j in 0..2 {
            let (x, y) = (i as f64, j as f64);
            cells.push([[x, y], [x + 1.0, y], [x + 1.0, y + 1.0]]);
            cells.push([[x, y], [x + 1.0, y + 1.0], [x, y + 1.0]]);
        }
    }
    cells
}
