//! Serial mesh definitions.
//!
//! [`MeshDefinition`] is the read-only contract the partitioning pipeline
//! consumes: global entity counts per dimension and cell/vertex incidence.
//! [`SimpleDefinition`] is the in-memory implementation, loaded from the
//! simple text format:
//!
//! ```text
//! <num_vertices> <num_cells>
//! x y            # one line per vertex
//! v0 v1 v2 v3    # one line per cell, vertex ids
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::mesh_error::MeshDpError;

/// Read-only view of a serial (undistributed) mesh.
pub trait MeshDefinition: Sync {
    /// Topological dimension of the cells.
    fn dimension(&self) -> usize;

    /// Number of entities of dimension `dim` (0 = vertices, `dimension()` = cells).
    fn num_entities(&self, dim: usize) -> usize;

    /// Entities of dimension `to_dim` incident to entity `id` of dimension
    /// `from_dim`, in their stored order.
    fn entities(&self, from_dim: usize, to_dim: usize, id: usize)
    -> Result<Vec<usize>, MeshDpError>;
}

/// Cell/vertex mesh held in CSR form, with the vertex-to-cell transpose.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimpleDefinition {
    dimension: usize,
    coordinates: Vec<Vec<f64>>,
    cell_offsets: Vec<usize>,
    cell_vertices: Vec<usize>,
    vertex_offsets: Vec<usize>,
    vertex_cells: Vec<usize>,
}

impl SimpleDefinition {
    /// Build from coordinates and per-cell vertex lists.
    pub fn new(
        dimension: usize,
        coordinates: Vec<Vec<f64>>,
        cells: &[Vec<usize>],
    ) -> Result<Self, MeshDpError> {
        if dimension == 0 {
            return Err(MeshDpError::InvalidDimension(dimension));
        }
        let num_vertices = coordinates.len();
        let mut cell_offsets = Vec::with_capacity(cells.len() + 1);
        let mut cell_vertices = Vec::new();
        cell_offsets.push(0);
        for (i, cell) in cells.iter().enumerate() {
            for (k, &v) in cell.iter().enumerate() {
                if v >= num_vertices {
                    return Err(MeshDpError::EntityOutOfRange {
                        dim: 0,
                        id: v,
                        count: num_vertices,
                    });
                }
                if cell[..k].contains(&v) {
                    return Err(MeshDpError::MeshIoParse(format!(
                        "cell {i} lists vertex {v} more than once"
                    )));
                }
            }
            cell_vertices.extend_from_slice(cell);
            cell_offsets.push(cell_vertices.len());
        }

        // transpose: vertex -> incident cells, ascending cell id
        let mut counts = vec![0usize; num_vertices + 1];
        for &v in &cell_vertices {
            counts[v + 1] += 1;
        }
        for i in 0..num_vertices {
            counts[i + 1] += counts[i];
        }
        let vertex_offsets = counts.clone();
        let mut cursor = counts;
        let mut vertex_cells = vec![0usize; cell_vertices.len()];
        for (cell, w) in cell_offsets.windows(2).enumerate() {
            for &v in &cell_vertices[w[0]..w[1]] {
                vertex_cells[cursor[v]] = cell;
                cursor[v] += 1;
            }
        }

        Ok(Self {
            dimension,
            coordinates,
            cell_offsets,
            cell_vertices,
            vertex_offsets,
            vertex_cells,
        })
    }

    /// Load a mesh file in the simple format. The dimension is taken from the
    /// number of coordinates on the first vertex line.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MeshDpError> {
        let path = path.as_ref();
        log::info!("reading mesh definition {}", path.display());
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, MeshDpError> {
        let mut lines = BufReader::new(reader)
            .lines()
            .map(|l| l.map_err(MeshDpError::from))
            .filter(|l| l.as_ref().map_or(true, |s| !s.trim().is_empty()));

        let header = lines
            .next()
            .ok_or_else(|| MeshDpError::MeshIoParse("missing header".into()))??;
        let mut it = header.split_whitespace();
        let num_vertices = parse_count(it.next(), "vertex count")?;
        let num_cells = parse_count(it.next(), "cell count")?;

        let mut coordinates = Vec::with_capacity(num_vertices);
        for i in 0..num_vertices {
            let line = lines.next().ok_or_else(|| {
                MeshDpError::MeshIoParse(format!("unexpected end of vertex list at {i}"))
            })??;
            let coord = line
                .split_whitespace()
                .map(|raw| {
                    raw.parse::<f64>().map_err(|_| {
                        MeshDpError::MeshIoParse(format!("invalid coordinate: {raw}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            coordinates.push(coord);
        }
        let dimension = coordinates.first().map_or(2, Vec::len);
        if let Some((i, c)) = coordinates
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != dimension)
        {
            return Err(MeshDpError::MeshIoParse(format!(
                "vertex {i} has {} coordinates, expected {dimension}",
                c.len()
            )));
        }

        let mut cells = Vec::with_capacity(num_cells);
        for i in 0..num_cells {
            let line = lines.next().ok_or_else(|| {
                MeshDpError::MeshIoParse(format!("unexpected end of cell list at {i}"))
            })??;
            let verts = line
                .split_whitespace()
                .map(|raw| {
                    raw.parse::<usize>().map_err(|_| {
                        MeshDpError::MeshIoParse(format!("invalid vertex id: {raw}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if verts.is_empty() {
                return Err(MeshDpError::MeshIoParse(format!("cell {i} has no vertices")));
            }
            cells.push(verts);
        }

        Self::new(dimension, coordinates, &cells)
    }

    pub fn num_cells(&self) -> usize {
        self.cell_offsets.len().saturating_sub(1)
    }

    pub fn num_vertices(&self) -> usize {
        self.coordinates.len()
    }

    /// Vertices of `cell` as a borrowed slice.
    pub fn cell_vertices(&self, cell: usize) -> Option<&[usize]> {
        let lo = *self.cell_offsets.get(cell)?;
        let hi = *self.cell_offsets.get(cell + 1)?;
        Some(&self.cell_vertices[lo..hi])
    }

    /// Cells incident to `vertex`, ascending.
    pub fn vertex_cells(&self, vertex: usize) -> Option<&[usize]> {
        let lo = *self.vertex_offsets.get(vertex)?;
        let hi = *self.vertex_offsets.get(vertex + 1)?;
        Some(&self.vertex_cells[lo..hi])
    }

    pub fn coordinates(&self, vertex: usize) -> Option<&[f64]> {
        self.coordinates.get(vertex).map(Vec::as_slice)
    }
}

impl MeshDefinition for SimpleDefinition {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn num_entities(&self, dim: usize) -> usize {
        match dim {
            0 => self.num_vertices(),
            d if d == self.dimension => self.num_cells(),
            _ => 0,
        }
    }

    fn entities(
        &self,
        from_dim: usize,
        to_dim: usize,
        id: usize,
    ) -> Result<Vec<usize>, MeshDpError> {
        let out_of_range = || MeshDpError::EntityOutOfRange {
            dim: from_dim,
            id,
            count: self.num_entities(from_dim),
        };
        match (from_dim, to_dim) {
            (f, 0) if f == self.dimension => self
                .cell_vertices(id)
                .map(<[usize]>::to_vec)
                .ok_or_else(out_of_range),
            (0, t) if t == self.dimension => self
                .vertex_cells(id)
                .map(<[usize]>::to_vec)
                .ok_or_else(out_of_range),
            (f, t) if f == t && f == self.dimension && id < self.num_cells() => Ok(vec![id]),
            _ => Err(MeshDpError::InvalidDimension(from_dim.max(to_dim))),
        }
    }
}

fn parse_count(raw: Option<&str>, what: &str) -> Result<usize, MeshDpError> {
    let raw = raw.ok_or_else(|| MeshDpError::MeshIoParse(format!("missing {what}")))?;
    raw.parse()
        .map_err(|_| MeshDpError::MeshIoParse(format!("invalid {what}: {raw}")))
}
