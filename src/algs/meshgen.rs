//! Structured mesh generators producing [`SimpleDefinition`]s.
//!
//! Cells and vertices are numbered row-major (x fastest), so an equal split
//! of the cells hands each color a band of whole rows when `nx` divides the
//! band size.

use crate::io::SimpleDefinition;
use crate::mesh_error::MeshDpError;

/// Cell-type choices for structured meshes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuredCellType {
    Triangle,
    Quadrilateral,
    Hexahedron,
}

fn invalid(message: &str) -> MeshDpError {
    MeshDpError::MeshIoParse(message.to_string())
}

/// Generate a structured 2D box mesh over `[min, max]` with `nx`×`ny` cells.
pub fn structured_box_2d(
    nx: usize,
    ny: usize,
    min: [f64; 2],
    max: [f64; 2],
    cell_type: StructuredCellType,
) -> Result<SimpleDefinition, MeshDpError> {
    if nx == 0 || ny == 0 {
        return Err(invalid("nx and ny must be positive"));
    }
    if cell_type == StructuredCellType::Hexahedron {
        return Err(invalid("hex elements are not valid for 2D meshes"));
    }

    let dx = (max[0] - min[0]) / nx as f64;
    let dy = (max[1] - min[1]) / ny as f64;
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        let y = min[1] + dy * j as f64;
        for i in 0..=nx {
            vertices.push(vec![min[0] + dx * i as f64, y]);
        }
    }

    let mut cells = Vec::new();
    let row_stride = nx + 1;
    for j in 0..ny {
        for i in 0..nx {
            let v0 = j * row_stride + i;
            let v1 = v0 + 1;
            let v3 = v0 + row_stride;
            let v2 = v3 + 1;
            if cell_type == StructuredCellType::Triangle {
                cells.push(vec![v0, v1, v2]);
                cells.push(vec![v0, v2, v3]);
            } else {
                cells.push(vec![v0, v1, v2, v3]);
            }
        }
    }

    SimpleDefinition::new(2, vertices, &cells)
}

/// Unit-square quad mesh with `nx`×`ny` cells.
pub fn structured_quad(nx: usize, ny: usize) -> Result<SimpleDefinition, MeshDpError> {
    structured_box_2d(
        nx,
        ny,
        [0.0, 0.0],
        [1.0, 1.0],
        StructuredCellType::Quadrilateral,
    )
}

/// Generate a structured 3D hex mesh over `[min, max]` with `nx`×`ny`×`nz` cells.
pub fn structured_box_3d(
    nx: usize,
    ny: usize,
    nz: usize,
    min: [f64; 3],
    max: [f64; 3],
) -> Result<SimpleDefinition, MeshDpError> {
    if nx == 0 || ny == 0 || nz == 0 {
        return Err(invalid("nx, ny, and nz must be positive"));
    }
    let dx = (max[0] - min[0]) / nx as f64;
    let dy = (max[1] - min[1]) / ny as f64;
    let dz = (max[2] - min[2]) / nz as f64;

    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                vertices.push(vec![
                    min[0] + dx * i as f64,
                    min[1] + dy * j as f64,
                    min[2] + dz * k as f64,
                ]);
            }
        }
    }

    let row = nx + 1;
    let plane = row * (ny + 1);
    let idx = |i: usize, j: usize, k: usize| k * plane + j * row + i;
    let mut cells = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                cells.push(vec![
                    idx(i, j, k),
                    idx(i + 1, j, k),
                    idx(i + 1, j + 1, k),
                    idx(i, j + 1, k),
                    idx(i, j, k + 1),
                    idx(i + 1, j, k + 1),
                    idx(i + 1, j + 1, k + 1),
                    idx(i, j + 1, k + 1),
                ]);
            }
        }
    }

    SimpleDefinition::new(3, vertices, &cells)
}
