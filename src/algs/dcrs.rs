//! Distributed compressed-row (DCRS) cell-to-cell adjacency.
//!
//! Each color holds the rows for its equal-split cell range:
//!
//! * `offsets[i] .. offsets[i+1]` = neighbour list of local cell *i*
//! * `indices`                    = concatenated *global* neighbour cell ids
//! * `distribution`               = prefix sums of rows per color
//!
//! Two cells are adjacent iff they share at least
//! [`AdjacencyOpts::threshold`] vertices. Rows are **self-free**, free of
//! duplicates, and sorted ascending, so building twice yields identical
//! arrays.

use hashbrown::HashMap;
use itertools::Itertools;

use crate::algs::equal_split::ColorPartition;
use crate::config::AdjacencyOpts;
use crate::io::MeshDefinition;
use crate::mesh_error::MeshDpError;

/// CSR rows of the cell-to-cell graph owned by one color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dcrs {
    pub offsets: Vec<usize>,
    pub indices: Vec<usize>,
    pub distribution: Vec<usize>,
}

impl Dcrs {
    /// Number of local rows.
    pub fn num_rows(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Global id of the first local row.
    pub fn first_row(&self, color: usize) -> usize {
        self.distribution[color]
    }

    /// Neighbours of local row `row`.
    pub fn row(&self, row: usize) -> &[usize] {
        &self.indices[self.offsets[row]..self.offsets[row + 1]]
    }

    /// Concatenate per-color rows into one global CSR. Rows must be given in
    /// color order so the row ids stay global.
    pub fn assemble(parts: &[Dcrs]) -> Dcrs {
        let mut offsets = vec![0];
        let mut indices = Vec::with_capacity(parts.iter().map(|p| p.indices.len()).sum());
        for part in parts {
            for row in 0..part.num_rows() {
                indices.extend_from_slice(part.row(row));
                offsets.push(indices.len());
            }
        }
        let total = offsets.len() - 1;
        Dcrs {
            offsets,
            indices,
            distribution: vec![0, total],
        }
    }
}

/// Build the rows of `color` under the equal split `cells`.
pub fn make_dcrs<M>(
    md: &M,
    color: usize,
    cells: &ColorPartition,
    opts: AdjacencyOpts,
) -> Result<Dcrs, MeshDpError>
where
    M: MeshDefinition + ?Sized,
{
    let dim = md.dimension();
    if dim == 0 {
        return Err(MeshDpError::InvalidDimension(dim));
    }
    let threshold = opts.threshold(dim);
    let range = cells.range(color);

    let mut offsets = Vec::with_capacity(range.len() + 1);
    let mut indices = Vec::new();
    offsets.push(0);

    // neighbour cell -> number of shared vertices
    let mut shared: HashMap<usize, usize> = HashMap::new();
    for cell in range {
        shared.clear();
        for vertex in md.entities(dim, 0, cell)? {
            for other in md.entities(0, dim, vertex)? {
                if other != cell {
                    *shared.entry(other).or_insert(0) += 1;
                }
            }
        }
        indices.extend(
            shared
                .iter()
                .filter(|&(_, &n)| n >= threshold)
                .map(|(&other, _)| other)
                .sorted_unstable(),
        );
        offsets.push(indices.len());
    }

    log::trace!(
        "color {color}: dcrs rows {} entries {}",
        offsets.len() - 1,
        indices.len()
    );

    Ok(Dcrs {
        offsets,
        indices,
        distribution: cells.offsets().to_vec(),
    })
}

/// The whole graph as a single row block.
pub fn make_global_dcrs<M>(md: &M, opts: AdjacencyOpts) -> Result<Dcrs, MeshDpError>
where
    M: MeshDefinition + ?Sized,
{
    let num_cells = md.num_entities(md.dimension());
    let whole = ColorPartition::from_counts([num_cells]);
    make_dcrs(md, 0, &whole, opts)
}
