//! Graph partitioners: map the distributed cell adjacency to one color per
//! cell.
//!
//! A [`Partitioner`] call is collective: it receives every color's DCRS rows
//! at once and returns one label vector per color, row-aligned with the
//! input. Labels must lie in `0..num_colors`.

pub mod metrics;
#[cfg(feature = "metis-support")]
pub mod metis;

use crate::algs::dcrs::Dcrs;
use crate::mesh_error::MeshDpError;

pub use self::metrics::{edge_cut, imbalance};
#[cfg(feature = "metis-support")]
pub use self::metis::MetisPartitioner;

/// Maps DCRS rows to colors.
pub trait Partitioner: Sync {
    fn color(&self, dcrs: &[Dcrs], num_colors: usize) -> Result<Vec<Vec<usize>>, MeshDpError>;
}

/// Every cell keeps the color of its equal-split block.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockPartitioner;

impl Partitioner for BlockPartitioner {
    fn color(&self, dcrs: &[Dcrs], num_colors: usize) -> Result<Vec<Vec<usize>>, MeshDpError> {
        check_colors(dcrs, num_colors)?;
        Ok(dcrs
            .iter()
            .enumerate()
            .map(|(color, rows)| vec![color; rows.num_rows()])
            .collect())
    }
}

/// Explicit labels indexed by global cell id.
#[derive(Clone, Debug, Default)]
pub struct LabelPartitioner {
    labels: Vec<usize>,
}

impl LabelPartitioner {
    pub fn new(labels: Vec<usize>) -> Self {
        Self { labels }
    }

    /// Label cells with a function of their global id.
    pub fn from_fn(num_cells: usize, f: impl Fn(usize) -> usize) -> Self {
        Self::new((0..num_cells).map(f).collect())
    }
}

impl Partitioner for LabelPartitioner {
    fn color(&self, dcrs: &[Dcrs], num_colors: usize) -> Result<Vec<Vec<usize>>, MeshDpError> {
        check_colors(dcrs, num_colors)?;
        let mut out = Vec::with_capacity(dcrs.len());
        for (color, rows) in dcrs.iter().enumerate() {
            let first = rows.first_row(color);
            let slice = self
                .labels
                .get(first..first + rows.num_rows())
                .ok_or(MeshDpError::SizeMismatch {
                    what: "explicit label count",
                    expected: first + rows.num_rows(),
                    actual: self.labels.len(),
                })?;
            out.push(slice.to_vec());
        }
        Ok(out)
    }
}

fn check_colors(dcrs: &[Dcrs], num_colors: usize) -> Result<(), MeshDpError> {
    if dcrs.len() != num_colors {
        return Err(MeshDpError::ColorCountMismatch {
            expected: num_colors,
            found: dcrs.len(),
        });
    }
    Ok(())
}

/// Check partitioner output shape and range.
pub fn validate_labels(
    dcrs: &[Dcrs],
    labels: &[Vec<usize>],
    num_colors: usize,
) -> Result<(), MeshDpError> {
    check_colors(dcrs, num_colors)?;
    crate::mesh_error::check_size("partitioner color count", num_colors, labels.len())?;
    for (rows, local) in dcrs.iter().zip(labels) {
        crate::mesh_error::check_size("partitioner labels per color", rows.num_rows(), local.len())?;
        if let Some(&color) = local.iter().find(|&&c| c >= num_colors) {
            return Err(MeshDpError::InvalidColor { color, num_colors });
        }
    }
    Ok(())
}
