//! Equal split of an index space across colors.
//!
//! The split only distributes the *initialization* workload; the final
//! ownership comes from the partitioner. The remainder goes to the last
//! colors, matching the row distribution of the adjacency builder.

use std::ops::Range;

use crate::mesh_error::MeshDpError;

/// Prefix sums of a near-equal split: `offsets[c]..offsets[c + 1]` is the
/// range handed to color `c`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorPartition {
    offsets: Vec<usize>,
}

impl ColorPartition {
    /// Split `num_entities` across `num_colors`. Colors
    /// `num_colors - rem .. num_colors` receive one extra entity, with
    /// `rem = num_entities % num_colors`.
    pub fn equal(
        space: &'static str,
        num_entities: usize,
        num_colors: usize,
    ) -> Result<Self, MeshDpError> {
        if num_colors == 0 {
            return Err(MeshDpError::ZeroColors);
        }
        if num_entities < num_colors {
            return Err(MeshDpError::TooFewEntities {
                space,
                count: num_entities,
                colors: num_colors,
            });
        }
        let quot = num_entities / num_colors;
        let rem = num_entities % num_colors;
        let mut offsets = Vec::with_capacity(num_colors + 1);
        offsets.push(0);
        let mut total = 0;
        for color in 0..num_colors {
            total += quot + usize::from(color >= num_colors - rem);
            offsets.push(total);
        }
        Ok(Self { offsets })
    }

    /// Build from per-color counts (used for connectivity arrays, where
    /// colors may contribute nothing).
    pub fn from_counts(counts: impl IntoIterator<Item = usize>) -> Self {
        let mut offsets = vec![0];
        let mut total = 0;
        for c in counts {
            total += c;
            offsets.push(total);
        }
        Self { offsets }
    }

    pub fn num_colors(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of entities covered.
    pub fn total(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn range(&self, color: usize) -> Range<usize> {
        self.offsets[color]..self.offsets[color + 1]
    }

    pub fn len_of(&self, color: usize) -> usize {
        self.offsets[color + 1] - self.offsets[color]
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.offsets.windows(2).map(|w| w[0]..w[1])
    }

    /// Color whose range contains `id`.
    pub fn color_of(&self, id: usize) -> Option<usize> {
        if id >= self.total() {
            return None;
        }
        // first offset strictly greater than id, minus one
        Some(self.offsets.partition_point(|&o| o <= id) - 1)
    }
}

/// Split a slice into one disjoint mutable chunk per color range.
pub fn split_by_partition<'a, T>(
    mut data: &'a mut [T],
    partition: &ColorPartition,
) -> Result<Vec<&'a mut [T]>, MeshDpError> {
    crate::mesh_error::check_size("sub-region split volume", partition.total(), data.len())?;
    let mut chunks = Vec::with_capacity(partition.num_colors());
    for color in 0..partition.num_colors() {
        let (head, tail) = std::mem::take(&mut data).split_at_mut(partition.len_of(color));
        chunks.push(head);
        data = tail;
    }
    Ok(chunks)
}
