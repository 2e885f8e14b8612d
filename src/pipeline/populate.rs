//! Topology populators: the two per-color initialization tasks.
//!
//! Both run inside a must-epoch, each color writing only its equal-split
//! sub-regions.

use crate::algs::dcrs::Dcrs;
use crate::algs::equal_split::ColorPartition;
use crate::data::region::{AdjacencyRecord, CellRecord, Interval, VertexRecord};
use crate::io::MeshDefinition;
use crate::mesh_error::{MeshDpError, check_size};

/// Connectivity contribution of one color, reported by [`init_mesh_task`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InitMeshCounts {
    pub cell_to_cell: usize,
    pub cell_to_vertex: usize,
}

/// Global prefix sums of the per-color connectivity counts, handed to every
/// [`init_adjacency_task`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjacencyArgs {
    pub cell_to_cell: ColorPartition,
    pub cell_to_vertex: ColorPartition,
}

impl AdjacencyArgs {
    /// Reduce the per-color counts into prefix sums.
    pub fn from_counts(counts: &[InitMeshCounts]) -> Self {
        Self {
            cell_to_cell: ColorPartition::from_counts(counts.iter().map(|c| c.cell_to_cell)),
            cell_to_vertex: ColorPartition::from_counts(counts.iter().map(|c| c.cell_to_vertex)),
        }
    }
}

/// Write ids and partitioner labels for the color's cells, ids and the
/// unassigned sentinel for its vertices, and report how many connectivity
/// entries the color will contribute.
#[allow(clippy::too_many_arguments)]
pub fn init_mesh_task<M>(
    color: usize,
    md: &M,
    cells: &ColorPartition,
    vertices: &ColorPartition,
    dcrs: &Dcrs,
    labels: &[usize],
    cell_sub: &mut [CellRecord],
    vertex_sub: &mut [VertexRecord],
) -> Result<InitMeshCounts, MeshDpError>
where
    M: MeshDefinition + ?Sized,
{
    let num_colors = cells.num_colors();
    let cell_range = cells.range(color);
    check_size("cell sub-region volume", cell_range.len(), cell_sub.len())?;
    check_size("partitioner labels", cell_range.len(), labels.len())?;
    check_size("dcrs rows", cell_range.len(), dcrs.num_rows())?;

    let dim = md.dimension();
    let mut cell_to_vertex = 0;
    for ((rec, cell_id), &label) in cell_sub.iter_mut().zip(cell_range).zip(labels) {
        rec.id = cell_id;
        rec.partition_color = label;
        rec.offset = None;
        let verts = md.entities(dim, 0, cell_id)?;
        log::trace!("color {color}: cell {cell_id} -> color {label}, vertices {verts:?}");
        cell_to_vertex += verts.len();
    }

    let vertex_range = vertices.range(color);
    check_size("vertex sub-region volume", vertex_range.len(), vertex_sub.len())?;
    for (rec, vertex_id) in vertex_sub.iter_mut().zip(vertex_range) {
        rec.id = vertex_id;
        rec.partition_color = num_colors;
        rec.offset = None;
    }

    let counts = InitMeshCounts {
        cell_to_cell: dcrs.indices.len(),
        cell_to_vertex,
    };
    log::debug!(
        "color {color}: init_mesh cells {} vertices {} cell_to_cell {} cell_to_vertex {}",
        cell_sub.len(),
        vertex_sub.len(),
        counts.cell_to_cell,
        counts.cell_to_vertex
    );
    Ok(counts)
}

/// Fill the color's slice of both connectivity arrays and record each local
/// cell's intervals into them.
pub fn init_adjacency_task<M>(
    color: usize,
    md: &M,
    dcrs: &Dcrs,
    args: &AdjacencyArgs,
    cell_sub: &mut [CellRecord],
    cell_to_cell_sub: &mut [AdjacencyRecord],
    cell_to_vertex_sub: &mut [AdjacencyRecord],
) -> Result<(), MeshDpError>
where
    M: MeshDefinition + ?Sized,
{
    check_size(
        "cell-to-cell sub-region volume",
        dcrs.indices.len(),
        cell_to_cell_sub.len(),
    )?;
    check_size("dcrs rows", cell_sub.len(), dcrs.num_rows())?;
    let c2c_base = args.cell_to_cell.offsets()[color];
    let c2v_base = args.cell_to_vertex.offsets()[color];

    let dim = md.dimension();
    let mut written = 0;
    for (row, rec) in cell_sub.iter_mut().enumerate() {
        rec.cell_range = Interval::new(c2c_base + dcrs.offsets[row], c2c_base + dcrs.offsets[row + 1]);

        let verts = md.entities(dim, 0, rec.id)?;
        let slots = cell_to_vertex_sub
            .get_mut(written..written + verts.len())
            .ok_or(MeshDpError::SizeMismatch {
                what: "cell-to-vertex sub-region volume",
                expected: written + verts.len(),
                actual: args.cell_to_vertex.len_of(color),
            })?;
        for (slot, &v) in slots.iter_mut().zip(&verts) {
            *slot = AdjacencyRecord::to(v);
        }
        rec.vertex_range = Interval::new(c2v_base + written, c2v_base + written + verts.len());
        written += verts.len();
    }
    check_size(
        "cell-to-vertex entries written",
        cell_to_vertex_sub.len(),
        written,
    )?;

    for (slot, &target) in cell_to_cell_sub.iter_mut().zip(&dcrs.indices) {
        *slot = AdjacencyRecord::to(target);
    }
    log::debug!(
        "color {color}: init_adjacency cell_to_cell [{}, {}) cell_to_vertex [{}, {})",
        c2c_base,
        c2c_base + cell_to_cell_sub.len(),
        c2v_base,
        c2v_base + written
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::dcrs::make_dcrs;
    use crate::algs::meshgen::structured_quad;
    use crate::config::AdjacencyOpts;

    #[test]
    fn single_color_populates_everything() {
        let md = structured_quad(2, 1).unwrap();
        let cells = ColorPartition::equal("cells", 2, 1).unwrap();
        let verts = ColorPartition::equal("vertices", 6, 1).unwrap();
        let dcrs = make_dcrs(&md, 0, &cells, AdjacencyOpts::default()).unwrap();

        let mut cell_recs = vec![CellRecord::default(); 2];
        let mut vert_recs = vec![VertexRecord::default(); 6];
        let counts = init_mesh_task(
            0,
            &md,
            &cells,
            &verts,
            &dcrs,
            &[0, 0],
            &mut cell_recs,
            &mut vert_recs,
        )
        .unwrap();
        assert_eq!(
            counts,
            InitMeshCounts {
                cell_to_cell: 2,
                cell_to_vertex: 8
            }
        );
        assert!(vert_recs.iter().all(|v| v.partition_color == 1));
        assert_eq!(vert_recs[5].id, 5);

        let args = AdjacencyArgs::from_counts(&[counts]);
        let mut c2c = vec![AdjacencyRecord::default(); 2];
        let mut c2v = vec![AdjacencyRecord::default(); 8];
        init_adjacency_task(0, &md, &dcrs, &args, &mut cell_recs, &mut c2c, &mut c2v).unwrap();
        assert_eq!(cell_recs[0].cell_range, Interval::new(0, 1));
        assert_eq!(cell_recs[1].cell_range, Interval::new(1, 2));
        assert_eq!(cell_recs[1].vertex_range, Interval::new(4, 8));
        assert_eq!(c2c[0], AdjacencyRecord::to(1));
        assert_eq!(c2v[4], AdjacencyRecord::to(1));
    }

    #[test]
    fn mismatched_connectivity_volume_is_fatal() {
        let md = structured_quad(2, 1).unwrap();
        let cells = ColorPartition::equal("cells", 2, 1).unwrap();
        let dcrs = make_dcrs(&md, 0, &cells, AdjacencyOpts::default()).unwrap();
        let args = AdjacencyArgs::from_counts(&[InitMeshCounts {
            cell_to_cell: 3,
            cell_to_vertex: 8,
        }]);
        let mut cell_recs = vec![CellRecord::default(); 2];
        let mut c2c = vec![AdjacencyRecord::default(); 3];
        let mut c2v = vec![AdjacencyRecord::default(); 8];
        let err = init_adjacency_task(0, &md, &dcrs, &args, &mut cell_recs, &mut c2c, &mut c2v)
            .unwrap_err();
        assert!(err.is_consistency_failure());
    }
}
