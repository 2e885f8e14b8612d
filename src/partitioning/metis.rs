//! k-way METIS partitioner over the gathered adjacency.

use metis::Idx;

use crate::algs::dcrs::Dcrs;
use crate::mesh_error::MeshDpError;
use crate::partitioning::Partitioner;

/// Gathers every color's rows and runs `METIS_PartGraphKway` once.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetisPartitioner;

impl Partitioner for MetisPartitioner {
    fn color(&self, dcrs: &[Dcrs], num_colors: usize) -> Result<Vec<Vec<usize>>, MeshDpError> {
        super::check_colors(dcrs, num_colors)?;
        let global = Dcrs::assemble(dcrs);
        let n = global.num_rows();
        let mut part: Vec<Idx> = vec![0; n];
        if num_colors > 1 && n > 0 {
            let xadj: Vec<Idx> = global.offsets.iter().map(|&u| u as Idx).collect();
            let adjncy: Vec<Idx> = global.indices.iter().map(|&v| v as Idx).collect();
            let graph = metis::Graph::new(1, num_colors as Idx, &xadj, &adjncy)
                .map_err(|e| MeshDpError::Partitioner(format!("{e:?}")))?;
            graph
                .part_kway(&mut part)
                .map_err(|e| MeshDpError::Partitioner(format!("{e:?}")))?;
        }

        let mut out = Vec::with_capacity(dcrs.len());
        let mut start = 0;
        for rows in dcrs {
            let end = start + rows.num_rows();
            out.push(part[start..end].iter().map(|&p| p as usize).collect());
            start = end;
        }
        Ok(out)
    }
}
