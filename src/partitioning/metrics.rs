//! Partitioning metrics utilities.
//!
//! Quality numbers for a cell labeling; the pipeline logs them after the
//! partitioner runs.

use crate::algs::dcrs::Dcrs;

/// Number of undirected adjacency edges whose endpoints carry different
/// labels. `graph` must be a global (assembled) CSR and `labels` indexed by
/// global cell id.
pub fn edge_cut(graph: &Dcrs, labels: &[usize]) -> usize {
    let crossing: usize = (0..graph.num_rows())
        .map(|u| {
            graph
                .row(u)
                .iter()
                .filter(|&&v| labels[u] != labels[v])
                .count()
        })
        .sum();
    // each undirected edge appears in both rows
    crossing / 2
}

/// Largest color size divided by the mean color size (1.0 = perfect balance).
pub fn imbalance(labels: &[usize], num_colors: usize) -> f64 {
    if labels.is_empty() || num_colors == 0 {
        return 1.0;
    }
    let mut sizes = vec![0usize; num_colors];
    for &l in labels {
        if let Some(s) = sizes.get_mut(l) {
            *s += 1;
        }
    }
    let max = sizes.iter().copied().max().unwrap_or(0) as f64;
    max * num_colors as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::dcrs::make_global_dcrs;
    use crate::algs::meshgen::structured_quad;
    use crate::config::AdjacencyOpts;

    #[test]
    fn row_bands_cut_one_row_of_edges() {
        let md = structured_quad(4, 4).unwrap();
        let g = make_global_dcrs(&md, AdjacencyOpts::default()).unwrap();
        let labels: Vec<usize> = (0..16).map(|c| c / 8).collect();
        assert_eq!(edge_cut(&g, &labels), 4);
        assert!((imbalance(&labels, 2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lopsided_labels_report_imbalance() {
        let labels = vec![0, 0, 0, 1];
        assert!((imbalance(&labels, 2) - 1.5).abs() < 1e-12);
    }
}
