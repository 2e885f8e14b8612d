use mesh_dp::algs::meshgen::{StructuredCellType, structured_box_2d, structured_box_3d};
use mesh_dp::prelude::*;

fn per_color(md: &SimpleDefinition, colors: usize, opts: AdjacencyOpts) -> Vec<Dcrs> {
    let cells = ColorPartition::equal("cells", md.num_cells(), colors).unwrap();
    (0..colors)
        .map(|c| make_dcrs(md, c, &cells, opts).unwrap())
        .collect()
}

#[test]
fn building_twice_gives_the_same_rows() {
    let md = structured_quad(8, 8).unwrap();
    let a = per_color(&md, 4, AdjacencyOpts::default());
    let b = per_color(&md, 4, AdjacencyOpts::default());
    assert_eq!(a, b);
    assert_eq!(a.iter().map(|d| d.indices.len()).sum::<usize>(), 224);
}

#[test]
fn split_rows_assemble_into_the_global_graph() {
    let md = structured_quad(5, 3).unwrap();
    let parts = per_color(&md, 4, AdjacencyOpts::default());
    let global = make_global_dcrs(&md, AdjacencyOpts::default()).unwrap();
    let joined = Dcrs::assemble(&parts);
    assert_eq!(joined.offsets, global.offsets);
    assert_eq!(joined.indices, global.indices);
    for d in &parts {
        assert_eq!(d.distribution, vec![0, 3, 7, 11, 15]);
    }
}

#[test]
fn adjacency_is_symmetric_and_sorted() {
    let md = structured_box_2d(4, 3, [0.0, 0.0], [1.0, 1.0], StructuredCellType::Triangle).unwrap();
    let g = make_global_dcrs(&md, AdjacencyOpts::default()).unwrap();
    for cell in 0..g.num_rows() {
        let row = g.row(cell);
        assert!(row.windows(2).all(|w| w[0] < w[1]));
        assert!(!row.contains(&cell));
        for &nbr in row {
            assert!(g.row(nbr).contains(&cell), "{cell} -> {nbr} not mirrored");
        }
    }
}

#[test]
fn hex_faces_need_four_shared_vertices() {
    let md = structured_box_3d(2, 2, 2, [0.0; 3], [1.0; 3]).unwrap();
    let faces = make_global_dcrs(&md, AdjacencyOpts::shared_vertices(4)).unwrap();
    // every cell of a 2x2x2 block touches three others through a face
    assert!((0..8).all(|c| faces.row(c).len() == 3));
    let any = make_global_dcrs(&md, AdjacencyOpts::shared_vertices(1)).unwrap();
    assert!((0..8).all(|c| any.row(c).len() == 7));
}

#[test]
fn lower_threshold_only_adds_neighbours() {
    let md = structured_quad(4, 4).unwrap();
    let edges = make_global_dcrs(&md, AdjacencyOpts::default()).unwrap();
    let corners = make_global_dcrs(&md, AdjacencyOpts::shared_vertices(1)).unwrap();
    for cell in 0..16 {
        assert!(edges.row(cell).iter().all(|n| corners.row(cell).contains(n)));
    }
    // 2 * (horizontal + vertical + 2 * diagonal adjacencies)
    assert_eq!(corners.indices.len(), 2 * (12 + 12 + 18));
}
