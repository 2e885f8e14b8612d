//! Dependent partitioning driver.
//!
//! Phases, each one must-epoch over all colors:
//!
//! 1. build the distributed cell adjacency (DCRS) and color it;
//! 2. `init_mesh`: ids, labels, vertex sentinels, connectivity counts;
//! 3. allocate the connectivity regions and run `init_adjacency`;
//! 4. classify cells; reduce vertex owners; classify vertices;
//! 5. assign offsets, build per-color colorings, verify;
//! 6. exchange colorings and fill the [`ColoringStore`].
//!
//! The driver retrieves every color's result before starting the next phase.
//!
//! [`ColoringStore`]: crate::topology::coloring::ColoringStore

use crate::algs::classify::{
    EntitySets, VertexOwners, apply_vertex_colors, classify_cells, classify_vertices,
    reduce_vertex_colors,
};
use crate::algs::coloring_exchange::{ExchangeOutcome, exchange_coloring};
use crate::algs::communicator::{Communicator, RayonComm};
use crate::algs::dcrs::{Dcrs, make_dcrs};
use crate::algs::offsets::{apply_offsets, build_coloring, primary_offsets};
use crate::algs::region_algebra::{IndexSet, partition_by_field};
use crate::algs::verify::{verify_coloring, verify_vertex_colors};
use crate::config::PartitionConfig;
use crate::data::region::{ConnectivityRegions, EntityRecord};
use crate::io::{MeshDefinition, SimpleDefinition};
use crate::mesh_error::{MeshDpError, check_size};
use crate::partitioning::{Partitioner, edge_cut, imbalance, validate_labels};
use crate::pipeline::context::{PartitionContext, Partitioned};
use crate::pipeline::epoch::MustEpoch;
use crate::pipeline::populate::{AdjacencyArgs, init_adjacency_task, init_mesh_task};
use crate::topology::coloring::{
    CELL_INDEX_SPACE, IndexColoring, SpaceColoring, VERTEX_INDEX_SPACE,
};

/// Load the configured mesh file.
pub fn load_mesh(config: &PartitionConfig) -> Result<SimpleDefinition, MeshDpError> {
    let path = config
        .mesh_path
        .as_ref()
        .ok_or_else(|| MeshDpError::Io("no mesh path configured".into()))?;
    log::info!("reading mesh {}", path.display());
    SimpleDefinition::from_path(path)
}

/// Partition `md` with one in-process rank per color.
pub fn dependent_partition<M, P>(
    md: &M,
    partitioner: &P,
    config: &PartitionConfig,
) -> Result<Partitioned, MeshDpError>
where
    M: MeshDefinition + ?Sized,
    P: Partitioner + ?Sized,
{
    config.validate()?;
    let comms = RayonComm::world(config.num_colors);
    dependent_partition_with(md, partitioner, config, &comms)
}

/// Partition `md`, exchanging colorings over `comms` (one per color,
/// `comms[c].rank() == c`). All colors run in this process, so `comms` must
/// be one in-process world such as [`RayonComm::world`]; a multi-process
/// MPI world fails the rank check.
pub fn dependent_partition_with<M, P, C>(
    md: &M,
    partitioner: &P,
    config: &PartitionConfig,
    comms: &[C],
) -> Result<Partitioned, MeshDpError>
where
    M: MeshDefinition + ?Sized,
    P: Partitioner + ?Sized,
    C: Communicator + Sync,
{
    check_comms(config.num_colors, comms)?;
    let mut ctx = PartitionContext::new(config, md)?;

    build_adjacency(&mut ctx, md)?;
    color_cells(&mut ctx, partitioner)?;
    init_mesh(&mut ctx, md)?;
    init_adjacency(&mut ctx, md)?;
    classify(&mut ctx)?;
    let (cell_colorings, vertex_colorings) = number_and_verify(&mut ctx)?;
    aggregate(&mut ctx, comms, CELL_INDEX_SPACE, cell_colorings)?;
    aggregate(&mut ctx, comms, VERTEX_INDEX_SPACE, vertex_colorings)?;

    ctx.finish()
}

fn check_comms<C: Communicator>(num_colors: usize, comms: &[C]) -> Result<(), MeshDpError> {
    if comms.len() != num_colors {
        return Err(MeshDpError::ColorCountMismatch {
            expected: num_colors,
            found: comms.len(),
        });
    }
    for (color, comm) in comms.iter().enumerate() {
        if comm.rank() != color || comm.size() != num_colors {
            return Err(MeshDpError::Runtime(format!(
                "communicator {color} reports rank {} of {}",
                comm.rank(),
                comm.size()
            )));
        }
    }
    Ok(())
}

fn build_adjacency<M>(ctx: &mut PartitionContext, md: &M) -> Result<(), MeshDpError>
where
    M: MeshDefinition + ?Sized,
{
    let opts = ctx.config.adjacency;
    let cells = &ctx.cells;
    ctx.dcrs = ctx
        .epoch
        .launch("make_dcrs", |color| make_dcrs(md, color, cells, opts))?
        .into_vec();
    let entries: usize = ctx.dcrs.iter().map(|d| d.indices.len()).sum();
    log::info!(
        "adjacency built: {} rows, {entries} entries, threshold {}",
        ctx.cells.total(),
        opts.threshold(ctx.dimension)
    );
    Ok(())
}

fn color_cells<P>(ctx: &mut PartitionContext, partitioner: &P) -> Result<(), MeshDpError>
where
    P: Partitioner + ?Sized,
{
    let n = ctx.num_colors();
    let labels = partitioner.color(&ctx.dcrs, n)?;
    validate_labels(&ctx.dcrs, &labels, n)?;

    let flat: Vec<usize> = labels.iter().flatten().copied().collect();
    let global = Dcrs::assemble(&ctx.dcrs);
    log::info!(
        "cells colored: edge cut {}, imbalance {:.3}",
        edge_cut(&global, &flat),
        imbalance(&flat, n)
    );
    ctx.labels = labels;
    Ok(())
}

fn init_mesh<M>(ctx: &mut PartitionContext, md: &M) -> Result<(), MeshDpError>
where
    M: MeshDefinition + ?Sized,
{
    let PartitionContext {
        ref epoch,
        ref cells,
        ref vertices,
        ref dcrs,
        ref labels,
        ref mut mesh,
        ..
    } = *ctx;
    let args: Vec<_> = mesh
        .cells
        .split_mut(cells)?
        .into_iter()
        .zip(mesh.vertices.split_mut(vertices)?)
        .collect();
    let counts = epoch
        .launch_with("init_mesh", args, |color, (cell_sub, vertex_sub)| {
            init_mesh_task(
                color,
                md,
                cells,
                vertices,
                &dcrs[color],
                &labels[color],
                cell_sub,
                vertex_sub,
            )
        })?
        .into_vec();

    let adjacency = AdjacencyArgs::from_counts(&counts);
    log::info!(
        "init_mesh done: cell_to_cell {}, cell_to_vertex {}",
        adjacency.cell_to_cell.total(),
        adjacency.cell_to_vertex.total()
    );
    ctx.connectivity = Some(ConnectivityRegions::allocate(
        adjacency.cell_to_cell.total(),
        adjacency.cell_to_vertex.total(),
    )?);
    ctx.adjacency = Some(adjacency);
    Ok(())
}

fn init_adjacency<M>(ctx: &mut PartitionContext, md: &M) -> Result<(), MeshDpError>
where
    M: MeshDefinition + ?Sized,
{
    let PartitionContext {
        ref epoch,
        ref cells,
        ref dcrs,
        ref mut mesh,
        ref adjacency,
        ref mut connectivity,
        ..
    } = *ctx;
    let (Some(args), Some(conn)) = (adjacency.as_ref(), connectivity.as_mut()) else {
        return Err(MeshDpError::Runtime(
            "init_adjacency before connectivity allocation".into(),
        ));
    };
    let edges: usize = dcrs.iter().map(|d| d.indices.len()).sum();
    check_size("cell-to-cell region volume", edges, conn.cell_to_cell.volume())?;

    let sub: Vec<_> = mesh
        .cells
        .split_mut(cells)?
        .into_iter()
        .zip(conn.cell_to_cell.split_mut(&args.cell_to_cell)?)
        .zip(conn.cell_to_vertex.split_mut(&args.cell_to_vertex)?)
        .collect();
    epoch.launch_with("init_adjacency", sub, |color, ((cell_sub, c2c), c2v)| {
        init_adjacency_task(color, md, &dcrs[color], args, cell_sub, c2c, c2v)
    })?;
    log::info!("init_adjacency done");
    Ok(())
}

fn classify(ctx: &mut PartitionContext) -> Result<(), MeshDpError> {
    let n = ctx.num_colors();
    let conn = ctx.connectivity()?;
    let cells = ctx.mesh.cells.records();
    let c2c = conn.cell_to_cell.records();
    let c2v = conn.cell_to_vertex.records();

    let primaries = partition_by_field(cells, n, |r| r.partition_color);
    check_size(
        "primary cells over all colors",
        cells.len(),
        primaries.iter().map(IndexSet::len).sum(),
    )?;
    let cell_sets = ctx
        .epoch
        .launch("classify_cells", |color| {
            classify_cells(color, &primaries[color], cells, c2c)
        })?
        .into_vec();
    log::info!(
        "cells classified: {} ghost instances",
        cell_sets.iter().map(|s| s.ghost.len()).sum::<usize>()
    );

    let owners = VertexOwners::new(ctx.mesh.vertices.volume(), n);
    let visited = ctx
        .epoch
        .launch("reduce_vertex_colors", |color| {
            reduce_vertex_colors(color, &cell_sets[color].primary, cells, c2v, &owners)
        })?
        .into_iter()
        .sum::<usize>();
    let colors = owners.into_colors();
    apply_vertex_colors(ctx.mesh.vertices.records_mut(), &colors)?;
    verify_vertex_colors(ctx.mesh.vertices.records(), n)?;
    log::info!("vertex owners reduced over {visited} incidences");

    let conn = ctx.connectivity()?;
    let cells = ctx.mesh.cells.records();
    let c2v = conn.cell_to_vertex.records();
    let vprimaries = partition_by_field(ctx.mesh.vertices.records(), n, |v| v.partition_color);
    let vertex_sets = ctx
        .epoch
        .launch("classify_vertices", |color| {
            classify_vertices(color, &vprimaries[color], &cell_sets[color], cells, c2v)
        })?
        .into_vec();
    log::info!(
        "vertices classified: {} ghost instances",
        vertex_sets.iter().map(|s| s.ghost.len()).sum::<usize>()
    );

    ctx.cell_sets = cell_sets;
    ctx.vertex_sets = vertex_sets;
    Ok(())
}

/// Offsets, colorings and (optionally) verification for one space.
fn number_space<R>(
    epoch: &MustEpoch,
    verify: bool,
    space: &'static str,
    sets: &[EntitySets],
    records: &mut [R],
) -> Result<Vec<IndexColoring>, MeshDpError>
where
    R: EntityRecord + Send + Sync,
{
    let offsets = epoch
        .launch("assign_offsets", |color| Ok(primary_offsets(&sets[color])))?
        .into_vec();
    apply_offsets(records, &offsets)?;

    let records: &[R] = records;
    let colorings = epoch
        .launch("build_coloring", |color| {
            build_coloring(color, space, &sets[color], records)
        })?
        .into_vec();

    if verify {
        let counts: Vec<usize> = sets.iter().map(|s| s.primary.len()).collect();
        epoch.launch("verify", |color| {
            verify_coloring(color, space, &sets[color], &colorings[color], records, &counts)
        })?;
        log::info!("{space}: verification passed");
    }
    Ok(colorings)
}

fn number_and_verify(
    ctx: &mut PartitionContext,
) -> Result<(Vec<IndexColoring>, Vec<IndexColoring>), MeshDpError> {
    let PartitionContext {
        ref epoch,
        ref config,
        ref mut mesh,
        ref cell_sets,
        ref vertex_sets,
        ..
    } = *ctx;
    let cells = number_space(
        epoch,
        config.verify,
        "cells",
        cell_sets,
        mesh.cells.records_mut(),
    )?;
    let vertices = number_space(
        epoch,
        config.verify,
        "vertices",
        vertex_sets,
        mesh.vertices.records_mut(),
    )?;
    Ok((cells, vertices))
}

fn aggregate<C>(
    ctx: &mut PartitionContext,
    comms: &[C],
    index_space: usize,
    colorings: Vec<IndexColoring>,
) -> Result<(), MeshDpError>
where
    C: Communicator + Sync,
{
    let outcomes: Vec<ExchangeOutcome> = ctx
        .epoch
        .launch_with("exchange_coloring", colorings, |color, coloring| {
            exchange_coloring(&comms[color], index_space, coloring)
        })?
        .into_vec();

    let mut colorings = Vec::with_capacity(outcomes.len());
    let mut infos = None;
    for (color, out) in outcomes.into_iter().enumerate() {
        match &infos {
            None => infos = Some(out.infos),
            Some(first) if *first != out.infos => {
                return Err(MeshDpError::consistency(
                    color,
                    "coloring exchange",
                    "gathered infos differ between colors",
                ));
            }
            Some(_) => {}
        }
        colorings.push(out.coloring);
    }
    let space = SpaceColoring {
        colorings,
        infos: infos.unwrap_or_default(),
    };
    log::info!(
        "index space {index_space} aggregated: {} primary, {} ghost instances",
        space.total_primary(),
        space.total_ghost()
    );
    ctx.store.add_coloring(index_space, space);
    Ok(())
}
