use std::time::Duration;

use mesh_dp::prelude::*;

fn run<F, T>(size: usize, f: F) -> Vec<T>
where
    F: Fn(&RayonComm) -> T + Sync,
    T: Send,
{
    let world: Vec<_> = RayonComm::world(size)
        .into_iter()
        .map(|c| c.with_timeout(Duration::from_secs(5)))
        .collect();
    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = world.iter().map(|c| s.spawn(move || f(c))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[test]
fn all_to_all_delivers_each_pair() {
    let out = run(4, |comm| {
        let me = comm.rank() as u8;
        let sends = (0..4u8).map(|peer| vec![me, peer]).collect();
        comm.all_to_all(7, sends).unwrap()
    });
    for (rank, recv) in out.iter().enumerate() {
        for (peer, buf) in recv.iter().enumerate() {
            assert_eq!(buf, &vec![peer as u8, rank as u8]);
        }
    }
}

#[test]
fn consecutive_exchanges_stay_ordered() {
    let out = run(3, |comm| {
        let a = comm.all_gather(1, &[comm.rank() as u8]).unwrap();
        let b = comm.all_gather(1, &[10 + comm.rank() as u8]).unwrap();
        (a, b)
    });
    for (a, b) in out {
        assert_eq!(a, vec![vec![0], vec![1], vec![2]]);
        assert_eq!(b, vec![vec![10], vec![11], vec![12]]);
    }
}

#[test]
fn wrong_send_count_is_rejected() {
    let err = NoComm.all_to_all(0, vec![vec![], vec![]]).unwrap_err();
    assert!(matches!(err, MeshDpError::ColorCountMismatch { expected: 1, found: 2 }));
}

#[test]
fn serial_pass_over_nocomm() {
    let md = structured_quad(3, 3).unwrap();
    let out = dependent_partition_with(&md, &BlockPartitioner, &PartitionConfig::with_colors(1), &[NoComm])
        .unwrap();
    let cells = out.store.get(CELL_INDEX_SPACE).unwrap();
    assert_eq!(cells.colorings[0].exclusive.len(), 9);
    assert_eq!(cells.infos.len(), 1);
}
