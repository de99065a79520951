//! Concurrency and thread safety tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use decoupage::{
    CanonicalizeConfig, DecoupageConfig, EngineHandle, EntityKind, GeoEngine, MatchConfig,
    QueryRequest, SearchRequest, Snapshot, load_snapshot,
};

fn data_config() -> DecoupageConfig {
    DecoupageConfig::default().with_data_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/data"))
}

fn full_snapshot() -> Snapshot {
    load_snapshot(&data_config().ingest_config()).expect("snapshot")
}

fn build(snapshot: Snapshot) -> GeoEngine {
    GeoEngine::from_snapshot(snapshot, &CanonicalizeConfig::default(), MatchConfig::default())
        .expect("engine")
}

#[test]
fn concurrent_searches_agree() {
    let engine = Arc::new(build(full_snapshot()));
    let req = SearchRequest::new(QueryRequest::new(EntityKind::Commune).with_nom("saint"));
    let expected = engine.search(&req).expect("search").to_value();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let req = req.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|_| engine.search(&req).expect("search").to_value())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        for result in handle.join().expect("thread panicked") {
            assert_eq!(result, expected, "thread {i} diverged");
        }
    }
}

#[test]
fn readers_never_observe_a_partial_snapshot() {
    let full = full_snapshot();
    let mut reduced = full.clone();
    reduced.communes.clear();

    let full_count = full.communes.len();
    let handle = EngineHandle::new(build(full.clone()));
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut observed = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    let engine = handle.current();
                    let communes = engine.len(EntityKind::Commune);
                    assert!(communes == 0 || communes == full_count);
                    // Departements are identical in both snapshots.
                    assert_eq!(engine.len(EntityKind::Departement), 101);
                    observed += 1;
                }
                observed
            })
        })
        .collect();

    for round in 0..20 {
        let next = if round % 2 == 0 {
            reduced.clone()
        } else {
            full.clone()
        };
        handle.replace(build(next));
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().expect("reader panicked");
    }
}

#[test]
fn in_flight_request_keeps_its_snapshot() {
    let handle = EngineHandle::new(build(full_snapshot()));
    let pinned = handle.current();

    handle.replace(build(Snapshot::default()));

    assert!(handle.current().is_empty());
    assert_eq!(pinned.len(EntityKind::Region), 18);
    let req = SearchRequest::new(QueryRequest::new(EntityKind::Region).with_code("28"));
    assert_eq!(pinned.search(&req).expect("search").len(), 1);
}
