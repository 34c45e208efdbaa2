//! Value log space recovery under overwrites

use crate::common::*;
use vectext::{insert_batch, run_reclaim_cycle};

fn overwrite(t: &TestDb, rounds: usize) {
    let vector = [0.25, 0.5, 0.75, 1.0];
    for i in 0..rounds {
        t.db.insert_vectors([(format!("revision {}", i), vector)])
            .unwrap();
    }
}

#[test]
fn fresh_store_cycle_is_one_round() {
    let t = TestDb::new();
    let outcome = t.db.reclaim_now().unwrap();
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.segments_reclaimed, 0);
}

#[test]
fn overwritten_segments_are_reclaimed() {
    let t = TestDb::with_config(small_segment_config());
    overwrite(&t, 200);

    let before = t.db.stats();
    assert!(before.segments > 2);
    assert!(before.discard_bytes > 0);

    let outcome = run_reclaim_cycle(t.db.store(), 0.5, 1_000).unwrap();
    assert!(outcome.segments_reclaimed > 0);
    assert!(!outcome.exhausted);

    let after = t.db.stats();
    assert!(after.segments < before.segments);
    assert!(after.total_bytes < before.total_bytes);
    assert_eq!(after.keys, 1);

    let nearest = t.db.find_nearest_to_vector(&[0.25, 0.5, 0.75, 1.0]).unwrap();
    assert_eq!(nearest.text, "revision 199");
}

#[test]
fn reclaimed_store_reopens_with_latest_text() {
    let t = TestDb::with_config(small_segment_config());
    overwrite(&t, 120);
    insert_batch(t.db.store(), [("other", [1.0, 0.0, 0.0, 0.0])]).unwrap();
    run_reclaim_cycle(t.db.store(), 0.5, 1_000).unwrap();

    let t = t.reopen();
    assert_eq!(t.db.stats().keys, 2);
    let nearest = t.db.find_nearest_to_vector(&[0.25, 0.5, 0.75, 1.0]).unwrap();
    assert_eq!(nearest.text, "revision 119");
}

#[test]
fn bounded_cycle_reports_exhaustion() {
    let t = TestDb::with_config(small_segment_config());
    overwrite(&t, 200);

    let outcome = run_reclaim_cycle(t.db.store(), 0.5, 1).unwrap();
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.segments_reclaimed, 1);
    assert!(outcome.exhausted);
}
