//! Readers and maintenance alongside writers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use crate::common::*;
use vectext::{scan_all, MaintenanceConfig, MaintenanceTask};

#[test]
fn scans_see_whole_batches_only() {
    let t = TestDb::new();
    let store = Arc::clone(t.db.store());
    let stop = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(2));

    let reader = {
        let store = Arc::clone(&store);
        let stop = Arc::clone(&stop);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            let mut scans = 0;
            while !stop.load(Ordering::Acquire) {
                let count = scan_all(&store, Some(4)).unwrap().count();
                assert_eq!(count % 5, 0, "scan observed a partial batch");
                scans += 1;
            }
            scans
        })
    };

    barrier.wait();
    for batch in 0..50u32 {
        let pairs: Vec<_> = (0..5u32)
            .map(|i| {
                let x = f64::from(batch * 5 + i);
                (format!("text {}", x), [x, 1.0, 2.0, 3.0])
            })
            .collect();
        t.db.insert_vectors(pairs).unwrap();
    }
    stop.store(true, Ordering::Release);

    assert!(reader.join().unwrap() > 0);
    assert_eq!(t.db.stats().keys, 250);
}

#[test]
fn maintenance_runs_beside_writers() {
    let t = TestDb::with_config(small_segment_config());
    let config = MaintenanceConfig {
        interval: Duration::from_millis(5),
        discard_ratio: 0.5,
        max_rounds: 4,
    };
    let handle = MaintenanceTask::start(Arc::clone(t.db.store()), config).unwrap();

    for i in 0..300 {
        t.db.insert_vectors([(format!("revision {}", i), [1.0, 2.0, 3.0, 4.0])])
            .unwrap();
    }
    thread::sleep(Duration::from_millis(50));
    handle.shutdown();

    let nearest = t.db.find_nearest_to_vector(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(nearest.text, "revision 299");
    assert_eq!(t.db.stats().keys, 1);
}
