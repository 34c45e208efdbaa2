//! Reopen and config persistence

use crate::common::*;
use vectext::demo::DEMO_CORPUS;
use vectext::{Database, PoolingMode, StoreError, Error, CONFIG_FILE_NAME};

#[test]
fn records_survive_reopen() {
    let t = TestDb::new();
    t.db.insert_texts(DEMO_CORPUS).unwrap();
    let before = t.db.stats();

    let t = t.reopen();
    let after = t.db.stats();
    assert_eq!(after.version, before.version);
    assert_eq!(after.keys, 10);
    assert_eq!(t.db.find_nearest(DEMO_CORPUS[0]).unwrap().text, DEMO_CORPUS[0]);
}

#[test]
fn versions_continue_after_reopen() {
    let t = TestDb::new();
    t.db.insert_texts(["one"]).unwrap();
    t.db.insert_texts(["two"]).unwrap();

    let t = t.reopen();
    assert_eq!(t.db.stats().version, 2);
    t.db.insert_texts(["three"]).unwrap();
    assert_eq!(t.db.stats().version, 3);
    assert_eq!(t.db.stats().keys, 3);
}

#[test]
fn config_written_by_open_with_config_is_reused() {
    let mut config = test_config();
    config.pooling = PoolingMode::Cls;
    let t = TestDb::with_config(config.clone());
    assert!(t.dir.path().join(CONFIG_FILE_NAME).exists());

    let t = t.reopen();
    assert_eq!(t.db.config(), &config);
}

#[test]
fn second_handle_is_refused() {
    let t = TestDb::new();
    let err = Database::open(t.dir.path(), provider()).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Locked(_))));
}

#[test]
fn closed_database_refuses_work() {
    let t = TestDb::new();
    t.db.insert_texts(["before close"]).unwrap();
    t.db.close().unwrap();

    assert!(matches!(
        t.db.insert_texts(["after close"]),
        Err(Error::Store(StoreError::Closed))
    ));
    assert!(matches!(
        t.db.records().map(|_| ()),
        Err(Error::Store(StoreError::Closed))
    ));
}
