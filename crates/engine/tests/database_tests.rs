//! End-to-end tests for the engine
//!
//! These tests drive the full pipeline through `Database` and the free
//! functions: embed → insert → scan → rank → resolve, plus lifecycle and
//! maintenance behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use vectext_core::{
    EmbeddingProvider, EmbeddingVector, Error, HashingEmbedder, PoolingMode, ProviderError,
    StoreError,
};
use vectext_engine::demo::{DEMO_CORPUS, DEMO_QUERY};
use vectext_engine::{Database, VectextConfig, CONFIG_FILE_NAME};

// ============================================================================
// Test Providers
// ============================================================================

/// Folds text bytes onto `dimension` components; distinct for the demo corpus
struct ByteSumProvider {
    dimension: usize,
    calls: AtomicUsize,
}

impl ByteSumProvider {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }
}

impl EmbeddingProvider for ByteSumProvider {
    fn embed(&self, text: &str, _pooling: PoolingMode) -> Result<EmbeddingVector, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut v = vec![1.0; self.dimension];
        for (i, b) in text.bytes().enumerate() {
            v[i % self.dimension] += b as f64;
        }
        Ok(v)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Fixed text → vector table; unknown texts fail
struct TableProvider(HashMap<&'static str, Vec<f64>>);

impl EmbeddingProvider for TableProvider {
    fn embed(&self, text: &str, _pooling: PoolingMode) -> Result<EmbeddingVector, ProviderError> {
        self.0
            .get(text)
            .cloned()
            .ok_or_else(|| format!("no embedding for {:?}", text).into())
    }

    fn dimension(&self) -> usize {
        4
    }
}

fn quiet_config() -> VectextConfig {
    let mut config = VectextConfig::default();
    config.sync_writes = false;
    config.maintenance.enabled = false;
    config
}

fn open_with(provider: Arc<dyn EmbeddingProvider>) -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::open_with_config(dir.path(), provider, quiet_config()).unwrap();
    (dir, db)
}

// ============================================================================
// Scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn test_basic_corpus() {
        let provider = Arc::new(ByteSumProvider::new(8));
        let (_dir, db) = open_with(provider.clone());

        let written = db.insert_texts(DEMO_CORPUS).unwrap();
        assert_eq!(written, 10);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 10);

        let records: Vec<_> = db.records().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| r.dimension() == 8));

        let mut texts: Vec<_> = records.into_iter().map(|r| r.text).collect();
        texts.sort();
        let mut expected: Vec<_> = DEMO_CORPUS.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(texts, expected);
    }

    #[test]
    fn test_semantic_proximity() {
        let table = TableProvider(HashMap::from([
            ("Lorem ipsum dolor sit amet.", vec![1.0, 0.0, 0.0, 0.0]),
            ("Lorem ipsum dolor sit amet!", vec![0.99, 0.01, 0.0, 0.0]),
            ("Engage the hyperdrive.", vec![0.0, 1.0, 0.0, 0.0]),
            ("The quick brown fox.", vec![0.0, 0.0, 1.0, 0.0]),
            ("Hello, world!", vec![0.0, 0.0, 0.0, 1.0]),
            ("placeholder latin", vec![0.98, 0.0, 0.02, 0.0]),
        ]));
        let (_dir, db) = open_with(Arc::new(table));

        db.insert_texts([
            "Engage the hyperdrive.",
            "Lorem ipsum dolor sit amet.",
            "The quick brown fox.",
            "Lorem ipsum dolor sit amet!",
            "Hello, world!",
        ])
        .unwrap();

        let nearest = db.find_nearest("placeholder latin").unwrap();
        assert_eq!(nearest.text, "Lorem ipsum dolor sit amet.");
        assert_eq!(nearest.ranked.len(), 5);

        let lorem = [vec![1.0, 0.0, 0.0, 0.0], vec![0.99, 0.01, 0.0, 0.0]];
        assert!(lorem.contains(&nearest.ranked[0].vector));
        assert!(lorem.contains(&nearest.ranked[1].vector));
        assert!(nearest.ranked[1].score > nearest.ranked[2].score);
    }

    #[test]
    fn test_query_matching_stored_text_ranks_it_first() {
        let table = TableProvider(HashMap::from([
            ("Lorem ipsum dolor sit amet.", vec![1.0, 0.0, 0.0, 0.0]),
            ("Lorem ipsum dolor sit amet!", vec![0.99, 0.01, 0.0, 0.0]),
            ("Engage the hyperdrive.", vec![0.0, 1.0, 0.0, 0.0]),
            ("The quick brown fox.", vec![0.0, 0.0, 1.0, 0.0]),
            ("Hello, world!", vec![0.0, 0.0, 0.0, 1.0]),
        ]));
        let (_dir, db) = open_with(Arc::new(table));

        db.insert_texts([
            "Lorem ipsum dolor sit amet.",
            "Engage the hyperdrive.",
            "Lorem ipsum dolor sit amet!",
            "The quick brown fox.",
            "Hello, world!",
        ])
        .unwrap();

        let nearest = db.find_nearest("Lorem ipsum dolor sit amet!").unwrap();
        assert_eq!(nearest.text, "Lorem ipsum dolor sit amet!");
        assert_eq!(nearest.ranked[0].vector, vec![0.99, 0.01, 0.0, 0.0]);
        assert!((nearest.ranked[0].score - 1.0).abs() < 1e-12);

        assert_eq!(nearest.ranked[1].vector, vec![1.0, 0.0, 0.0, 0.0]);
        assert!(nearest.ranked[1].score > 0.999);
        assert!(nearest.ranked[1].score < nearest.ranked[0].score);
        assert!(nearest.ranked[2..].iter().all(|r| r.score < 0.02));
    }

    #[test]
    fn test_empty_corpus() {
        let (_dir, db) = open_with(Arc::new(ByteSumProvider::new(8)));
        let err = db.find_nearest("anything").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_maintenance_idempotence() {
        let (_dir, db) = open_with(Arc::new(ByteSumProvider::new(8)));
        db.insert_texts(DEMO_CORPUS).unwrap();

        let outcome = db.reclaim_now().unwrap();
        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.segments_reclaimed, 0);
        assert!(!outcome.exhausted);
    }

    #[test]
    fn test_demo_with_hashing_embedder() {
        let (_dir, db) = open_with(Arc::new(HashingEmbedder::new(64)));
        db.insert_texts(DEMO_CORPUS).unwrap();

        let nearest = db.find_nearest(DEMO_QUERY).unwrap();
        assert!(DEMO_CORPUS.contains(&nearest.text.as_str()));
        assert_eq!(nearest.ranked.len(), 10);
        assert_eq!(nearest.report(4).lines().count(), 4);
    }
}

// ============================================================================
// Writes
// ============================================================================

mod writes {
    use super::*;

    #[test]
    fn test_identical_embeddings_collapse() {
        let table = TableProvider(HashMap::from([
            ("first", vec![0.5, 0.5, 0.0, 0.0]),
            ("second", vec![0.5, 0.5, 0.0, 0.0]),
        ]));
        let (_dir, db) = open_with(Arc::new(table));

        assert_eq!(db.insert_texts(["first", "second"]).unwrap(), 2);
        let records: Vec<_> = db.records().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "second");
    }

    #[test]
    fn test_provider_failure_writes_nothing() {
        let table = TableProvider(HashMap::from([("known", vec![1.0, 0.0, 0.0, 0.0])]));
        let (_dir, db) = open_with(Arc::new(table));

        let err = db.insert_texts(["known", "unknown"]).unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert_eq!(db.records().unwrap().count(), 0);
    }

    #[test]
    fn test_insert_vectors_and_query_by_vector() {
        let (_dir, db) = open_with(Arc::new(ByteSumProvider::new(2)));
        db.insert_vectors([("x", [1.0, 0.0]), ("y", [0.0, 1.0])])
            .unwrap();

        let nearest = db.find_nearest_to_vector(&[0.1, 0.9]).unwrap();
        assert_eq!(nearest.text, "y");
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn test_open_writes_default_config() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path(), Arc::new(ByteSumProvider::new(4))).unwrap();
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
        assert_eq!(db.config(), &VectextConfig::default());
        db.close().unwrap();
    }

    #[test]
    fn test_open_reads_existing_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "pooling = \"max\"\n[maintenance]\nenabled = false\n",
        )
        .unwrap();

        let db = Database::open(dir.path(), Arc::new(ByteSumProvider::new(4))).unwrap();
        assert_eq!(db.config().pooling, PoolingMode::Max);
        assert!(!db.config().maintenance.enabled);
    }

    #[test]
    fn test_invalid_config_fails_open() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[maintenance]\ndiscard_ratio = 2.0\n",
        )
        .unwrap();

        let err = Database::open(dir.path(), Arc::new(ByteSumProvider::new(4))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let db = Database::open_with_config(
                dir.path(),
                Arc::new(ByteSumProvider::new(8)),
                quiet_config(),
            )
            .unwrap();
            db.insert_texts(DEMO_CORPUS).unwrap();
            db.close().unwrap();
        }

        let db = Database::open(dir.path(), Arc::new(ByteSumProvider::new(8))).unwrap();
        assert_eq!(db.records().unwrap().count(), 10);
        let nearest = db.find_nearest(DEMO_CORPUS[3]).unwrap();
        assert_eq!(nearest.text, DEMO_CORPUS[3]);
    }

    #[test]
    fn test_second_open_is_locked() {
        let (dir, _db) = open_with(Arc::new(ByteSumProvider::new(4)));
        let err = Database::open(dir.path(), Arc::new(ByteSumProvider::new(4))).unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::Locked(_))));
    }

    #[test]
    fn test_operations_after_close_fail() {
        let (_dir, db) = open_with(Arc::new(ByteSumProvider::new(4)));
        db.insert_texts(["hello"]).unwrap();
        db.close().unwrap();
        db.close().unwrap();

        assert!(matches!(
            db.insert_texts(["again"]),
            Err(Error::Store(StoreError::Closed))
        ));
        assert!(matches!(
            db.find_nearest("hello"),
            Err(Error::Store(StoreError::Closed))
        ));
        assert!(matches!(
            db.reclaim_now(),
            Err(Error::Store(StoreError::Closed))
        ));
    }

    #[test]
    fn test_close_with_maintenance_running() {
        let dir = TempDir::new().unwrap();
        let mut config = quiet_config();
        config.maintenance.enabled = true;
        config.maintenance.interval_secs = 3600;

        let db = Database::open_with_config(dir.path(), Arc::new(ByteSumProvider::new(4)), config)
            .unwrap();
        db.insert_texts(["hello"]).unwrap();
        db.close().unwrap();

        // Lock released once the database is gone
        drop(db);
        assert!(Database::open(dir.path(), Arc::new(ByteSumProvider::new(4))).is_ok());
    }
}
