//! Ingest → scan → rank → resolve through the facade

use crate::common::*;
use vectext::demo::{DEMO_CORPUS, DEMO_QUERY};
use vectext::{cosine_similarity, decode_vector, encode_vector, rank, Error};

#[test]
fn demo_corpus_round_trip() {
    let t = TestDb::new();
    assert_eq!(t.db.insert_texts(DEMO_CORPUS).unwrap(), 10);

    let records: Vec<_> = t.db.records().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 10);
    for record in &records {
        assert_eq!(record.dimension(), 16);
        assert!(DEMO_CORPUS.contains(&record.text.as_str()));
    }
}

#[test]
fn every_fragment_is_its_own_nearest() {
    let t = TestDb::new();
    t.db.insert_texts(DEMO_CORPUS).unwrap();

    for text in DEMO_CORPUS {
        let nearest = t.db.find_nearest(text).unwrap();
        assert_eq!(nearest.text, text);
        let best = nearest.best().unwrap();
        assert!((best.score - 1.0).abs() < 1e-12);
    }
}

#[test]
fn demo_query_resolves_to_stored_text() {
    let t = TestDb::new();
    t.db.insert_texts(DEMO_CORPUS).unwrap();

    let nearest = t.db.find_nearest(DEMO_QUERY).unwrap();
    assert!(DEMO_CORPUS.contains(&nearest.text.as_str()));
    assert_eq!(nearest.ranked.len(), DEMO_CORPUS.len());
}

#[test]
fn ranking_is_descending_and_matches_cosine() {
    let t = TestDb::new();
    t.db.insert_texts(DEMO_CORPUS).unwrap();

    let query = vec![1.0; 16];
    let nearest = t.db.find_nearest_to_vector(&query).unwrap();
    for pair in nearest.ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for r in &nearest.ranked {
        assert_eq!(r.score, cosine_similarity(&query, &r.vector));
    }
}

#[test]
fn keys_decode_back_to_ranked_vectors() {
    let t = TestDb::new();
    t.db.insert_texts(DEMO_CORPUS).unwrap();

    let vectors: Vec<_> = t
        .db
        .records()
        .unwrap()
        .map(|r| r.unwrap().vector)
        .collect();
    for v in &vectors {
        assert_eq!(&decode_vector(&encode_vector(v).unwrap()).unwrap(), v);
    }

    let ranked = rank(&vectors[0], vectors.clone()).unwrap();
    assert_eq!(ranked[0].vector, vectors[0]);
}

#[test]
fn empty_store_has_no_nearest() {
    let t = TestDb::new();
    assert!(matches!(t.db.find_nearest("anything"), Err(Error::NotFound(_))));
    assert_eq!(t.db.records().unwrap().count(), 0);
}

#[test]
fn wrong_query_dimension_is_decoding_error() {
    let t = TestDb::new();
    t.db.insert_texts(["Hello, world!"]).unwrap();
    assert!(matches!(
        t.db.find_nearest_to_vector(&[1.0, 2.0, 3.0]),
        Err(Error::Decoding(_))
    ));
}

#[test]
fn provider_error_leaves_store_untouched() {
    let t = TestDb::new();
    let err = t.db.insert_texts(["fine", ""]).unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
    assert_eq!(t.db.stats().keys, 0);
    assert_eq!(t.db.stats().version, 0);
}
