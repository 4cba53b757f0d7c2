mod common;

use std::collections::BTreeSet;
use std::fs;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use shoprag_core::error::GenerationError;
use shoprag_core::Error;
use shoprag_rag::engine::{NOT_READY_MESSAGE, NO_GENERATOR_MESSAGE, NO_RESULTS_MESSAGE};
use shoprag_rag::retriever::retrieve_chunks;
use shoprag_rag::Retrieval;
use shoprag_vector::store::{CHUNKS_FILE, VECTORS_FILE};
use shoprag_vector::IndexStore;
use tempfile::TempDir;

use common::*;

fn ready_engine(tmp: &TempDir) -> shoprag_rag::RagEngine {
    write_catalog(tmp.path(), &sample_catalog());
    let engine = engine(tmp.path(), Arc::new(KeywordEmbedder::new()), Some(Arc::new(EchoGenerator)));
    engine.initialize().expect("initialize");
    engine
}

#[test]
fn initialize_builds_and_persists_when_no_index_exists() {
    let tmp = TempDir::new().unwrap();
    let engine = ready_engine(&tmp);
    assert!(engine.ready());
    assert!(tmp.path().join("index").join(VECTORS_FILE).is_file());
    assert!(tmp.path().join("index").join(CHUNKS_FILE).is_file());

    let status = engine.status();
    assert_eq!(status.chunks, 12);
    assert_eq!(status.embedder_id.as_deref(), Some("keyword:test"));
    assert!(status.generator_available);
}

#[test]
fn initialize_prefers_the_persisted_index() {
    let tmp = TempDir::new().unwrap();
    ready_engine(&tmp).shutdown();
    fs::remove_file(tmp.path().join("catalog.csv")).unwrap();

    let embedder = Arc::new(KeywordEmbedder::new());
    let engine = engine(tmp.path(), embedder.clone(), None);
    engine.initialize().expect("load persisted index");
    assert!(engine.ready());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0, "no re-embedding on load");
}

#[test]
fn engine_is_not_ready_before_initialize() {
    let tmp = TempDir::new().unwrap();
    let engine = engine(tmp.path(), Arc::new(KeywordEmbedder::new()), Some(Arc::new(EchoGenerator)));
    assert!(!engine.ready());
    assert_eq!(engine.answer("anything").answer, NOT_READY_MESSAGE);
    assert!(engine.categories().is_empty());
    assert!(engine.suggestions(None, None).unwrap().suggestions.is_empty());
    assert!(matches!(engine.retrieve("x"), Retrieval::Unavailable(_)));
}

#[test]
fn missing_catalog_leaves_engine_not_ready() {
    let tmp = TempDir::new().unwrap();
    let engine = engine(tmp.path(), Arc::new(KeywordEmbedder::new()), None);
    let err = engine.initialize().unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
    assert!(!engine.ready());
}

#[test]
fn corrupt_index_is_fatal_to_startup() {
    let tmp = TempDir::new().unwrap();
    ready_engine(&tmp);
    fs::remove_file(tmp.path().join("index").join(VECTORS_FILE)).unwrap();

    let engine = engine(tmp.path(), Arc::new(KeywordEmbedder::new()), None);
    let err = engine.initialize().unwrap_err();
    assert!(matches!(err, Error::CorruptIndex(_)), "got {err:?}");
    assert!(!engine.ready());
}

#[test]
fn categories_reflect_only_surviving_rows() {
    let tmp = TempDir::new().unwrap();
    let body = format!(
        "{}{}{}",
        row("Birkin Bag", "Handbags", "Ostrich leather", "Apple leather", "$350"),
        row("Fur Hat", "", "Fox fur", "Acrylic", "$60"),
        row("Silk Scarf", "Accessories", "Silk", "Tencel", "$45"),
    );
    write_catalog(tmp.path(), &body);
    let engine = engine(tmp.path(), Arc::new(KeywordEmbedder::new()), None);
    engine.initialize().unwrap();

    assert_eq!(engine.status().chunks, 2);
    let expected: BTreeSet<String> = ["Accessories", "Handbags"].iter().map(|s| s.to_string()).collect();
    assert_eq!(engine.categories(), expected);
}

#[test]
fn ostrich_question_is_grounded_in_the_ostrich_row() {
    let tmp = TempDir::new().unwrap();
    let engine = ready_engine(&tmp);

    let prompt = engine.answer("ostrich leather bags").answer;
    assert!(prompt.contains("Product: Birkin Bag (Handbags)"), "prompt was:\n{prompt}");
    assert!(prompt.contains("Materials from animals: Ostrich leather"));
    assert!(prompt.contains("User query: ostrich leather bags"));
    assert_eq!(prompt.matches("Product: ").count(), 5, "top_k chunks in context");
}

#[test]
fn empty_query_still_embeds_and_retrieves() {
    let tmp = TempDir::new().unwrap();
    write_catalog(tmp.path(), &sample_catalog());
    let embedder = Arc::new(KeywordEmbedder::new());
    let engine = engine(tmp.path(), embedder.clone(), None);
    engine.initialize().unwrap();
    let before = embedder.calls.load(Ordering::SeqCst);

    match engine.retrieve("") {
        Retrieval::Found(chunks) => assert_eq!(chunks.len(), 5),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(embedder.calls.load(Ordering::SeqCst), before + 1);
    assert_eq!(embedder.seen.lock().unwrap().last().map(String::as_str), Some(""));
}

#[test]
fn missing_generator_degrades_to_fixed_message() {
    let tmp = TempDir::new().unwrap();
    write_catalog(tmp.path(), &sample_catalog());
    let engine = engine(tmp.path(), Arc::new(KeywordEmbedder::new()), None);
    engine.initialize().unwrap();
    assert_eq!(engine.answer("silk").answer, NO_GENERATOR_MESSAGE);
}

#[test]
fn generation_failure_is_reported_with_its_reason() {
    let tmp = TempDir::new().unwrap();
    write_catalog(tmp.path(), &sample_catalog());
    let engine = engine(
        tmp.path(),
        Arc::new(KeywordEmbedder::new()),
        Some(Arc::new(FailingGenerator(GenerationError::RateLimited("quota exceeded".into())))),
    );
    engine.initialize().unwrap();

    let answer = engine.answer("silk").answer;
    assert!(answer.starts_with("Sorry, I encountered an error while generating an answer: "), "{answer}");
    assert!(answer.contains("quota exceeded"));
}

#[test]
fn retrieval_failure_degrades_to_no_results_message() {
    let tmp = TempDir::new().unwrap();
    let built = ready_engine(&tmp);
    built.shutdown();

    // Same embedder id, so the persisted index loads; queries then fail to embed.
    let engine = engine(tmp.path(), Arc::new(FailingEmbedder), Some(Arc::new(EchoGenerator)));
    engine.initialize().unwrap();
    assert!(matches!(engine.retrieve("silk"), Retrieval::Unavailable(_)));
    assert_eq!(engine.answer("silk").answer, NO_RESULTS_MESSAGE);
}

#[test]
fn embedder_failure_during_build_is_an_error() {
    let tmp = TempDir::new().unwrap();
    write_catalog(tmp.path(), &sample_catalog());
    let engine = engine(tmp.path(), Arc::new(FailingEmbedder), None);
    assert!(matches!(engine.initialize(), Err(Error::Embedding(_))));
    assert!(!engine.ready());
}

#[test]
fn rebuild_picks_up_catalog_changes_and_reload_follows_the_store() {
    let tmp = TempDir::new().unwrap();
    let a = ready_engine(&tmp);
    let b = engine(tmp.path(), Arc::new(KeywordEmbedder::new()), None);
    b.initialize().unwrap();

    write_catalog(tmp.path(), &row("Silk Scarf", "Accessories", "Silk", "Tencel", "$45"));
    a.rebuild().unwrap();
    assert_eq!(a.status().chunks, 1);
    assert_eq!(b.status().chunks, 12, "other engines keep their snapshot until reload");

    b.reload().unwrap();
    assert_eq!(b.status().chunks, 1);
    assert_eq!(b.categories().into_iter().collect::<Vec<_>>(), vec!["Accessories".to_string()]);
}

#[test]
fn shutdown_releases_the_index() {
    let tmp = TempDir::new().unwrap();
    let engine = ready_engine(&tmp);
    engine.shutdown();
    assert!(!engine.ready());
    assert_eq!(engine.answer("silk").answer, NOT_READY_MESSAGE);
}

#[test]
fn queries_run_concurrently_with_rebuilds() {
    let tmp = TempDir::new().unwrap();
    let engine = ready_engine(&tmp);

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..20 {
                    match engine.retrieve("wool coat") {
                        Retrieval::Found(chunks) => assert_eq!(chunks.len(), 5),
                        other => panic!("unexpected {other:?}"),
                    }
                    assert_eq!(engine.categories().len(), 5);
                }
            });
        }
        s.spawn(|| {
            for _ in 0..3 {
                engine.rebuild().unwrap();
            }
        });
    });
    assert!(engine.ready());
}

#[test]
fn overlapping_rebuilds_leave_a_loadable_pair_matching_the_snapshot() {
    let tmp = TempDir::new().unwrap();
    let engine = ready_engine(&tmp);
    let one_row = format!("{HEADER}\n{}", row("Silk Scarf", "Accessories", "Silk", "Tencel", "$45"));
    let full = format!("{HEADER}\n{}", sample_catalog());
    let staged = tmp.path().join("catalog.csv.next");

    for round in 0..10 {
        let body = if round % 2 == 0 { &one_row } else { &full };
        std::thread::scope(|s| {
            let first = s.spawn(|| engine.rebuild());
            let second = s.spawn(|| engine.rebuild());
            s.spawn(|| {
                // Rename so a concurrent reader sees either the old or the new catalog.
                fs::write(&staged, body).unwrap();
                fs::rename(&staged, tmp.path().join("catalog.csv")).unwrap();
            });
            first.join().unwrap().expect("first rebuild");
            second.join().unwrap().expect("second rebuild");
        });

        let stored = IndexStore::new(tmp.path().join("index")).load().expect("persisted pair loads");
        assert_eq!(stored.len(), engine.status().chunks, "round {round}");
    }
}

#[test]
fn list_retrieval_is_empty_when_the_embedder_fails() {
    let tmp = TempDir::new().unwrap();
    let engine = ready_engine(&tmp);
    let status = engine.status();
    assert!(status.ready);

    let catalog = engine.build_from_catalog().unwrap();
    assert_eq!(retrieve_chunks(&FailingEmbedder, &catalog, "ostrich bag", 5), Vec::new());
    let found = retrieve_chunks(&KeywordEmbedder::new(), &catalog, "ostrich bag", 5);
    assert_eq!(found.len(), 5);
    assert_eq!(found[0].metadata.product_name, "Birkin Bag");
}
