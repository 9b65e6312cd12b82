//! Search ordering and empty-collection behavior of the in-memory store.

use std::collections::HashMap;

use askdoc_core::document::Chunk;
use askdoc_core::inmemory::InMemoryVectorStore;
use askdoc_core::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

/// Generate a chunk with a normalized embedding.
fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| Chunk {
            id,
            text,
            embedding,
            metadata: HashMap::new(),
            document_id: "doc_1".to_string(),
        },
    )
}

const DIM: usize = 16;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Search returns at most `top_k` results ordered by non-increasing
    /// cosine similarity.
    #[test]
    fn results_ordered_descending_and_bounded_by_top_k(
        chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
        query in arb_normalized_embedding(DIM),
        top_k in 1usize..25,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (results, unique_count) = rt.block_on(async {
            let store = InMemoryVectorStore::new();
            store.ensure_collection("test", DIM).await.unwrap();

            // Deduplicate chunks by id so upsert does not overwrite.
            let mut deduped: HashMap<String, Chunk> = HashMap::new();
            for chunk in &chunks {
                deduped.entry(chunk.id.clone()).or_insert_with(|| chunk.clone());
            }
            let unique_chunks: Vec<Chunk> = deduped.into_values().collect();
            let count = unique_chunks.len();

            store.upsert("test", &unique_chunks).await.unwrap();
            let results = store.search("test", &query, top_k).await.unwrap();
            (results, count)
        });

        prop_assert!(results.len() <= top_k);
        prop_assert!(results.len() <= unique_count);

        for window in results.windows(2) {
            prop_assert!(
                window[0].score >= window[1].score,
                "results not in descending order: {} < {}",
                window[0].score,
                window[1].score,
            );
        }
    }
}

#[tokio::test]
async fn empty_collection_returns_empty_results() {
    let store = InMemoryVectorStore::new();
    store.ensure_collection("empty", DIM).await.unwrap();

    let results = store.search("empty", &vec![1.0; DIM], 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn unknown_collection_returns_empty_results() {
    let store = InMemoryVectorStore::new();
    let results = store.search("never_created", &vec![1.0; DIM], 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn count_tracks_upserts() {
    let store = InMemoryVectorStore::new();
    assert_eq!(store.count("docs").await.unwrap(), 0);

    store.ensure_collection("docs", DIM).await.unwrap();
    assert_eq!(store.count("docs").await.unwrap(), 0);

    let chunk = Chunk {
        id: "doc_0".to_string(),
        text: "hello".to_string(),
        embedding: vec![1.0; DIM],
        metadata: HashMap::new(),
        document_id: "doc".to_string(),
    };
    store.upsert("docs", std::slice::from_ref(&chunk)).await.unwrap();
    assert_eq!(store.count("docs").await.unwrap(), 1);

    // Same id twice stays one entry.
    store.upsert("docs", &[chunk]).await.unwrap();
    assert_eq!(store.count("docs").await.unwrap(), 1);
}
