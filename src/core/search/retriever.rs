//! Similarity retrieval over a built collection.
//!
//! Embeds query text with the same provider used at build time and
//! ranks every chunk of the collection by the metric recorded in its
//! index. Results carry the full chunk, so citations always come
//! from a retrieved record.

use crate::core::embedding::Embedder;
use crate::core::error::{CourseAlignError, Result};
use crate::core::search::HandleCache;
use crate::core::storage::{CollectionHandle, StorageManager};
use crate::core::types::{QueryResults, RetrievalRequest, RetrievalResponse, ScoredChunk};
use std::sync::Arc;
use std::time::Instant;

/// Retrieval service
pub struct Retriever {
    storage: Arc<StorageManager>,
    cache: HandleCache,
    embedder: Arc<dyn Embedder>,
    default_k: usize,
    max_query_length: usize,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(
        storage: Arc<StorageManager>,
        embedder: Arc<dyn Embedder>,
        default_k: usize,
        max_query_length: usize,
    ) -> Self {
        Self {
            storage,
            cache: HandleCache::new(),
            embedder,
            default_k,
            max_query_length,
        }
    }

    /// Load (or reuse) the live handle of a collection
    pub fn load(&self, collection_id: &str) -> Result<Arc<CollectionHandle>> {
        let handle = self.cache.get(&self.storage, collection_id)?;
        if handle.metadata.embedding_model != self.embedder.model_name() {
            tracing::warn!(
                "Collection '{}' was built with '{}' but queries use '{}'",
                collection_id,
                handle.metadata.embedding_model,
                self.embedder.model_name()
            );
        }
        Ok(handle)
    }

    /// Forget the cached handle of a collection
    pub fn invalidate(&self, collection_id: &str) {
        self.cache.invalidate(collection_id);
    }

    /// Rank the chunks of `handle` against one query
    ///
    /// Returns at most `top_k` chunks in descending score order,
    /// ties broken by ascending `chunk_id`.
    pub fn retrieve(
        &self,
        handle: &CollectionHandle,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        self.validate_query(query)?;
        validate_top_k(top_k)?;

        let vector = self.embedder.embed_one(query)?;
        rank(handle, &vector, top_k)
    }

    /// Rank independently for each query, preserving query order
    ///
    /// All queries are embedded in one provider call. A chunk may
    /// appear in the results of several queries.
    pub fn retrieve_many(
        &self,
        handle: &CollectionHandle,
        queries: &[String],
        top_k_each: usize,
    ) -> Result<Vec<QueryResults>> {
        self.validate_queries(queries, top_k_each)?;

        let vectors = self.embedder.embed(queries)?;
        if vectors.len() != queries.len() {
            return Err(CourseAlignError::Embedding(format!(
                "Mismatch between request and response counts: {} vs {}",
                queries.len(),
                vectors.len()
            )));
        }

        queries
            .iter()
            .zip(vectors.iter())
            .map(|(query, vector)| {
                Ok(QueryResults {
                    query: query.clone(),
                    results: rank(handle, vector, top_k_each)?,
                })
            })
            .collect()
    }

    /// Load a collection by id and answer one query
    pub fn search(&self, request: RetrievalRequest) -> Result<RetrievalResponse> {
        let start = Instant::now();
        let top_k = request.top_k.unwrap_or(self.default_k);

        // Reject bad input before touching storage or the provider
        self.validate_query(&request.query)?;
        validate_top_k(top_k)?;

        let handle = self.load(&request.collection_id)?;
        let results = self.retrieve(&handle, &request.query, top_k)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "Retrieved {} chunks from '{}' in {}ms",
            results.len(),
            request.collection_id,
            duration_ms
        );

        Ok(RetrievalResponse {
            collection_id: request.collection_id,
            query: request.query,
            count: results.len(),
            results,
            duration_ms,
        })
    }

    /// Load a collection by id and answer several queries
    ///
    /// The query list and `top_k_each` are checked before the
    /// collection is loaded, as in [`Retriever::search`].
    pub fn search_many(
        &self,
        collection_id: &str,
        queries: &[String],
        top_k_each: Option<usize>,
    ) -> Result<Vec<QueryResults>> {
        let top_k = top_k_each.unwrap_or(self.default_k);
        self.validate_queries(queries, top_k)?;

        let handle = self.load(collection_id)?;
        self.retrieve_many(&handle, queries, top_k)
    }

    fn validate_queries(&self, queries: &[String], top_k: usize) -> Result<()> {
        if queries.is_empty() {
            return Err(CourseAlignError::InvalidQuery(
                "At least one query is required".to_string(),
            ));
        }
        for query in queries {
            self.validate_query(query)?;
        }
        validate_top_k(top_k)
    }

    fn validate_query(&self, query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(CourseAlignError::InvalidQuery(
                "Query cannot be empty".to_string(),
            ));
        }

        let length = query.chars().count();
        if length > self.max_query_length {
            return Err(CourseAlignError::InvalidQuery(format!(
                "Query is {length} characters, limit is {}",
                self.max_query_length
            )));
        }

        Ok(())
    }
}

fn validate_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(CourseAlignError::InvalidQuery(
            "top_k must be positive".to_string(),
        ));
    }
    Ok(())
}

fn rank(handle: &CollectionHandle, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
    let hits = handle.index.search(vector, top_k)?;

    hits.into_iter()
        .enumerate()
        .map(|(i, (position, score))| {
            let chunk = handle.chunks.get(position).ok_or_else(|| {
                CourseAlignError::CollectionCorrupt(format!(
                    "{}: vector {} has no chunk record",
                    handle.collection_id, position
                ))
            })?;
            Ok(ScoredChunk {
                rank: i + 1,
                score,
                chunk: chunk.clone(),
            })
        })
        .collect()
}
