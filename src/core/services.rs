//! Unified service container for CourseAlign
//!
//! Provides shared access to all core services and the two outward
//! operations: `build(collection_id, document)` and
//! `retrieve(collection_id, query, top_k)`.

use crate::core::config::Config;
use crate::core::embedding::{self, Embedder};
use crate::core::error::{CourseAlignError, Result};
use crate::core::indexer::{BuildOptions, Document, IndexingPipeline};
use crate::core::search::Retriever;
use crate::core::storage::{validate_collection_id, StorageManager};
use crate::core::types::{
    BuildSummary, CourseStatus, QueryResults, RetrievalRequest, RetrievalResponse,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Unified services container
///
/// All adapters use this same struct for service access.
#[derive(Clone)]
pub struct Services {
    /// Storage manager for collection builds and reads
    pub storage: Arc<StorageManager>,

    /// Retrieval service with its handle cache
    pub retriever: Arc<Retriever>,

    /// Embedding provider shared by builds and queries
    pub embedder: Arc<dyn Embedder>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl Services {
    /// Create services from configuration
    pub fn new(config: Config) -> Result<Self> {
        let embedder = embedding::from_config(&config.embedding)?;
        Ok(Self::with_embedder(config, embedder))
    }

    /// Create services around an explicit embedding provider
    pub fn with_embedder(config: Config, embedder: Arc<dyn Embedder>) -> Self {
        let storage = Arc::new(
            StorageManager::new(config.storage.index_dir.clone()).with_metric(config.search.metric),
        );

        let retriever = Arc::new(Retriever::new(
            Arc::clone(&storage),
            Arc::clone(&embedder),
            config.search.default_k,
            config.search.max_query_length,
        ));

        Self {
            storage,
            retriever,
            embedder,
            config: Arc::new(config),
        }
    }

    /// Create an IndexingPipeline, optionally overriding the window
    pub fn create_pipeline(
        &self,
        chunk_words: Option<usize>,
        overlap_words: Option<usize>,
    ) -> Result<IndexingPipeline> {
        IndexingPipeline::new(
            chunk_words.unwrap_or(self.config.indexing.chunk_words),
            overlap_words.unwrap_or(self.config.indexing.overlap_words),
            Arc::clone(&self.embedder),
            self.config.embedding.batch_size,
        )
    }

    /// Reject unknown courses when the registry is mandatory
    pub fn check_course(&self, collection_id: &str) -> Result<()> {
        validate_collection_id(collection_id)?;
        if self.config.storage.require_registered_courses
            && !self.config.is_registered(collection_id)
        {
            return Err(CourseAlignError::InvalidCollection(format!(
                "'{collection_id}' is not in the course registry"
            )));
        }
        Ok(())
    }

    /// Build a collection with configured chunking and limits
    pub fn build(&self, collection_id: &str, document: &Document) -> Result<BuildSummary> {
        let pipeline = self.create_pipeline(None, None)?;
        self.build_with(collection_id, document, &pipeline, &BuildOptions::default())
    }

    /// Build a collection with an explicit pipeline and options
    ///
    /// Without an explicit timeout the configured build timeout applies.
    pub fn build_with(
        &self,
        collection_id: &str,
        document: &Document,
        pipeline: &IndexingPipeline,
        options: &BuildOptions,
    ) -> Result<BuildSummary> {
        self.check_course(collection_id)?;

        let mut options = options.clone();
        if options.timeout.is_none() {
            options.timeout = Some(self.config.limits.build_timeout());
        }

        let result = self
            .storage
            .index_document(collection_id, document, pipeline, &options);
        if result.is_ok() {
            self.retriever.invalidate(collection_id);
        }
        result
    }

    /// Retrieve the best `top_k` chunks (default from config) for a query
    pub fn retrieve(
        &self,
        collection_id: &str,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<RetrievalResponse> {
        self.retriever.search(RetrievalRequest {
            collection_id: collection_id.to_string(),
            query: query.to_string(),
            top_k,
        })
    }

    /// Retrieve independently for several queries against one collection
    pub fn retrieve_many(
        &self,
        collection_id: &str,
        queries: &[String],
        top_k_each: Option<usize>,
    ) -> Result<Vec<QueryResults>> {
        self.retriever
            .search_many(collection_id, queries, top_k_each)
    }

    /// Status of every registered course and every built collection
    pub fn course_statuses(&self) -> Result<Vec<CourseStatus>> {
        let built = self.storage.list_collections()?;
        let mut codes: BTreeSet<String> = self.config.courses.keys().cloned().collect();
        codes.extend(built.iter().map(|m| m.id.clone()));

        Ok(codes
            .into_iter()
            .map(|code| {
                let metadata = built.iter().find(|m| m.id == code);
                CourseStatus {
                    title: self.config.course_title(&code).map(str::to_string),
                    indexed: metadata.is_some(),
                    chunks: metadata.map(|m| m.chunks_indexed),
                    registered: self.config.is_registered(&code),
                    course_code: code,
                }
            })
            .collect())
    }
}
