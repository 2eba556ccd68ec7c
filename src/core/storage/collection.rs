//! Collection storage management.
//!
//! Each collection (course) owns a directory of immutable
//! generations plus a `CURRENT` pointer naming the live one. A build
//! writes a fresh generation that nothing points at, then swaps
//! `CURRENT` with a single rename. Readers resolve `CURRENT` once
//! and read that generation, so they see the old or the new index
//! and never a mix.

use crate::core::error::{CourseAlignError, Result};
use crate::core::indexer::{BuildOptions, Document, IndexingPipeline, PreparedIndex};
use crate::core::storage::chunk_store;
use crate::core::storage::vector_index::FlatIndex;
use crate::core::types::{BuildSummary, Chunk, SimilarityMetric};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 1;

const CURRENT_FILE: &str = "CURRENT";
const GENERATIONS_DIR: &str = "generations";
const INDEX_FILE: &str = "index.vec";
const CHUNKS_FILE: &str = "chunks.jsonl";
const META_FILE: &str = "meta.json";
const BUILD_LOCK_FILE: &str = "BUILD.lock";

/// Attempts to open a generation that is pruned under a reader
const OPEN_ATTEMPTS: usize = 3;

static COLLECTION_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").expect("collection id pattern is valid")
});

/// Check that a collection id is safe to use as a directory name
pub fn validate_collection_id(collection_id: &str) -> Result<()> {
    if COLLECTION_ID.is_match(collection_id) {
        Ok(())
    } else {
        Err(CourseAlignError::InvalidCollection(format!(
            "'{collection_id}' is not a valid course code \
             (letters, digits, '-' and '_', at most 64 characters)"
        )))
    }
}

/// Chunking parameters a generation was built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_words: usize,
    pub overlap_words: usize,
}

/// Collection metadata (`meta.json` of a generation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_indexed_at: DateTime<Utc>,
    pub generation: String,
    pub source_document: String,
    pub pages_indexed: usize,
    pub chunks_indexed: usize,
    pub dimension: usize,
    pub embedding_model: String,
    pub metric: SimilarityMetric,
    pub chunking: ChunkingConfig,
    pub index_size_bytes: u64,
    pub schema_version: u32,
}

/// A loaded generation: vectors and chunk records side by side
#[derive(Debug)]
pub struct CollectionHandle {
    pub collection_id: String,
    pub generation: String,
    pub metadata: CollectionMetadata,
    pub index: FlatIndex,
    pub chunks: Vec<Chunk>,
}

impl CollectionHandle {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Collection storage manager
pub struct StorageManager {
    /// Root directory for all collections
    storage_root: PathBuf,

    /// Metric recorded into new builds
    metric: SimilarityMetric,
}

/// Exclusive `BUILD.lock` of one collection, removed on drop
///
/// The lock file is shared by every process on the same storage root.
struct BuildGuard {
    path: PathBuf,
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release build lock {:?}: {}", self.path, e);
        }
    }
}

impl StorageManager {
    /// Create a new storage manager
    pub fn new(storage_root: PathBuf) -> Self {
        Self {
            storage_root,
            metric: SimilarityMetric::default(),
        }
    }

    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    fn collections_dir(&self) -> PathBuf {
        self.storage_root.join("collections")
    }

    fn collection_dir(&self, collection_id: &str) -> PathBuf {
        self.collections_dir().join(collection_id)
    }

    fn generation_dir(&self, collection_id: &str, generation: &str) -> PathBuf {
        self.collection_dir(collection_id)
            .join(GENERATIONS_DIR)
            .join(generation)
    }

    /// Get the full path to a collection directory
    pub fn get_collection_path(&self, collection_id: &str) -> PathBuf {
        self.collection_dir(collection_id)
    }

    /// Name of the live generation, or `None` if never built
    pub fn current_generation(&self, collection_id: &str) -> Result<Option<String>> {
        validate_collection_id(collection_id)?;

        let pointer = self.collection_dir(collection_id).join(CURRENT_FILE);
        let contents = match fs::read_to_string(&pointer) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let generation = contents.trim();
        if generation.is_empty()
            || generation.contains(['/', '\\'])
            || generation.starts_with('.')
        {
            return Err(CourseAlignError::CollectionCorrupt(format!(
                "{collection_id}: CURRENT holds an invalid generation name"
            )));
        }

        Ok(Some(generation.to_string()))
    }

    /// Check whether a collection has a live index with both artifacts
    pub fn collection_exists(&self, collection_id: &str) -> bool {
        match self.current_generation(collection_id) {
            Ok(Some(generation)) => {
                let dir = self.generation_dir(collection_id, &generation);
                dir.join(INDEX_FILE).is_file() && dir.join(CHUNKS_FILE).is_file()
            }
            _ => false,
        }
    }

    /// Get metadata of the live generation
    pub fn get_collection_metadata(&self, collection_id: &str) -> Result<CollectionMetadata> {
        let generation = self
            .current_generation(collection_id)?
            .ok_or_else(|| CourseAlignError::CollectionNotFound(collection_id.to_string()))?;
        self.read_metadata(collection_id, &generation)
    }

    fn read_metadata(&self, collection_id: &str, generation: &str) -> Result<CollectionMetadata> {
        let path = self.generation_dir(collection_id, generation).join(META_FILE);
        let contents = read_artifact(collection_id, &path)?;
        serde_json::from_str(&contents).map_err(|e| {
            CourseAlignError::CollectionCorrupt(format!("{collection_id}: unreadable meta.json: {e}"))
        })
    }

    /// Ids of collections that have a `CURRENT` pointer, sorted
    pub fn collection_ids(&self) -> Result<Vec<String>> {
        let collections_dir = self.collections_dir();

        if !collections_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();

        for entry in fs::read_dir(collections_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() && entry.path().join(CURRENT_FILE).is_file() {
                if let Some(collection_id) = entry.file_name().to_str() {
                    if validate_collection_id(collection_id).is_ok() {
                        ids.push(collection_id.to_string());
                    }
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// List metadata of every built collection, sorted by id
    pub fn list_collections(&self) -> Result<Vec<CollectionMetadata>> {
        let mut collections = Vec::new();

        for collection_id in self.collection_ids()? {
            match self.get_collection_metadata(&collection_id) {
                Ok(metadata) => collections.push(metadata),
                Err(e) => tracing::debug!("Skipping collection '{}': {}", collection_id, e),
            }
        }

        Ok(collections)
    }

    /// Load the live generation of a collection
    ///
    /// Fails with `CollectionNotFound` when the collection was never
    /// built or an artifact is missing, and `CollectionCorrupt` when
    /// the vector and record counts disagree.
    pub fn open_collection(&self, collection_id: &str) -> Result<CollectionHandle> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let generation = self
                .current_generation(collection_id)?
                .ok_or_else(|| CourseAlignError::CollectionNotFound(collection_id.to_string()))?;

            match self.open_generation(collection_id, &generation) {
                Err(CourseAlignError::CollectionNotFound(detail)) if attempt < OPEN_ATTEMPTS => {
                    // A rebuild may have pruned this generation after we read CURRENT
                    if self.current_generation(collection_id)?.as_deref() != Some(&generation) {
                        tracing::debug!(
                            "Generation {} of '{}' was replaced while opening, retrying",
                            generation,
                            collection_id
                        );
                        continue;
                    }
                    return Err(CourseAlignError::CollectionNotFound(detail));
                }
                other => return other,
            }
        }
    }

    fn open_generation(&self, collection_id: &str, generation: &str) -> Result<CollectionHandle> {
        let dir = self.generation_dir(collection_id, generation);
        let index_path = dir.join(INDEX_FILE);
        let chunks_path = dir.join(CHUNKS_FILE);

        if !index_path.is_file() || !chunks_path.is_file() {
            return Err(CourseAlignError::CollectionNotFound(format!(
                "{collection_id} (generation {generation} is missing an artifact)"
            )));
        }

        let metadata = self.read_metadata(collection_id, generation)?;
        let index = map_missing(collection_id, FlatIndex::read_from(&index_path))?;
        let chunks = map_missing(collection_id, chunk_store::read_chunks(&chunks_path))?;

        if index.len() != chunks.len() {
            return Err(CourseAlignError::CollectionCorrupt(format!(
                "{collection_id}: {} vectors but {} chunk records",
                index.len(),
                chunks.len()
            )));
        }

        Ok(CollectionHandle {
            collection_id: collection_id.to_string(),
            generation: generation.to_string(),
            metadata,
            index,
            chunks,
        })
    }

    /// Take the collection's build lock for the whole build
    ///
    /// A lock left behind by a killed process must be removed by hand.
    fn acquire_build(&self, collection_id: &str) -> Result<BuildGuard> {
        let dir = self.collection_dir(collection_id);
        fs::create_dir_all(&dir)?;
        let path = dir.join(BUILD_LOCK_FILE);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(CourseAlignError::BuildInProgress(format!(
                    "{collection_id} (lock held at {}; remove it if no build is running)",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let guard = BuildGuard { path };

        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            tracing::debug!("Could not record pid in {:?}: {}", guard.path, e);
        }
        Ok(guard)
    }

    /// Build (or rebuild) a collection from one document
    ///
    /// Extracts, chunks and embeds the document, writes the result to
    /// a new generation, and swaps it live. Any failure before the
    /// swap leaves the previous generation untouched and live.
    pub fn index_document(
        &self,
        collection_id: &str,
        document: &Document,
        pipeline: &IndexingPipeline,
        options: &BuildOptions,
    ) -> Result<BuildSummary> {
        validate_collection_id(collection_id)?;
        let _guard = self.acquire_build(collection_id)?;
        let started = Instant::now();

        tracing::info!(
            "Building collection '{}' from {}",
            collection_id,
            document.name
        );

        let prepared = pipeline.prepare(collection_id, document, options, started)?;
        let previous = self.current_generation(collection_id)?;
        let created_at = previous
            .as_deref()
            .and_then(|g| self.read_metadata(collection_id, g).ok())
            .map(|m| m.created_at);

        let generation = new_generation_name();
        let staging = self.generation_dir(collection_id, &generation);

        let written = self
            .write_generation(
                &staging,
                collection_id,
                &generation,
                document,
                pipeline,
                &prepared,
                created_at,
            )
            .and_then(|metadata| {
                options.checkpoint(started, "swap")?;
                self.swap_current(collection_id, &generation)?;
                Ok(metadata)
            });

        let metadata = match written {
            Ok(metadata) => metadata,
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    tracing::warn!("Failed to remove staging {:?}: {}", staging, cleanup);
                }
                return Err(e);
            }
        };

        self.prune_generations(collection_id, &generation, previous.as_deref());

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Collection '{}' now at generation {} ({} pages, {} chunks) in {}ms",
            collection_id,
            generation,
            metadata.pages_indexed,
            metadata.chunks_indexed,
            duration_ms
        );

        Ok(BuildSummary {
            collection_id: collection_id.to_string(),
            pages_indexed: metadata.pages_indexed,
            chunks_indexed: metadata.chunks_indexed,
            dimension: metadata.dimension,
            generation,
            duration_ms,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn write_generation(
        &self,
        staging: &Path,
        collection_id: &str,
        generation: &str,
        document: &Document,
        pipeline: &IndexingPipeline,
        prepared: &PreparedIndex,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<CollectionMetadata> {
        fs::create_dir_all(staging)?;

        let index = FlatIndex::from_vectors(prepared.dimension, self.metric, &prepared.vectors)?;
        index.write_to(&staging.join(INDEX_FILE))?;
        chunk_store::write_chunks(&staging.join(CHUNKS_FILE), &prepared.chunks)?;

        let now = Utc::now();
        let metadata = CollectionMetadata {
            id: collection_id.to_string(),
            created_at: created_at.unwrap_or(now),
            last_indexed_at: now,
            generation: generation.to_string(),
            source_document: document.name.clone(),
            pages_indexed: prepared.pages_indexed,
            chunks_indexed: prepared.chunks.len(),
            dimension: prepared.dimension,
            embedding_model: prepared.model.clone(),
            metric: self.metric,
            chunking: ChunkingConfig {
                chunk_words: pipeline.chunker().chunk_words(),
                overlap_words: pipeline.chunker().overlap_words(),
            },
            index_size_bytes: calculate_directory_size(staging),
            schema_version: SCHEMA_VERSION,
        };

        let mut meta_file = File::create(staging.join(META_FILE))?;
        meta_file.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())?;
        meta_file.sync_all()?;
        sync_dir(staging);

        Ok(metadata)
    }

    /// Point `CURRENT` at `generation` with write-temp-then-rename
    fn swap_current(&self, collection_id: &str, generation: &str) -> Result<()> {
        let dir = self.collection_dir(collection_id);
        let tmp = dir.join(format!("{CURRENT_FILE}.{generation}.tmp"));

        let mut file = File::create(&tmp)?;
        file.write_all(generation.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, dir.join(CURRENT_FILE))?;
        sync_dir(&dir);

        Ok(())
    }

    /// Remove generations other than the live one and its predecessor
    fn prune_generations(&self, collection_id: &str, live: &str, previous: Option<&str>) {
        let generations_dir = self.collection_dir(collection_id).join(GENERATIONS_DIR);
        let Ok(entries) = fs::read_dir(&generations_dir) else {
            return;
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == live || Some(name) == previous {
                continue;
            }
            match fs::remove_dir_all(entry.path()) {
                Ok(()) => tracing::debug!("Pruned generation {} of '{}'", name, collection_id),
                Err(e) => tracing::warn!(
                    "Failed to prune generation {} of '{}': {}",
                    name,
                    collection_id,
                    e
                ),
            }
        }
    }

    /// Generation directories currently on disk, sorted by name
    pub fn list_generations(&self, collection_id: &str) -> Result<Vec<String>> {
        validate_collection_id(collection_id)?;
        let dir = self.collection_dir(collection_id).join(GENERATIONS_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut generations = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    generations.push(name.to_string());
                }
            }
        }
        generations.sort();
        Ok(generations)
    }

    /// Paths of the live artifacts: (index, chunks, metadata)
    pub fn artifact_paths(&self, collection_id: &str) -> Result<(PathBuf, PathBuf, PathBuf)> {
        let generation = self
            .current_generation(collection_id)?
            .ok_or_else(|| CourseAlignError::CollectionNotFound(collection_id.to_string()))?;
        let dir = self.generation_dir(collection_id, &generation);
        Ok((dir.join(INDEX_FILE), dir.join(CHUNKS_FILE), dir.join(META_FILE)))
    }
}

/// Sortable, unique generation name
fn new_generation_name() -> String {
    let short_id = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        Utc::now().format("%Y%m%dT%H%M%S%6fZ"),
        &short_id[..8]
    )
}

fn read_artifact(collection_id: &str, path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CourseAlignError::CollectionNotFound(
            format!("{collection_id} ({} is missing)", path.display()),
        )),
        Err(e) => Err(e.into()),
    }
}

fn map_missing<T>(collection_id: &str, result: Result<T>) -> Result<T> {
    match result {
        Err(CourseAlignError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => Err(
            CourseAlignError::CollectionNotFound(format!("{collection_id} (artifact missing)")),
        ),
        other => other,
    }
}

/// Best-effort directory fsync so renames and new files are durable
fn sync_dir(path: &Path) {
    if let Ok(dir) = File::open(path) {
        if let Err(e) = dir.sync_all() {
            tracing::debug!("Directory fsync of {:?} failed: {}", path, e);
        }
    }
}

/// Calculate total size of a directory recursively
pub(crate) fn calculate_directory_size(dir_path: &Path) -> u64 {
    if !dir_path.exists() {
        return 0;
    }

    WalkDir::new(dir_path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}
