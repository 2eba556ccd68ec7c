//! Metadata validation and consistency checking.
//!
//! Checks that a collection's live generation agrees with itself:
//! vector count, chunk records, `meta.json`, and bytes on disk.
//! Unlike opening a collection, validation reads the artifacts
//! leniently and reports every problem instead of the first.

use crate::core::error::Result;
use crate::core::storage::chunk_store;
use crate::core::storage::collection::calculate_directory_size;
use crate::core::storage::vector_index::FlatIndex;
use crate::core::storage::StorageManager;
use crate::core::types::Chunk;
use serde::{Deserialize, Serialize};

/// Tolerance between recorded and measured size (meta.json itself
/// is written after the size is recorded)
const SIZE_TOLERANCE: u64 = 1024 * 1024;

/// Metadata validation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Collection validated
    pub collection_id: String,
    pub generation: String,

    /// Metadata values
    pub metadata_chunks: usize,
    pub metadata_size: u64,

    /// Actual measured values
    pub vector_count: Option<usize>,
    pub record_count: Option<usize>,
    pub actual_size: u64,

    /// Validation results
    pub counts_match: bool,
    pub ids_sequential: bool,
    pub pages_valid: bool,
    pub size_matches: bool,
    pub is_consistent: bool,

    /// Human-readable description of each failed check
    pub issues: Vec<String>,

    /// Validation timestamp
    pub validated_at: String,
}

/// Metadata validator for collection consistency checks
pub struct MetadataValidator<'a> {
    storage_manager: &'a StorageManager,
}

impl<'a> MetadataValidator<'a> {
    /// Create a new metadata validator
    pub fn new(storage_manager: &'a StorageManager) -> Self {
        Self { storage_manager }
    }

    /// Validate the live generation of a collection
    ///
    /// Checks:
    /// - Vector count, record count and `chunks_indexed` agree
    /// - Record `i` has `chunk_id == i`
    /// - Page ranges are 1-based, ordered, and within `pages_indexed`
    /// - Size on disk matches metadata
    pub fn validate_collection(&self, collection_id: &str) -> Result<ValidationReport> {
        let metadata = self.storage_manager.get_collection_metadata(collection_id)?;
        let (index_path, chunks_path, _) = self.storage_manager.artifact_paths(collection_id)?;
        let mut issues = Vec::new();

        let vector_count = match FlatIndex::read_from(&index_path) {
            Ok(index) => {
                if index.dimension() != metadata.dimension {
                    issues.push(format!(
                        "index dimension {} differs from metadata dimension {}",
                        index.dimension(),
                        metadata.dimension
                    ));
                }
                Some(index.len())
            }
            Err(e) => {
                issues.push(format!("vector index unreadable: {e}"));
                None
            }
        };

        let record_count = chunk_store::count_records(&chunks_path).ok();
        if record_count.is_none() {
            issues.push("chunk records unreadable".to_string());
        }

        let counts_match = vector_count.is_some()
            && vector_count == record_count
            && record_count == Some(metadata.chunks_indexed);
        if !counts_match {
            issues.push(format!(
                "counts disagree: {} vectors, {} records, {} in metadata",
                display_count(vector_count),
                display_count(record_count),
                metadata.chunks_indexed
            ));
        }

        let (ids_sequential, pages_valid) = match chunk_store::read_chunks(&chunks_path) {
            Ok(chunks) => {
                let pages_valid = check_pages(&chunks, metadata.pages_indexed, &mut issues);
                (true, pages_valid)
            }
            Err(e) => {
                issues.push(format!("chunk records invalid: {e}"));
                (false, false)
            }
        };

        let actual_size = self.measure_index_size(collection_id, &metadata.generation);
        let size_matches = actual_size.abs_diff(metadata.index_size_bytes) < SIZE_TOLERANCE;
        if !size_matches {
            issues.push(format!(
                "size on disk {} differs from recorded {}",
                actual_size, metadata.index_size_bytes
            ));
        }

        let is_consistent = issues.is_empty();

        Ok(ValidationReport {
            collection_id: collection_id.to_string(),
            generation: metadata.generation,
            metadata_chunks: metadata.chunks_indexed,
            metadata_size: metadata.index_size_bytes,
            vector_count,
            record_count,
            actual_size,
            counts_match,
            ids_sequential,
            pages_valid,
            size_matches,
            is_consistent,
            issues,
            validated_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Measure actual generation size on disk
    fn measure_index_size(&self, collection_id: &str, generation: &str) -> u64 {
        let path = self
            .storage_manager
            .get_collection_path(collection_id)
            .join("generations")
            .join(generation);
        calculate_directory_size(&path)
    }

    /// Validate all collections
    pub fn validate_all_collections(&self) -> Result<Vec<ValidationReport>> {
        let mut reports = Vec::new();

        for collection_id in self.storage_manager.collection_ids()? {
            match self.validate_collection(&collection_id) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!("Failed to validate collection '{}': {}", collection_id, e);
                }
            }
        }

        Ok(reports)
    }
}

fn check_pages(chunks: &[Chunk], pages_indexed: usize, issues: &mut Vec<String>) -> bool {
    let mut valid = true;
    for chunk in chunks {
        if chunk.page_start == 0
            || chunk.page_start > chunk.page_end
            || chunk.page_end as usize > pages_indexed
        {
            issues.push(format!(
                "chunk {} has page range {}..{} outside 1..{}",
                chunk.chunk_id, chunk.page_start, chunk.page_end, pages_indexed
            ));
            valid = false;
        }
    }
    valid
}

fn display_count(count: Option<usize>) -> String {
    count.map_or_else(|| "?".to_string(), |c| c.to_string())
}
