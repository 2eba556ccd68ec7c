//! Line-delimited chunk metadata (`chunks.jsonl`).
//!
//! One JSON record per line, in chunk id order. Line `i` holds the
//! chunk whose vector is row `i` of the vector index.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::error::{CourseAlignError, Result};
use crate::core::types::Chunk;

/// Write chunks as JSON lines and fsync the file
pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for chunk in chunks {
        serde_json::to_writer(&mut writer, chunk)?;
        writer.write_all(b"\n")?;
    }
    let file = writer
        .into_inner()
        .map_err(|e| CourseAlignError::StorageError(format!("Failed to flush chunks: {e}")))?;
    file.sync_all()?;
    Ok(())
}

/// Read every record, checking that `chunk_id` equals the line index
pub fn read_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let contents = fs::read_to_string(path)?;
    let mut chunks = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let chunk: Chunk = serde_json::from_str(line).map_err(|e| {
            CourseAlignError::CollectionCorrupt(format!(
                "{}: line {} is not a chunk record: {e}",
                path.display(),
                line_no + 1
            ))
        })?;
        if chunk.chunk_id != chunks.len() {
            return Err(CourseAlignError::CollectionCorrupt(format!(
                "{}: record {} has chunk_id {}",
                path.display(),
                chunks.len(),
                chunk.chunk_id
            )));
        }
        chunks.push(chunk);
    }

    Ok(chunks)
}

/// Count records without parsing them
pub fn count_records(path: &Path) -> Result<usize> {
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().filter(|l| !l.trim().is_empty()).count())
}
