//! Exact (flat) vector index.
//!
//! Stores every chunk vector in build order and scores a query
//! against all of them. The similarity metric is fixed when the
//! index is built and written into the file header.
//!
//! # File format (`index.vec`, little-endian)
//!
//! ```text
//! magic     [u8; 4]  "CAVX"
//! version   u32
//! metric    u32      0 = cosine, 1 = inner product
//! dimension u32
//! count     u64
//! vectors   count * dimension * f32
//! ```

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::core::error::{CourseAlignError, Result};
use crate::core::types::SimilarityMetric;

const MAGIC: &[u8; 4] = b"CAVX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 4 + 8;

/// In-memory flat index
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    metric: SimilarityMetric,
    /// Row-major `len * dimension` values
    data: Vec<f32>,
    /// L2 norm of each row, used by cosine scoring
    norms: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize, metric: SimilarityMetric) -> Self {
        Self {
            dimension,
            metric,
            data: Vec::new(),
            norms: Vec::new(),
        }
    }

    /// Build an index from vectors in chunk order
    pub fn from_vectors(
        dimension: usize,
        metric: SimilarityMetric,
        vectors: &[Vec<f32>],
    ) -> Result<Self> {
        let mut index = Self::new(dimension, metric);
        index.data.reserve(vectors.len() * dimension);
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    /// Append one vector; its position is its chunk id
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(CourseAlignError::StorageError(format!(
                "Vector dimension {} does not match index dimension {}",
                vector.len(),
                self.dimension
            )));
        }
        self.data.extend_from_slice(vector);
        self.norms.push(l2_norm(vector));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Score `query` against every vector and return the best `k`
    ///
    /// Results are `(position, score)` in descending score order;
    /// equal scores are ordered by ascending position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(CourseAlignError::Embedding(format!(
                "Query dimension {} does not match index dimension {}; \
                 was the collection built with a different embedding model?",
                query.len(),
                self.dimension
            )));
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|i| (i, self.score(query, query_norm, i)))
            .collect();

        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
        };

        if k < scored.len() {
            if k == 0 {
                return Ok(Vec::new());
            }
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);

        Ok(scored)
    }

    fn score(&self, query: &[f32], query_norm: f32, position: usize) -> f32 {
        let row = &self.data[position * self.dimension..(position + 1) * self.dimension];
        let dot: f32 = row.iter().zip(query).map(|(a, b)| a * b).sum();

        match self.metric {
            SimilarityMetric::InnerProduct => dot,
            SimilarityMetric::Cosine => {
                let denom = self.norms[position] * query_norm;
                if denom > 0.0 {
                    dot / denom
                } else {
                    0.0
                }
            }
        }
    }

    /// Serialize header and vectors
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&self.metric.as_u32().to_le_bytes());
        bytes.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Parse bytes produced by [`FlatIndex::to_bytes`]
    ///
    /// Any header or length problem is reported as `CollectionCorrupt`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..4] != MAGIC {
            return Err(corrupt("vector index header is missing or invalid"));
        }

        let version = read_u32(bytes, 4);
        if version != FORMAT_VERSION {
            return Err(corrupt(&format!(
                "unsupported vector index version {version}"
            )));
        }

        let metric = SimilarityMetric::from_u32(read_u32(bytes, 8))
            .ok_or_else(|| corrupt("unknown similarity metric tag"))?;
        let dimension = read_u32(bytes, 12) as usize;
        let count = u64::from_le_bytes(read_array(bytes, 16)) as usize;

        let expected = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| corrupt("vector index header overflows"))?;
        if bytes.len() != expected {
            return Err(corrupt(&format!(
                "vector index holds {} bytes, header promises {}",
                bytes.len(),
                expected
            )));
        }

        let data: Vec<f32> = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let norms = if dimension == 0 {
            vec![0.0; count]
        } else {
            data.chunks_exact(dimension).map(l2_norm).collect()
        };

        Ok(Self {
            dimension,
            metric,
            data,
            norms,
        })
    }

    /// Write the index to `path` and fsync it
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.to_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(read_array(bytes, offset))
}

fn corrupt(detail: &str) -> CourseAlignError {
    CourseAlignError::CollectionCorrupt(detail.to_string())
}
