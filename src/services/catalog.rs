//! In-memory embedding catalog.
//!
//! The catalog ships as two files: a JSON metadata document
//! `{ titles, norms, vectorSize }` and a flat blob of little-endian f32 values,
//! one row of `vectorSize` floats per title in the same order. A
//! [`CatalogHandle`] is built once and is read-only afterwards.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Errors raised while loading or validating a catalog
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("catalog vector size must be greater than zero")]
    EmptyDimension,

    #[error("catalog has {titles} titles but {norms} norms")]
    NormCountMismatch { titles: usize, norms: usize },

    #[error("vector blob length {0} is not a multiple of 4 bytes")]
    TruncatedBlob(usize),

    #[error("{titles} titles of size {dimension} overflow the vector length")]
    DimensionOverflow { titles: usize, dimension: usize },

    #[error("expected {expected} vector values, found {found}")]
    VectorCountMismatch { expected: usize, found: usize },

    #[error("catalog contains a non-finite value at row {0}")]
    NonFinite(usize),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogMetadata {
    titles: Vec<String>,
    norms: Vec<f32>,
    vector_size: usize,
}

/// Normalizes a title or slug into a catalog lookup key
pub fn lookup_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Immutable catalog of movie embeddings, stored column-wise
///
/// `titles`, `norms` and the rows of `vectors` are index-aligned.
#[derive(Debug)]
pub struct CatalogHandle {
    titles: Vec<String>,
    norms: Vec<f32>,
    vectors: Vec<f32>,
    dimension: usize,
    index: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
}

impl CatalogHandle {
    /// Loads the metadata document and vector blob from disk
    pub async fn load(
        metadata_path: impl AsRef<Path>,
        vectors_path: impl AsRef<Path>,
    ) -> Result<Self, CatalogError> {
        let metadata = read_file(metadata_path.as_ref()).await?;
        let blob = read_file(vectors_path.as_ref()).await?;

        let catalog = Self::from_bytes(&metadata, &blob)?;

        tracing::info!(
            titles = catalog.len(),
            dimension = catalog.dimension(),
            "Catalog loaded"
        );

        Ok(catalog)
    }

    /// Builds a catalog from the raw metadata JSON and vector blob
    pub fn from_bytes(metadata_json: &[u8], blob: &[u8]) -> Result<Self, CatalogError> {
        let metadata: CatalogMetadata = serde_json::from_slice(metadata_json)?;

        if blob.len() % 4 != 0 {
            return Err(CatalogError::TruncatedBlob(blob.len()));
        }
        let vectors: Vec<f32> = blob
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Self::from_parts(metadata.titles, metadata.norms, metadata.vector_size, vectors)
    }

    /// Builds a catalog from already-decoded columns
    pub fn from_parts(
        titles: Vec<String>,
        norms: Vec<f32>,
        dimension: usize,
        vectors: Vec<f32>,
    ) -> Result<Self, CatalogError> {
        if dimension == 0 {
            return Err(CatalogError::EmptyDimension);
        }
        if norms.len() != titles.len() {
            return Err(CatalogError::NormCountMismatch {
                titles: titles.len(),
                norms: norms.len(),
            });
        }
        let expected = titles
            .len()
            .checked_mul(dimension)
            .ok_or(CatalogError::DimensionOverflow {
                titles: titles.len(),
                dimension,
            })?;
        if vectors.len() != expected {
            return Err(CatalogError::VectorCountMismatch {
                expected,
                found: vectors.len(),
            });
        }
        if let Some(row) = norms.iter().position(|n| !n.is_finite()) {
            return Err(CatalogError::NonFinite(row));
        }
        if let Some(pos) = vectors.iter().position(|v| !v.is_finite()) {
            return Err(CatalogError::NonFinite(pos / dimension));
        }

        // Later duplicates overwrite earlier ones
        let index = titles
            .iter()
            .enumerate()
            .map(|(i, title)| (lookup_key(title), i))
            .collect();

        Ok(Self {
            titles,
            norms,
            vectors,
            dimension,
            index,
            loaded_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Embedding dimensionality shared by every entry
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn title(&self, idx: usize) -> &str {
        &self.titles[idx]
    }

    pub fn norm(&self, idx: usize) -> f32 {
        self.norms[idx]
    }

    pub fn vector(&self, idx: usize) -> &[f32] {
        let start = idx * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    /// Case-insensitive, whitespace-trimmed slug lookup
    pub fn lookup(&self, slug: &str) -> Option<usize> {
        self.index.get(&lookup_key(slug)).copied()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, CatalogError> {
    tokio::fs::read(path).await.map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })
}
