/// Catalog & Embedding Store
///
/// Loads the problem catalog and its row-aligned embedding matrix once at
/// startup, validates them together, and exposes read-only lookups. The
/// matrix row `i` always describes the `i`-th catalog entry; both sides are
/// built and validated in the same pass so the alignment cannot drift.
///
/// Supported embedding file formats:
///   - `.json`: JSON array of rows, `[[f32; D]; N]`
///   - `.bin` / `.bincode`: bincode serialized `Vec<Vec<f32>>`
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Difficulty, Problem};

/// Popularity blend weights over min-max normalized acceptance / likes /
/// submission counts.
const POPULARITY_WEIGHTS: (f32, f32, f32) = (0.3, 0.5, 0.2);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Artifact not found: {0}")]
    ArtifactMissing(PathBuf),

    #[error("Failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported embeddings format: {0}")]
    UnsupportedFormat(String),

    #[error("Embedding rows ({embedding_rows}) != catalog rows ({catalog_rows}); regenerate embeddings")]
    RowCountMismatch {
        embedding_rows: usize,
        catalog_rows: usize,
    },

    #[error("Embeddings contain a non-finite value at row {row}")]
    NonFiniteEmbedding { row: usize },

    #[error("Embedding rows have inconsistent dimensions (row {row} has {found}, expected {expected})")]
    RaggedEmbedding {
        row: usize,
        found: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// One raw catalog row as produced by the offline pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    pub frontend_id: u32,
    pub title: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub topic_tags: Vec<String>,
    #[serde(default)]
    pub acceptance: Option<f32>,
    #[serde(default)]
    pub likes: Option<f32>,
    #[serde(default)]
    pub submission: Option<f32>,
}

/// Read-only joint structure over the catalog and its embedding matrix.
#[derive(Debug)]
pub struct ProblemStore {
    problems: Vec<Problem>,
    embeddings: Array2<f32>,
    by_id: HashMap<u32, usize>,
}

impl ProblemStore {
    /// Load and validate the catalog and embedding artifacts.
    ///
    /// Any failure here is a fatal startup error: the service must not
    /// serve traffic over a store it could not fully validate.
    pub fn load(catalog_path: &Path, embeddings_path: &Path) -> Result<Self> {
        let records = load_catalog(catalog_path)?;
        let embeddings = load_embeddings(embeddings_path)?;
        let store = Self::from_parts(records, embeddings)?;
        info!(
            "Loaded {} problems, embeddings {:?}",
            store.len(),
            store.embeddings.dim()
        );
        Ok(store)
    }

    /// Build a store from already-decoded parts. Validation and
    /// normalization are identical to [`ProblemStore::load`].
    pub fn from_parts(records: Vec<CatalogRecord>, raw_embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if raw_embeddings.len() != records.len() {
            return Err(StoreError::RowCountMismatch {
                embedding_rows: raw_embeddings.len(),
                catalog_rows: records.len(),
            });
        }

        let embeddings = to_matrix(raw_embeddings)?;
        let embeddings = normalize_rows(embeddings);
        let popularity = popularity_scores(&records);

        let mut problems = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());
        for (row, record) in records.into_iter().enumerate() {
            let tags: HashSet<String> = record
                .topic_tags
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();

            if by_id.insert(record.frontend_id, row).is_some() {
                warn!(
                    "Duplicate frontend_id {} in catalog, keeping row {}",
                    record.frontend_id, row
                );
            }

            problems.push(Problem {
                frontend_id: record.frontend_id,
                title: record.title,
                difficulty: Difficulty::parse(record.difficulty.as_deref()),
                tags,
                popularity: popularity[row],
            });
        }

        Ok(Self {
            problems,
            embeddings,
            by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Row index of a problem by its stable identifier.
    pub fn index_of(&self, frontend_id: u32) -> Option<usize> {
        self.by_id.get(&frontend_id).copied()
    }

    pub fn problem(&self, index: usize) -> &Problem {
        &self.problems[index]
    }

    pub fn embedding(&self, index: usize) -> ArrayView1<'_, f32> {
        self.embeddings.row(index)
    }

    pub fn embeddings(&self) -> ArrayView2<'_, f32> {
        self.embeddings.view()
    }

    pub fn popularity(&self, index: usize) -> f32 {
        self.problems[index].popularity
    }

    pub fn tags(&self, index: usize) -> &HashSet<String> {
        &self.problems[index].tags
    }
}

fn open_artifact(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(StoreError::ArtifactMissing(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

fn load_catalog(path: &Path) -> Result<Vec<CatalogRecord>> {
    let reader = open_artifact(path)?;
    serde_json::from_reader(reader).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn load_embeddings(path: &Path) -> Result<Vec<Vec<f32>>> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match extension {
        "json" => {
            let reader = open_artifact(path)?;
            serde_json::from_reader(reader).map_err(|e| StoreError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
        "bin" | "bincode" => {
            let reader = open_artifact(path)?;
            bincode::deserialize_from(reader).map_err(|e| StoreError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
        other => Err(StoreError::UnsupportedFormat(other.to_string())),
    }
}

/// Pack row vectors into a dense matrix, rejecting ragged or non-finite
/// input. An empty catalog yields a 0xD matrix.
fn to_matrix(rows: Vec<Vec<f32>>) -> Result<Array2<f32>> {
    let n = rows.len();
    let dim = rows.first().map(|r| r.len()).unwrap_or(0);

    let mut flat = Vec::with_capacity(n * dim);
    for (row, values) in rows.iter().enumerate() {
        if values.len() != dim {
            return Err(StoreError::RaggedEmbedding {
                row,
                found: values.len(),
                expected: dim,
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(StoreError::NonFiniteEmbedding { row });
        }
        flat.extend_from_slice(values);
    }

    Array2::from_shape_vec((n, dim), flat).map_err(|e| StoreError::Parse {
        path: PathBuf::new(),
        message: e.to_string(),
    })
}

/// Scale every row to unit length so dot products are cosine similarities.
/// Rows with exactly zero norm are left untouched rather than divided by
/// zero.
fn normalize_rows(mut embeddings: Array2<f32>) -> Array2<f32> {
    for mut row in embeddings.rows_mut() {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
    embeddings
}

/// Weighted blend of independently min-max normalized engagement signals.
/// A signal with zero range contributes a constant 0; non-finite raw values
/// are treated as 0 before normalization.
fn popularity_scores(records: &[CatalogRecord]) -> Vec<f32> {
    let acceptance = minmax(records.iter().map(|r| r.acceptance.unwrap_or(0.0)));
    let likes = minmax(records.iter().map(|r| r.likes.unwrap_or(0.0)));
    let submissions = minmax(records.iter().map(|r| r.submission.unwrap_or(0.0)));

    let (w_acc, w_likes, w_subs) = POPULARITY_WEIGHTS;
    (0..records.len())
        .map(|i| w_acc * acceptance[i] + w_likes * likes[i] + w_subs * submissions[i])
        .collect()
}

fn minmax(values: impl Iterator<Item = f32>) -> Vec<f32> {
    let values: Vec<f32> = values
        .map(|v| if v.is_finite() { v } else { 0.0 })
        .collect();
    if values.is_empty() {
        return values;
    }

    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if range > 0.0 {
        values.into_iter().map(|v| (v - min) / range).collect()
    } else {
        vec![0.0; values.len()]
    }
}
