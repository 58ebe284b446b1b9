/// Feature Builder
///
/// Turns (query, candidate) pairs into the fixed-length numeric vectors the
/// ranking model was trained on. Column order is part of the model
/// contract and must not change:
///   [embedding similarity, tag overlap, difficulty proximity, popularity gap]
use ndarray::Array2;
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{Candidate, Difficulty};
use crate::services::store::ProblemStore;

/// Width of one rerank feature row.
pub const FEATURE_VECTOR_SIZE: usize = 4;

pub struct FeatureBuilder {
    store: Arc<ProblemStore>,
}

impl FeatureBuilder {
    pub fn new(store: Arc<ProblemStore>) -> Self {
        Self { store }
    }

    /// One feature row per candidate, in candidate order.
    pub fn build(&self, query_index: usize, candidates: &[Candidate]) -> Array2<f32> {
        let query_tags = self.store.tags(query_index);
        let query_difficulty = self.store.problem(query_index).difficulty;
        let query_popularity = self.store.popularity(query_index);

        let mut features = Array2::zeros((candidates.len(), FEATURE_VECTOR_SIZE));
        for (row, candidate) in candidates.iter().enumerate() {
            let tag_sim = tag_jaccard(query_tags, self.store.tags(candidate.index));
            let diff_sim = difficulty_proximity(
                query_difficulty,
                self.store.problem(candidate.index).difficulty,
            );
            let pop_gap = (query_popularity - self.store.popularity(candidate.index)).abs();

            features[[row, 0]] = candidate.similarity;
            features[[row, 1]] = tag_sim;
            features[[row, 2]] = diff_sim;
            features[[row, 3]] = pop_gap;
        }
        features
    }
}

/// Jaccard ratio of two tag sets; 0 when either is empty.
pub fn tag_jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f32 / union as f32
}

/// Step function of the absolute tier distance: 0 -> 1.0, 1 -> 0.7,
/// anything further -> 0.4.
pub fn difficulty_proximity(a: Difficulty, b: Difficulty) -> f32 {
    match (a.ladder() - b.ladder()).abs() {
        0 => 1.0,
        1 => 0.7,
        _ => 0.4,
    }
}
