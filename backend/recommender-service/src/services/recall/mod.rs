/// Candidate Recall
///
/// Retrieval stage of the two-stage retrieve-then-rerank design: one
/// matrix-vector product against the unit-normalized embedding matrix gives
/// cosine similarity to every catalog entry, then a partial selection pulls
/// out the candidate pool without sorting the whole catalog.
use ndarray::Array1;
use std::sync::Arc;

use crate::models::Candidate;
use crate::services::store::ProblemStore;

pub struct CandidateGenerator {
    store: Arc<ProblemStore>,
}

impl CandidateGenerator {
    pub fn new(store: Arc<ProblemStore>) -> Self {
        Self { store }
    }

    /// Top `pool_size` catalog entries by cosine similarity to the query
    /// row, descending, with the query itself excluded. `pool_size` is
    /// clamped to `[1, n - 1]`; a catalog with fewer than two entries
    /// yields an empty pool.
    pub fn retrieve(&self, query_index: usize, pool_size: usize) -> Vec<Candidate> {
        let n = self.store.len();
        if n <= 1 {
            return Vec::new();
        }

        let query = self.store.embedding(query_index);
        let mut sims: Array1<f32> = self.store.embeddings().dot(&query);
        // The query can never be its own candidate.
        sims[query_index] = f32::NEG_INFINITY;

        let m = pool_size.clamp(1, n - 1);
        let pivot = n - m;

        let mut order: Vec<usize> = (0..n).collect();
        // Partition so the m most similar rows occupy order[pivot..].
        order.select_nth_unstable_by(pivot, |&a, &b| sims[a].total_cmp(&sims[b]));

        let mut top: Vec<usize> = order[pivot..].to_vec();
        // Put the subset back in index order, then stable-sort by
        // similarity so ties keep that order.
        top.sort_unstable();
        top.sort_by(|&a, &b| sims[b].total_cmp(&sims[a]));

        top.into_iter()
            .map(|index| Candidate {
                index,
                similarity: sims[index],
            })
            .collect()
    }
}
