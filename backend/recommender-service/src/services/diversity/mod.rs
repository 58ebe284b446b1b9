/// Diversity Layer
///
/// Greedy MMR (Maximal Marginal Relevance) selection over the scored
/// candidate pool. Each step scores every remaining candidate as
/// `(1 - lambda) * relevance - lambda * max_cosine_to_selected` and takes
/// the maximum; lambda trades relevance for novelty and lambda = 0
/// degenerates to plain top-k by relevance.
use ndarray::{Array1, ArrayView2};

use crate::models::Candidate;

pub struct DiversityLayer {
    lambda: f32,
}

impl DiversityLayer {
    /// `lambda` is clamped to [0, 1].
    pub fn new(lambda: f32) -> Self {
        Self {
            lambda: lambda.clamp(0.0, 1.0),
        }
    }

    /// Greedy MMR pick of at most `k` candidates. Returns positions into
    /// `candidates`, in selection order; an empty pool yields an empty
    /// selection. `embeddings` is the full store matrix, indexed by the
    /// candidates' row indices.
    pub fn select(
        &self,
        candidates: &[Candidate],
        relevance: &Array1<f32>,
        embeddings: ArrayView2<'_, f32>,
        k: usize,
    ) -> Vec<usize> {
        let count = candidates.len();
        if count == 0 || k == 0 {
            return Vec::new();
        }

        let mut selected: Vec<usize> = Vec::with_capacity(k.min(count));
        let mut remaining: Vec<usize> = (0..count).collect();
        // Running max cosine similarity of each candidate to the selected
        // set, updated incrementally after every pick.
        let mut max_sim_to_selected = vec![f32::NEG_INFINITY; count];

        while selected.len() < k && !remaining.is_empty() {
            let pick_pos = if selected.is_empty() {
                argmax_by(&remaining, |pos| relevance[pos])
            } else {
                argmax_by(&remaining, |pos| {
                    (1.0 - self.lambda) * relevance[pos]
                        - self.lambda * max_sim_to_selected[pos]
                })
            };

            let pick = remaining.swap_remove(pick_pos);
            let pick_row = embeddings.row(candidates[pick].index);
            for &pos in &remaining {
                let sim = embeddings.row(candidates[pos].index).dot(&pick_row);
                if sim > max_sim_to_selected[pos] {
                    max_sim_to_selected[pos] = sim;
                }
            }
            selected.push(pick);
        }

        selected
    }

    /// Non-diversified selection: top `k` by relevance, descending. Ties
    /// keep candidate order.
    pub fn top_k(relevance: &Array1<f32>, k: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..relevance.len()).collect();
        order.sort_by(|&a, &b| relevance[b].total_cmp(&relevance[a]));
        order.truncate(k);
        order
    }
}

fn argmax_by(positions: &[usize], score: impl Fn(usize) -> f32) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (i, &pos) in positions.iter().enumerate() {
        let s = score(pos);
        if s > best_score {
            best_score = s;
            best = i;
        }
    }
    best
}
