/// Learning Path Assembler
///
/// Reuses recall + features + scoring once, then splits the ranked
/// candidates into difficulty buckets relative to the query problem:
/// strictly easier problems come `before`, same-tier problems are
/// `similar`, strictly harder ones come `after`. Ranking order is preserved
/// inside each bucket; every bucket is capped at [`BUCKET_LIMIT`] entries.
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{sorted_tags, LearningPath, PathEntry, Problem};
use crate::services::features::FeatureBuilder;
use crate::services::ranking::{RelevanceScorer, Result};
use crate::services::recall::CandidateGenerator;
use crate::services::store::ProblemStore;

/// Maximum entries per bucket.
pub const BUCKET_LIMIT: usize = 10;

const REASON_BEFORE: &str = "helps build core concepts before attempting this problem";
const REASON_SIMILAR: &str = "shares a similar approach and complexity";
const REASON_AFTER: &str = "builds upon the same ideas at an advanced level";

pub struct LearningPathAssembler {
    store: Arc<ProblemStore>,
    recall: CandidateGenerator,
    features: FeatureBuilder,
    scorer: Arc<RelevanceScorer>,
    candidate_pool: usize,
}

impl LearningPathAssembler {
    pub fn new(
        store: Arc<ProblemStore>,
        scorer: Arc<RelevanceScorer>,
        candidate_pool: usize,
    ) -> Self {
        Self {
            recall: CandidateGenerator::new(store.clone()),
            features: FeatureBuilder::new(store.clone()),
            store,
            scorer,
            candidate_pool,
        }
    }

    /// Build the three-bucket path for the problem at `query_index`.
    pub fn build_path(&self, query_index: usize) -> Result<LearningPath> {
        let candidates = self.recall.retrieve(query_index, self.candidate_pool);
        if candidates.is_empty() {
            return Ok(LearningPath::default());
        }

        let features = self.features.build(query_index, &candidates);
        let scores = self.scorer.score(&features)?;

        // Relevance-ranked candidate list, descending. Ties keep candidate
        // order, matching the recommendation path.
        let mut ranked: Vec<(usize, f32)> = candidates
            .iter()
            .zip(scores.iter())
            .map(|(c, &s)| (c.index, s))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let query = self.store.problem(query_index);
        let mut path = LearningPath::default();
        for (index, score) in ranked {
            let candidate = self.store.problem(index);
            let relation = candidate.difficulty.cmp(&query.difficulty);
            let bucket = match relation {
                Ordering::Less => &mut path.before,
                Ordering::Equal => &mut path.similar,
                Ordering::Greater => &mut path.after,
            };
            if bucket.len() >= BUCKET_LIMIT {
                continue;
            }
            let reason = rationale(relation, &query.tags, &candidate.tags);
            bucket.push(entry(candidate, reason, score));
        }

        Ok(path)
    }
}

fn entry(problem: &Problem, reason: String, score: f32) -> PathEntry {
    PathEntry {
        frontend_id: problem.frontend_id,
        title: problem.title.clone(),
        difficulty: problem.difficulty.as_str().to_string(),
        tags: sorted_tags(&problem.tags),
        reason,
        score,
    }
}

/// Bucket-specific rationale, with up to two shared topics appended when
/// the tag sets intersect. Shared tags are sorted so the wording is stable.
fn rationale(
    relation: Ordering,
    query_tags: &HashSet<String>,
    candidate_tags: &HashSet<String>,
) -> String {
    let mut message = match relation {
        Ordering::Less => REASON_BEFORE.to_string(),
        Ordering::Equal => REASON_SIMILAR.to_string(),
        Ordering::Greater => REASON_AFTER.to_string(),
    };

    let mut shared: Vec<&String> = query_tags.intersection(candidate_tags).collect();
    if !shared.is_empty() {
        shared.sort();
        let topics: Vec<&str> = shared.iter().take(2).map(|s| s.as_str()).collect();
        message.push_str(&format!(" (topics: {})", topics.join(", ")));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ranking::HeuristicModel;
    use crate::services::store::CatalogRecord;

    fn record(id: u32, difficulty: &str, tags: &[&str]) -> CatalogRecord {
        CatalogRecord {
            frontend_id: id,
            title: format!("Problem {}", id),
            difficulty: Some(difficulty.to_string()),
            topic_tags: tags.iter().map(|t| t.to_string()).collect(),
            acceptance: Some(0.5),
            likes: Some(id as f32),
            submission: Some(100.0),
        }
    }

    fn assembler(records: Vec<CatalogRecord>, embeddings: Vec<Vec<f32>>) -> LearningPathAssembler {
        let store = Arc::new(ProblemStore::from_parts(records, embeddings).unwrap());
        let scorer = Arc::new(RelevanceScorer::new(Arc::new(HeuristicModel)));
        LearningPathAssembler::new(store, scorer, 400)
    }

    #[test]
    fn buckets_partition_by_tier() {
        let assembler = assembler(
            vec![
                record(1, "Medium", &["dp"]),
                record(2, "Easy", &["dp"]),
                record(3, "Medium", &["dp"]),
                record(4, "Hard", &["dp"]),
                record(5, "Easy", &[]),
            ],
            vec![
                vec![1.0, 0.0],
                vec![0.9, 0.1],
                vec![0.8, 0.2],
                vec![0.7, 0.3],
                vec![0.6, 0.4],
            ],
        );

        let path = assembler.build_path(0).unwrap();
        let total = path.before.len() + path.similar.len() + path.after.len();
        assert_eq!(total, 4, "every candidate lands in exactly one bucket");
        assert_eq!(path.before.len(), 2);
        assert_eq!(path.similar.len(), 1);
        assert_eq!(path.after.len(), 1);
        assert!(path.before.iter().all(|e| e.difficulty == "Easy"));
        assert!(path.after.iter().all(|e| e.difficulty == "Hard"));
    }

    #[test]
    fn hardest_problem_has_empty_after_bucket() {
        let assembler = assembler(
            vec![
                record(1, "Hard", &["graph"]),
                record(2, "Easy", &["graph"]),
                record(3, "Medium", &["graph"]),
            ],
            vec![
                vec![1.0, 0.0],
                vec![0.9, 0.1],
                vec![0.8, 0.2],
            ],
        );

        let path = assembler.build_path(0).unwrap();
        assert!(path.after.is_empty());
        assert_eq!(path.before.len() + path.similar.len(), 2);
    }

    #[test]
    fn buckets_are_truncated() {
        let mut records = vec![record(1, "Medium", &[])];
        let mut embeddings = vec![vec![1.0, 0.0]];
        for id in 2..=15 {
            records.push(record(id, "Easy", &[]));
            let angle = id as f32 * 0.01;
            embeddings.push(vec![angle.cos(), angle.sin()]);
        }

        let path = assembler(records, embeddings).build_path(0).unwrap();
        assert_eq!(path.before.len(), BUCKET_LIMIT);
    }

    #[test]
    fn bucket_order_follows_relevance_ranking() {
        let assembler = assembler(
            vec![
                record(1, "Medium", &["dp"]),
                record(2, "Easy", &["dp"]),
                record(3, "Easy", &[]),
            ],
            vec![
                vec![1.0, 0.0],
                vec![0.9, 0.1],
                // Closer in embedding space but no tag overlap.
                vec![0.95, 0.05],
            ],
        );

        let path = assembler.build_path(0).unwrap();
        assert_eq!(path.before.len(), 2);
        for pair in path.before.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn rationale_names_shared_topics() {
        let query: HashSet<String> = ["dp", "graph", "greedy"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let candidate: HashSet<String> = ["dp", "graph", "math"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let reason = rationale(Ordering::Less, &query, &candidate);
        assert_eq!(
            reason,
            format!("{} (topics: dp, graph)", REASON_BEFORE)
        );

        let no_overlap = rationale(Ordering::Greater, &query, &HashSet::new());
        assert_eq!(no_overlap, REASON_AFTER);
    }
}
