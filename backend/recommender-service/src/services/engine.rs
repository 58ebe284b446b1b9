/// Recommendation Engine
///
/// The explicitly constructed context object the request layer works
/// against. It owns the read-only store, the ranking model, and the
/// pipeline layers; after construction nothing in it is ever mutated, so
/// one instance is shared across all requests without coordination.
///
/// # Workflow
/// 1. Recall: cosine retrieval of the candidate pool
/// 2. Features: fixed 4-column rerank features per candidate
/// 3. Scoring: model inference + deterministic tie-break
/// 4. Selection: MMR diversification (or plain top-k)
use anyhow::Context;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::{ArtifactConfig, EngineConfig};
use crate::models::{problem_url, sorted_tags, LearningPath, Recommendation};
use crate::services::diversity::DiversityLayer;
use crate::services::features::FeatureBuilder;
use crate::services::learning_path::LearningPathAssembler;
use crate::services::ranking::{
    OnnxRankingModel, RankingError, RelevanceModel, RelevanceScorer,
};
use crate::services::recall::CandidateGenerator;
use crate::services::store::ProblemStore;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Problem ID {0} not found")]
    NotFound(u32),

    #[error(transparent)]
    Ranking(#[from] RankingError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

pub struct RecommendationEngine {
    store: Arc<ProblemStore>,
    recall: CandidateGenerator,
    features: FeatureBuilder,
    scorer: Arc<RelevanceScorer>,
    path_assembler: LearningPathAssembler,
    config: EngineConfig,
}

impl RecommendationEngine {
    /// Load every startup artifact and assemble the engine. Any failure
    /// here is fatal; the caller must not serve traffic without a fully
    /// constructed engine.
    pub fn load(artifacts: &ArtifactConfig, config: EngineConfig) -> anyhow::Result<Self> {
        let store = Arc::new(
            ProblemStore::load(
                artifacts.catalog_path.as_ref(),
                artifacts.embeddings_path.as_ref(),
            )
            .context("failed to load catalog/embedding artifacts")?,
        );
        let model = OnnxRankingModel::load(&artifacts.model_path)
            .context("failed to load ranking model")?;
        Ok(Self::new(store, Arc::new(model), config))
    }

    /// Assemble the engine from an already-built store and model. This is
    /// the seam for substituting any batch scorer.
    pub fn new(
        store: Arc<ProblemStore>,
        model: Arc<dyn RelevanceModel>,
        config: EngineConfig,
    ) -> Self {
        let scorer = Arc::new(RelevanceScorer::new(model));
        Self {
            recall: CandidateGenerator::new(store.clone()),
            features: FeatureBuilder::new(store.clone()),
            path_assembler: LearningPathAssembler::new(
                store.clone(),
                scorer.clone(),
                config.path_candidate_pool,
            ),
            store,
            scorer,
            config,
        }
    }

    pub fn store(&self) -> &ProblemStore {
        &self.store
    }

    pub fn default_top_k(&self) -> usize {
        self.config.default_top_k
    }

    /// Ranked recommendations for a query problem. `lambda` overrides the
    /// configured diversity trade-off for this request only.
    pub fn recommend(
        &self,
        problem_id: u32,
        k: usize,
        diversify: bool,
        lambda: Option<f32>,
    ) -> Result<Vec<Recommendation>> {
        let query_index = self
            .store
            .index_of(problem_id)
            .ok_or(EngineError::NotFound(problem_id))?;

        let candidates = self.recall.retrieve(query_index, self.config.candidate_pool);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        debug!(
            "query_index={}, candidates={}, k={}, diversify={}",
            query_index,
            candidates.len(),
            k,
            diversify
        );

        let features = self.features.build(query_index, &candidates);
        let scores = self.scorer.score(&features)?;

        let picked = if diversify {
            let lambda = lambda.unwrap_or(self.config.mmr_lambda);
            DiversityLayer::new(lambda).select(
                &candidates,
                &scores,
                self.store.embeddings(),
                k,
            )
        } else {
            DiversityLayer::top_k(&scores, k)
        };

        Ok(picked
            .into_iter()
            .map(|pos| {
                let problem = self.store.problem(candidates[pos].index);
                Recommendation {
                    frontend_id: problem.frontend_id,
                    title: problem.title.clone(),
                    difficulty: problem.difficulty.as_str().to_string(),
                    topic_tags: sorted_tags(&problem.tags),
                    problem_url: problem_url(&problem.title),
                    score: scores[pos],
                }
            })
            .collect())
    }

    /// Difficulty-stratified learning path for a query problem.
    pub fn learning_path(&self, problem_id: u32) -> Result<LearningPath> {
        let query_index = self
            .store
            .index_of(problem_id)
            .ok_or(EngineError::NotFound(problem_id))?;
        Ok(self.path_assembler.build_path(query_index)?)
    }
}
