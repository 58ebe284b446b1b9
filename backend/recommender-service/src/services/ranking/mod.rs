/// Ranking Module
///
/// Learned relevance scoring for the rerank stage.
///
/// # Architecture
/// - **Model Layer**: opaque batch scorer behind [`RelevanceModel`];
///   production uses an ONNX export run with tract-onnx
/// - **Scoring Layer**: batch prediction plus a deterministic tie-break
///   perturbation so downstream greedy selection has a strict total order
pub mod model;
pub mod scorer;

pub use model::{HeuristicModel, OnnxRankingModel, RelevanceModel};
pub use scorer::{RelevanceScorer, SeededJitter, TieBreak, TIE_BREAK_SEED};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Model loading failed: {0}")]
    ModelLoadError(String),

    #[error("Model inference failed: {0}")]
    InferenceError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, RankingError>;
