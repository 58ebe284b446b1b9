pub mod diversity;
pub mod engine;
pub mod features;
pub mod learning_path;
pub mod ranking;
pub mod recall;
pub mod store;

pub use diversity::DiversityLayer;
pub use engine::{EngineError, RecommendationEngine};
pub use features::FeatureBuilder;
pub use learning_path::LearningPathAssembler;
pub use ranking::{HeuristicModel, OnnxRankingModel, RelevanceModel, RelevanceScorer};
pub use recall::CandidateGenerator;
pub use store::{ProblemStore, StoreError};
