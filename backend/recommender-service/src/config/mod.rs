use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub artifacts: ArtifactConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub http_port: u16,
    pub service_name: String,
}

/// Startup artifacts produced by the offline pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    pub catalog_path: String,
    pub embeddings_path: String,
    pub model_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Candidate pool for standard recommendations.
    pub candidate_pool: usize,
    /// Larger pool for learning paths, since the output splits three ways.
    pub path_candidate_pool: usize,
    /// MMR relevance/novelty trade-off, in [0, 1].
    pub mmr_lambda: f32,
    /// Recommendations returned when the request does not specify top_k.
    pub default_top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidate_pool: 300,
            path_candidate_pool: 400,
            mmr_lambda: 0.6,
            default_top_k: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();

        Ok(Config {
            service: ServiceConfig {
                http_port: env::var("HTTP_PORT")
                    .unwrap_or_else(|_| "8012".to_string())
                    .parse()
                    .expect("HTTP_PORT must be a valid u16"),
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "recommender-service".to_string()),
            },
            artifacts: ArtifactConfig {
                catalog_path: env::var("CATALOG_PATH")
                    .unwrap_or_else(|_| "data/processed/catalog.json".to_string()),
                embeddings_path: env::var("EMBEDDINGS_PATH")
                    .unwrap_or_else(|_| "models/problem_embeddings.json".to_string()),
                model_path: env::var("MODEL_PATH")
                    .unwrap_or_else(|_| "models/lambdarank_model.onnx".to_string()),
            },
            engine: EngineConfig {
                candidate_pool: env::var("CANDIDATE_POOL")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .expect("CANDIDATE_POOL must be a valid usize"),
                path_candidate_pool: env::var("PATH_CANDIDATE_POOL")
                    .unwrap_or_else(|_| "400".to_string())
                    .parse()
                    .expect("PATH_CANDIDATE_POOL must be a valid usize"),
                mmr_lambda: env::var("MMR_LAMBDA")
                    .unwrap_or_else(|_| "0.6".to_string())
                    .parse()
                    .expect("MMR_LAMBDA must be a valid f32"),
                default_top_k: env::var("DEFAULT_TOP_K")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("DEFAULT_TOP_K must be a valid usize"),
            },
        })
    }
}
