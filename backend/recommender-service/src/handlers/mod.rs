/// Recommendation API Handlers
///
/// Thin HTTP surface over the engine: one unified recommendation route
/// (learning path behind a switch, mirroring the upstream API contract),
/// plus liveness endpoints.
use actix_web::{get, post, web, HttpResponse};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{problem_url, sorted_tags, LearningPath, Recommendation};
use crate::services::RecommendationEngine;

/// Handler state. The engine slot is populated exactly once after startup
/// loading succeeds; until then every request is refused.
#[derive(Default)]
pub struct EngineState {
    pub engine: OnceCell<Arc<RecommendationEngine>>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(engine: Arc<RecommendationEngine>) -> Self {
        Self {
            engine: OnceCell::with_value(engine),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub problem_id: u32,

    /// Number of recommendations to return (default: 10, max: 100).
    pub top_k: Option<usize>,

    /// Return a learning path instead of a flat recommendation list.
    #[serde(default)]
    pub use_learning_path: bool,

    /// MMR diversification toggle (default: on).
    pub diversify: Option<bool>,

    /// Per-request override of the diversity trade-off, in [0, 1].
    pub lambda: Option<f32>,
}

/// The query problem, normalized for presentation.
#[derive(Debug, Serialize)]
pub struct RequestedProblem {
    pub frontend_id: u32,
    pub title: String,
    pub difficulty: String,
    pub topic_tags: Vec<String>,
    #[serde(rename = "problem_URL")]
    pub problem_url: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub requested_problem: RequestedProblem,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Serialize)]
pub struct LearningPathResponse {
    pub requested_problem: RequestedProblem,
    pub learning_path: LearningPath,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

#[get("/")]
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(RootResponse {
        message: "Problem recommender API running successfully.".to_string(),
    })
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// POST /recommend
/// Unified route for recommendations or a learning path.
#[post("/recommend")]
pub async fn recommend(
    body: web::Json<RecommendRequest>,
    state: web::Data<EngineState>,
) -> Result<HttpResponse> {
    let engine = state
        .engine
        .get()
        .ok_or_else(|| AppError::ServiceUnavailable("engine not ready".to_string()))?;

    if let Some(lambda) = body.lambda {
        if !(0.0..=1.0).contains(&lambda) {
            return Err(AppError::BadRequest(format!(
                "lambda must be in [0, 1], got {}",
                lambda
            )));
        }
    }

    let query_index = engine
        .store()
        .index_of(body.problem_id)
        .ok_or_else(|| AppError::NotFound(format!("Problem ID {} not found", body.problem_id)))?;
    let requested_problem = requested(engine.as_ref(), query_index);

    if body.use_learning_path {
        debug!("Building learning path for problem {}", body.problem_id);
        let learning_path = engine.learning_path(body.problem_id)?;
        return Ok(HttpResponse::Ok().json(LearningPathResponse {
            requested_problem,
            learning_path,
        }));
    }

    let top_k = body.top_k.unwrap_or_else(|| engine.default_top_k()).clamp(1, 100);
    let diversify = body.diversify.unwrap_or(true);
    debug!(
        "Recommending for problem {}, top_k={}, diversify={}",
        body.problem_id, top_k, diversify
    );

    let recommendations = engine.recommend(body.problem_id, top_k, diversify, body.lambda)?;
    Ok(HttpResponse::Ok().json(RecommendResponse {
        requested_problem,
        recommendations,
    }))
}

fn requested(engine: &RecommendationEngine, index: usize) -> RequestedProblem {
    let problem = engine.store().problem(index);
    RequestedProblem {
        frontend_id: problem.frontend_id,
        title: problem.title.clone(),
        difficulty: problem.difficulty.as_str().to_string(),
        topic_tags: sorted_tags(&problem.tags),
        problem_url: problem_url(&problem.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::services::store::{CatalogRecord, ProblemStore};
    use crate::services::HeuristicModel;
    use actix_web::{test, App};

    fn engine() -> Arc<RecommendationEngine> {
        let records = vec![
            CatalogRecord {
                frontend_id: 1,
                title: "Two Sum".to_string(),
                difficulty: Some("Easy".to_string()),
                topic_tags: vec!["array".to_string()],
                acceptance: Some(0.5),
                likes: Some(10.0),
                submission: Some(100.0),
            },
            CatalogRecord {
                frontend_id: 15,
                title: "3Sum".to_string(),
                difficulty: Some("Medium".to_string()),
                topic_tags: vec!["array".to_string(), "two pointers".to_string()],
                acceptance: Some(0.3),
                likes: Some(20.0),
                submission: Some(300.0),
            },
        ];
        let embeddings = vec![vec![1.0, 0.0], vec![0.8, 0.6]];
        let store = Arc::new(ProblemStore::from_parts(records, embeddings).unwrap());
        Arc::new(RecommendationEngine::new(
            store,
            Arc::new(HeuristicModel),
            EngineConfig::default(),
        ))
    }

    #[actix_web::test]
    async fn recommend_returns_ranked_problems() {
        let state = web::Data::new(EngineState::ready(engine()));
        let app = test::init_service(App::new().app_data(state).service(recommend)).await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(serde_json::json!({ "problem_id": 1, "top_k": 5 }))
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["requested_problem"]["frontend_id"], 1);
        assert_eq!(resp["recommendations"].as_array().unwrap().len(), 1);
        assert_eq!(resp["recommendations"][0]["frontend_id"], 15);
        assert_eq!(
            resp["recommendations"][0]["problem_URL"],
            "https://leetcode.com/problems/3sum/"
        );
    }

    #[::core::prelude::v1::test]
    fn ready_state_is_immediately_populated() {
        let state = EngineState::ready(engine());
        assert!(state.engine.get().is_some());

        let empty = EngineState::new();
        assert!(empty.engine.get().is_none());
    }

    #[actix_web::test]
    async fn unknown_problem_is_404() {
        let state = web::Data::new(EngineState::ready(engine()));
        let app = test::init_service(App::new().app_data(state).service(recommend)).await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(serde_json::json!({ "problem_id": 999 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unready_engine_is_503() {
        let state = web::Data::new(EngineState::new());
        let app = test::init_service(App::new().app_data(state).service(recommend)).await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(serde_json::json!({ "problem_id": 1 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[actix_web::test]
    async fn learning_path_switch_returns_buckets() {
        let state = web::Data::new(EngineState::ready(engine()));
        let app = test::init_service(App::new().app_data(state).service(recommend)).await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(serde_json::json!({ "problem_id": 1, "use_learning_path": true }))
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let path = &resp["learning_path"];
        assert!(path["before"].as_array().unwrap().is_empty());
        assert_eq!(path["after"].as_array().unwrap().len(), 1);
        assert_eq!(path["after"][0]["frontend_id"], 15);
    }
}
