use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recommender_service::config::Config;
use recommender_service::handlers::{health, recommend, root, EngineState};
use recommender_service::services::RecommendationEngine;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    tracing::info!(
        "Starting {} v{}",
        config.service.service_name,
        env!("CARGO_PKG_VERSION")
    );

    // Load artifacts and assemble the engine. The service must not accept
    // requests over a store or model it could not fully validate.
    let engine = match RecommendationEngine::load(&config.artifacts, config.engine.clone()) {
        Ok(engine) => {
            tracing::info!("Recommendation engine ready");
            Arc::new(engine)
        }
        Err(e) => {
            tracing::error!("Failed to initialize recommendation engine: {:?}", e);
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to initialize recommendation engine: {:?}", e),
            ));
        }
    };

    let state = web::Data::new(EngineState::ready(engine));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(root)
            .service(health)
            .service(recommend)
    })
    .bind(format!("0.0.0.0:{}", config.service.http_port))?
    .run()
    .await
}
