use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use scene_core::generation::GenerationService;
use scene_core::settings::EngineSettings;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

mod ai;
mod routes;
mod storage;

use ai::{AnthropicClient, AnthropicComparator, AnthropicGenerator};
use storage::MemoryStore;

const DEFAULT_ADDR: &str = "0.0.0.0:3001";

#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<GenerationService<AnthropicGenerator>>,
    pub comparator: Arc<AnthropicComparator>,
    pub store: Arc<MemoryStore>,
    pub settings: Arc<EngineSettings>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/chat", post(routes::chat))
        .route("/api/objects", post(routes::create_object))
        .route("/api/objects/{id}", get(routes::get_object))
        .route("/api/objects/{id}/placement", put(routes::update_placement))
        .route("/api/objects/{id}/score", post(routes::score_object))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("server=info,scene_core=info")),
        )
        .init();

    let client = AnthropicClient::from_env();
    if !client.has_key() {
        tracing::warn!("ANTHROPIC_API_KEY not set, chat and scoring will fail");
    }

    let state = AppState {
        generation: Arc::new(GenerationService::new(AnthropicGenerator::new(client.clone()))),
        comparator: Arc::new(AnthropicComparator::new(client)),
        store: Arc::new(MemoryStore::new()),
        settings: Arc::new(EngineSettings::load()),
    };

    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("Server running on http://{addr}");
    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("Server error: {e}");
    }
}
