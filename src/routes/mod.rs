//! API Routes
//!
//! - `GET /` - Service description
//! - `GET /health` - Health check
//! - `POST /query` - Run the research and visualization pipeline

pub mod health;
pub mod query;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let allowed_origins = state.config.server.cors_allowed_origins.clone();

    let router = Router::new()
        .merge(health::router(state.clone()))
        .merge(query::router(state))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &allowed_origins)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use crate::agents::test_support::scripted_llm;
    use crate::agents::{PipelineOrchestrator, ResearchAgent, VisualizationAgent};
    use crate::config::tests::test_llm_config;
    use crate::config::{Config, ServerConfig};
    use crate::models::AppState;

    /// State whose agents answer with fixed replies
    pub(crate) fn test_state(research_reply: &str, visualization_reply: &str) -> AppState {
        let (research_llm, _) = scripted_llm(research_reply);
        let (viz_llm, _) = scripted_llm(visualization_reply);

        AppState {
            config: Config {
                server: ServerConfig {
                    port: 8000,
                    host: "127.0.0.1".to_string(),
                    cors_allowed_origins: vec!["*".to_string()],
                },
                llm: test_llm_config("pplx-test"),
            },
            orchestrator: Arc::new(PipelineOrchestrator::new(
                ResearchAgent::new(research_llm, false),
                VisualizationAgent::new(viz_llm),
            )),
        }
    }
}
