use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, warn};
use validator::Validate;

use crate::models::{AgentResponse, AppState, QueryRequest, AMBIGUOUS_QUERY_MESSAGE};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(process_query))
        .with_state(state)
}

/// POST /query - validate the query and run both agents
pub async fn process_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> AppResult<Json<AgentResponse>> {
    info!(query = %request.query, "New query received");

    if request.validate().is_err() {
        warn!(query = %request.query, "Ambiguous query rejected");
        return Err(AppError::InvalidRequest(AMBIGUOUS_QUERY_MESSAGE.to_string()));
    }

    let output = state.orchestrator.execute(&request.query).await;
    let response = AgentResponse::new(request.query, output);

    info!(
        visualization_count = response.visualizations.len(),
        "Query response ready"
    );

    Ok(Json(response))
}
