use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::agents::PipelineOrchestrator;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub orchestrator: Arc<PipelineOrchestrator>,
}

// Chart data produced by the visualization agent

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Timeline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
    /// YYYY-MM-DD, only meaningful for timeline charts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl DataPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub title: String,
    pub description: String,
    pub data: Vec<DataPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalOutput {
    pub insights: String,
    pub visualizations: Vec<Visualization>,
}

// API Request/Response types

pub const QUERY_MIN_LEN: usize = 5;

pub const AMBIGUOUS_QUERY_MESSAGE: &str = "Please provide a clear and specific query about space missions. Example: 'Show me ISRO launches in 2024' or 'Give me 5 graphs about ISRO missions'";

#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(custom(function = "validate_query"))]
    pub query: String,
}

fn validate_query(query: &str) -> Result<(), ValidationError> {
    if query.trim().chars().count() < QUERY_MIN_LEN {
        return Err(ValidationError::new("ambiguous_query"));
    }
    Ok(())
}

/// Envelope returned by `POST /query`
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentResponse {
    pub query: String,
    pub insights: String,
    pub visualizations: Vec<Visualization>,
    pub timestamp: String,
}

impl AgentResponse {
    pub fn new(query: String, output: FinalOutput) -> Self {
        Self {
            query,
            insights: output.insights,
            visualizations: output.visualizations,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub api_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub status: String,
    pub api_key_configured: bool,
    pub agents: Vec<String>,
}
