//! Research Agent
//!
//! First pipeline stage. Asks a low-temperature LLM for factual material
//! about the user's space mission query. Any LLM error is absorbed here and
//! reported as `ResearchOutcome::Failed`.

use crate::llm::provider::LLM;
use tracing::{debug, error, info, warn};

/// Typed form of the research step's `(text, failed)` result
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchOutcome {
    Completed(String),
    Failed,
}

impl ResearchOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            ResearchOutcome::Completed(text) => Some(text),
            ResearchOutcome::Failed => None,
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self, ResearchOutcome::Failed)
    }
}

pub struct ResearchAgent {
    llm: LLM,
    mock_mode: bool,
}

impl ResearchAgent {
    /// `mock_mode` is set when no usable API key is configured
    pub fn new(llm: LLM, mock_mode: bool) -> Self {
        Self { llm, mock_mode }
    }

    pub fn is_mock(&self) -> bool {
        self.mock_mode
    }

    pub async fn run(&self, query: &str) -> ResearchOutcome {
        info!(query = %query, "Research agent started");

        if self.mock_mode {
            warn!("Using mock research response (API key not configured)");
            return ResearchOutcome::Completed(Self::mock_response(query));
        }

        let prompt = Self::create_research_prompt(query);

        match self.llm.invoke(&prompt).await {
            Ok(text) => {
                debug!(research = %text, "Research agent raw output");
                info!(response_len = text.len(), "Research agent completed");
                ResearchOutcome::Completed(text)
            }
            Err(e) => {
                error!(error = %e, "Research agent failed");
                ResearchOutcome::Failed
            }
        }
    }

    /// Deterministic stand-in text used in mock mode
    pub fn mock_response(query: &str) -> String {
        format!(
            "Mock data for: {query}\n\n\
            Example Space Mission Information:\n\
            - Recent launches and missions\n\
            - Agency comparisons and statistics\n\
            - Budget and success rate data\n\
            - Timeline of key events\n\n\
            Please add your Perplexity API key for real-time data."
        )
    }

    fn create_research_prompt(query: &str) -> String {
        format!(r#"You are a space mission research expert with access to real-time data.

Query: {query}

Search and provide comprehensive, detailed information about this query including:
1. Mission details (agency, date, objectives, status)
2. Key statistics and numerical data
3. Notable achievements or challenges
4. Comparative data if multiple agencies/missions are mentioned
5. Recent updates and current status

Be thorough and provide as much factual data as possible. Include specific numbers, dates, and metrics."#,
            query = query
        )
    }
}
