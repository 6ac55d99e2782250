//! Agent System
//!
//! Two agents run in strict sequence for every query:
//!
//! - **Research Agent**: gathers factual mission data (low temperature)
//! - **Visualization Agent**: turns that text into chart specifications (high temperature)
//!
//! ## Pipeline Overview
//!
//! ```text
//! User Query
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Research   │  → Raw research text, or a failure flag
//! │   Agent     │
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │Visualization│  → insights + charts, or a degraded output
//! │   Agent     │
//! └─────────────┘
//!      │
//!      ▼
//!  FinalOutput
//! ```
//!
//! The orchestrator never returns an error: each agent converts its own
//! failures into a valid `FinalOutput`.

pub mod research;
pub mod visualization;

pub use research::{ResearchAgent, ResearchOutcome};
pub use visualization::{parse_chart_payload, Degradation, PayloadError, VisualizationAgent};

use crate::config::LLMConfig;
use crate::llm::provider::{create_adapter, LLM};
use crate::models::FinalOutput;
use crate::types::AppResult;
use tracing::{error, info, info_span, warn, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    #[default]
    Idle,
    Researching,
    Visualizing,
    Done,
}

/// Per-request state threaded through both agents. Created fresh for each
/// query and dropped once the response is built.
#[derive(Debug)]
pub struct PipelineState {
    query: String,
    research_text: Option<String>,
    research_failed: bool,
    final_output: Option<FinalOutput>,
    stage: PipelineStage,
}

impl PipelineState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            research_text: None,
            research_failed: false,
            final_output: None,
            stage: PipelineStage::Idle,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn research_text(&self) -> Option<&str> {
        self.research_text.as_deref()
    }

    pub fn research_failed(&self) -> bool {
        self.research_failed
    }

    pub fn final_output(&self) -> Option<&FinalOutput> {
        self.final_output.as_ref()
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn begin_research(&mut self) {
        self.transition(PipelineStage::Idle, PipelineStage::Researching);
    }

    pub fn record_research(&mut self, outcome: ResearchOutcome) {
        self.transition(PipelineStage::Researching, PipelineStage::Visualizing);
        match outcome {
            ResearchOutcome::Completed(text) => {
                self.research_text = Some(text);
                self.research_failed = false;
            }
            ResearchOutcome::Failed => {
                self.research_text = None;
                self.research_failed = true;
            }
        }
    }

    /// Store the terminal output. Only the first call takes effect.
    pub fn record_output(&mut self, output: FinalOutput) {
        self.transition(PipelineStage::Visualizing, PipelineStage::Done);
        if self.final_output.is_some() {
            warn!("Final output already recorded, ignoring replacement");
            return;
        }
        self.final_output = Some(output);
    }

    /// Consume the state, yielding the final output. A state that never
    /// reached `Done` degrades to the unexpected-error output.
    pub fn into_output(self) -> FinalOutput {
        match (self.stage, self.final_output) {
            (PipelineStage::Done, Some(output)) => output,
            (stage, _) => {
                error!(stage = ?stage, "Pipeline finished without a final output");
                Degradation::UnexpectedError.output()
            }
        }
    }

    fn transition(&mut self, from: PipelineStage, to: PipelineStage) {
        if self.stage != from {
            warn!(expected = ?from, actual = ?self.stage, next = ?to, "Out-of-order pipeline transition");
        }
        self.stage = to;
    }
}

/// Runs research then visualization for one query at a time per call.
/// Holds only immutable agents, so one instance serves concurrent requests.
pub struct PipelineOrchestrator {
    research: ResearchAgent,
    visualization: VisualizationAgent,
}

impl PipelineOrchestrator {
    pub fn new(research: ResearchAgent, visualization: VisualizationAgent) -> Self {
        Self {
            research,
            visualization,
        }
    }

    /// Build both agents over one adapter. Only the research agent honours
    /// mock mode; the visualization agent always calls the API.
    pub fn from_config(config: &LLMConfig) -> AppResult<Self> {
        let adapter = create_adapter(config)?;

        let research_llm = LLM::with_temperature(adapter.clone(), config, config.research_temperature);
        let visualization_llm = LLM::with_temperature(adapter, config, config.visualization_temperature);

        Ok(Self::new(
            ResearchAgent::new(research_llm, !config.has_credentials()),
            VisualizationAgent::new(visualization_llm),
        ))
    }

    pub fn is_mock(&self) -> bool {
        self.research.is_mock()
    }

    pub async fn execute(&self, query: &str) -> FinalOutput {
        let request_id = uuid::Uuid::new_v4();
        let span = info_span!("pipeline", %request_id);

        async move {
            info!(query_len = query.len(), "Starting agent pipeline");
            let mut state = PipelineState::new(query);

            state.begin_research();
            let outcome = self.research.run(state.query()).await;
            state.record_research(outcome);

            let output = self
                .visualization
                .run(state.query(), state.research_text(), state.research_failed())
                .await;
            state.record_output(output);

            let output = state.into_output();
            info!(
                visualization_count = output.visualizations.len(),
                "Agent pipeline complete"
            );
            output
        }
        .instrument(span)
        .await
    }
}
