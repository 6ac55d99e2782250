//! Visualization Agent
//!
//! Second pipeline stage. Turns the research text into chart specifications
//! using a high-temperature LLM and strict JSON instructions. Every failure
//! mode resolves to a fixed `FinalOutput`:
//!
//! | Path               | Trigger                                  | Visualizations        |
//! |--------------------|------------------------------------------|-----------------------|
//! | upstream failure   | research failed or produced no text      | none                  |
//! | malformed output   | reply is not JSON or misses a field      | one placeholder chart |
//! | unexpected error   | the LLM call itself failed or timed out  | none                  |

use std::ops::RangeInclusive;

use crate::llm::provider::LLM;
use crate::models::{ChartType, DataPoint, FinalOutput, Visualization};
use tracing::{debug, error, info, warn};

pub const UPSTREAM_FAILURE_INSIGHTS: &str = "Unable to fetch data. Please try again.";
pub const MALFORMED_OUTPUT_INSIGHTS: &str =
    "Unable to parse visualization data properly. The system encountered a formatting issue.";
pub const UNEXPECTED_ERROR_INSIGHTS: &str = "Unable to generate visualizations due to an error.";

/// Data point count the prompt asks for; not enforced
const EXPECTED_POINTS: RangeInclusive<usize> = 3..=8;

/// The degraded results the visualization step can fall back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    UpstreamFailure,
    MalformedOutput,
    UnexpectedError,
}

impl Degradation {
    pub fn output(self) -> FinalOutput {
        match self {
            Degradation::UpstreamFailure => FinalOutput {
                insights: UPSTREAM_FAILURE_INSIGHTS.to_string(),
                visualizations: vec![],
            },
            Degradation::MalformedOutput => FinalOutput {
                insights: MALFORMED_OUTPUT_INSIGHTS.to_string(),
                visualizations: vec![Visualization {
                    chart_type: ChartType::Bar,
                    title: "Data Processing Error".to_string(),
                    description: "Please try rephrasing your query".to_string(),
                    data: vec![DataPoint::new("Error", 1.0)],
                }],
            },
            Degradation::UnexpectedError => FinalOutput {
                insights: UNEXPECTED_ERROR_INSIGHTS.to_string(),
                visualizations: vec![],
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("empty response")]
    Empty,

    #[error("invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("schema mismatch: {0}")]
    Schema(serde_json::Error),
}

/// Parse an LLM reply into chart data.
///
/// Candidates are tried in order: a ```` ```json ```` fenced block, any other
/// fenced block, then the whole trimmed reply. The first candidate that
/// decodes wins; otherwise the error from the first candidate is returned.
pub fn parse_chart_payload(raw: &str) -> Result<FinalOutput, PayloadError> {
    let mut first_error = None;

    for candidate in json_candidates(raw) {
        match decode_final_output(candidate) {
            Ok(output) => return Ok(output),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.unwrap_or(PayloadError::Empty))
}

fn json_candidates(raw: &str) -> Vec<&str> {
    let mut candidates = Vec::with_capacity(3);

    if let Some(block) = fenced_block(raw, "```json") {
        candidates.push(block);
    }
    if let Some(block) = fenced_block(raw, "```") {
        let block = strip_info_string(block);
        if !candidates.contains(&block) {
            candidates.push(block);
        }
    }

    let whole = raw.trim();
    if !candidates.contains(&whole) {
        candidates.push(whole);
    }

    candidates.retain(|c| !c.is_empty());
    candidates
}

/// Text between the first `opener` and the next closing fence (or the end
/// of input when the fence is never closed)
fn fenced_block<'a>(raw: &'a str, opener: &str) -> Option<&'a str> {
    let start = raw.find(opener)? + opener.len();
    let rest = &raw[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Drop a language tag such as `JSON` or `javascript` from the first line
fn strip_info_string(block: &str) -> &str {
    match block.split_once('\n') {
        Some((first, rest))
            if !first.trim().is_empty()
                && first.trim().chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            rest.trim()
        }
        _ => block,
    }
}

fn decode_final_output(candidate: &str) -> Result<FinalOutput, PayloadError> {
    let value: serde_json::Value =
        serde_json::from_str(candidate).map_err(PayloadError::InvalidJson)?;

    for key in ["insights", "visualizations"] {
        if value.get(key).is_none() {
            return Err(PayloadError::MissingKey(key));
        }
    }

    serde_json::from_value(value).map_err(PayloadError::Schema)
}

pub struct VisualizationAgent {
    llm: LLM,
}

impl VisualizationAgent {
    pub fn new(llm: LLM) -> Self {
        Self { llm }
    }

    pub async fn run(
        &self,
        query: &str,
        research_text: Option<&str>,
        research_failed: bool,
    ) -> FinalOutput {
        info!(query = %query, "Visualization agent started");

        let research = match research_text {
            Some(text) if !research_failed && !text.trim().is_empty() => text,
            _ => {
                warn!("Research step failed or returned no data, skipping visualization");
                return Degradation::UpstreamFailure.output();
            }
        };

        let prompt = Self::create_visualization_prompt(query, research);

        let raw = match self.llm.invoke(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Visualization generation failed");
                return Degradation::UnexpectedError.output();
            }
        };

        debug!(raw = %raw, "Visualization agent raw output");

        match parse_chart_payload(&raw) {
            Ok(output) => {
                Self::warn_on_unusual_shapes(&output);
                info!(
                    visualization_count = output.visualizations.len(),
                    "Visualization agent completed"
                );
                output
            }
            Err(e) => {
                warn!(error = %e, "Could not parse visualization payload, using placeholder chart");
                Degradation::MalformedOutput.output()
            }
        }
    }

    fn warn_on_unusual_shapes(output: &FinalOutput) {
        for viz in &output.visualizations {
            if !EXPECTED_POINTS.contains(&viz.data.len()) {
                warn!(
                    title = %viz.title,
                    points = viz.data.len(),
                    "Visualization data point count outside the requested range"
                );
            }
            if viz.chart_type == ChartType::Timeline && viz.data.iter().any(|p| p.date.is_none()) {
                warn!(title = %viz.title, "Timeline visualization has points without a date");
            }
        }
    }

    fn create_visualization_prompt(query: &str, research: &str) -> String {
        format!(r#"You are a data visualization expert. Based on the following information, analyze the Original Query: {query} and create the specified number of different visualizations.

Data from Research:
{research}

CRITICAL INSTRUCTIONS:
1. Create Exactly the asked number of visualization in the Original Query: {query} based on the data above
2. Use ONLY data mentioned in the research above - DO NOT make up data
3. Each visualization must have actual data points with realistic values from the research
4. Return ONLY valid JSON, no other text

Available visualization types: "bar", "line", "pie", "scatter", "timeline"

Return STRICTLY in this JSON format:
{{
  "insights": "2-3 sentence summary of the key findings from the data",
  "visualizations": [
    {{
      "type": "bar",
      "title": "Clear descriptive title",
      "description": "What this visualization shows",
      "data": [
        {{"label": "Item 1", "value": 100}},
        {{"label": "Item 2", "value": 150}},
        {{"label": "Item 3", "value": 200}}
      ]
    }},
    {{
      "type": "line",
      "title": "Another visualization title",
      "description": "What this shows",
      "data": [
        {{"label": "2020", "value": 50}},
        {{"label": "2021", "value": 75}},
        {{"label": "2022", "value": 100}}
      ]
    }}
  ]
}}

IMPORTANT:
- For "bar" and "line": Use format {{"label": "name", "value": number}}
- For "pie": Use format {{"label": "category", "value": percentage}}
- For "timeline": Use format {{"label": "event", "value": year, "date": "YYYY-MM-DD"}}
- Each visualization should have 3-8 data points
- Use actual numbers from the research data
- Make insights meaningful and data-driven

Create Exactly the asked number of visualization in the Original Query: {query} now."#,
            query = query,
            research = research,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{failing_llm, scripted_llm};

    const ISRO_JSON: &str = r#"{"insights":"ISRO had a strong year","visualizations":[{"type":"bar","title":"ISRO 2024 Launches","description":"Launch count","data":[{"label":"Jan","value":1}]}]}"#;

    #[test]
    fn test_parse_fenced_json_block() {
        let raw = format!("Here you go:\n```json\n{}\n```\nEnjoy!", ISRO_JSON);
        let output = parse_chart_payload(&raw).unwrap();

        assert_eq!(output.insights, "ISRO had a strong year");
        assert_eq!(output.visualizations.len(), 1);
        assert_eq!(output.visualizations[0].chart_type, ChartType::Bar);
        assert_eq!(output.visualizations[0].data, vec![DataPoint::new("Jan", 1.0)]);
    }

    #[test]
    fn test_parse_plain_fence_with_language_tag() {
        let raw = format!("```JSON\n{}\n```", ISRO_JSON);
        assert!(parse_chart_payload(&raw).is_ok());

        let raw = format!("```\n{}\n```", ISRO_JSON);
        assert!(parse_chart_payload(&raw).is_ok());
    }

    #[test]
    fn test_parse_bare_json() {
        let output = parse_chart_payload(&format!("  {}  ", ISRO_JSON)).unwrap();
        assert_eq!(output.visualizations[0].title, "ISRO 2024 Launches");
    }

    #[test]
    fn test_parse_unclosed_fence() {
        let raw = format!("```json\n{}", ISRO_JSON);
        assert!(parse_chart_payload(&raw).is_ok());
    }

    #[test]
    fn test_parse_errors_are_tagged() {
        assert!(matches!(parse_chart_payload("   "), Err(PayloadError::Empty)));
        assert!(matches!(
            parse_chart_payload("I could not find any data."),
            Err(PayloadError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_chart_payload(r#"{"visualizations": []}"#),
            Err(PayloadError::MissingKey("insights"))
        ));
        assert!(matches!(
            parse_chart_payload(r#"{"insights": "x"}"#),
            Err(PayloadError::MissingKey("visualizations"))
        ));
        assert!(matches!(
            parse_chart_payload(
                r#"{"insights": "x", "visualizations": [{"type": "radar", "title": "t", "description": "d", "data": []}]}"#
            ),
            Err(PayloadError::Schema(_))
        ));
    }

    #[test]
    fn test_timeline_dates_survive_parsing() {
        let raw = r#"{"insights": "Milestones", "visualizations": [{"type": "timeline", "title": "Lunar missions", "description": "Key dates", "data": [
            {"label": "Chandrayaan-1", "value": 2008, "date": "2008-10-22"},
            {"label": "Chandrayaan-2", "value": 2019, "date": "2019-07-22"},
            {"label": "Chandrayaan-3", "value": 2023, "date": "2023-07-14"}
        ]}]}"#;

        let output = parse_chart_payload(raw).unwrap();
        let viz = &output.visualizations[0];
        assert_eq!(viz.chart_type, ChartType::Timeline);
        assert_eq!(viz.data[2].date.as_deref(), Some("2023-07-14"));
    }

    #[test]
    fn test_degradation_outputs() {
        let upstream = Degradation::UpstreamFailure.output();
        assert_eq!(upstream.insights, UPSTREAM_FAILURE_INSIGHTS);
        assert!(upstream.visualizations.is_empty());

        let malformed = Degradation::MalformedOutput.output();
        assert_eq!(malformed.visualizations.len(), 1);
        assert_eq!(malformed.visualizations[0].title, "Data Processing Error");
        assert_eq!(malformed.visualizations[0].data, vec![DataPoint::new("Error", 1.0)]);

        let unexpected = Degradation::UnexpectedError.output();
        assert_eq!(unexpected.insights, UNEXPECTED_ERROR_INSIGHTS);
        assert!(unexpected.visualizations.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_skips_llm() {
        let (llm, calls) = scripted_llm(ISRO_JSON);
        let agent = VisualizationAgent::new(llm);

        let output = agent.run("ISRO launches", None, true).await;
        assert_eq!(output, Degradation::UpstreamFailure.output());

        let output = agent.run("ISRO launches", Some("   "), false).await;
        assert_eq!(output, Degradation::UpstreamFailure.output());

        assert_eq!(calls.count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_embeds_query_and_research() {
        let (llm, calls) = scripted_llm(ISRO_JSON);
        let agent = VisualizationAgent::new(llm);

        agent
            .run("Give me 2 graphs about ISRO", Some("ISRO launched 5 missions in 2024."), false)
            .await;

        let prompt = calls.last_prompt().unwrap();
        assert!(prompt.contains("Original Query: Give me 2 graphs about ISRO"));
        assert!(prompt.contains("Data from Research:\nISRO launched 5 missions in 2024."));
        assert!(prompt.contains(r#""timeline": Use format {"label": "event""#));
    }

    #[tokio::test]
    async fn test_invalid_json_uses_placeholder_chart() {
        let (llm, _) = scripted_llm("Sorry, here is a summary instead of JSON.");
        let agent = VisualizationAgent::new(llm);

        let output = agent.run("ISRO launches", Some("ISRO data"), false).await;
        assert_eq!(output, Degradation::MalformedOutput.output());
    }

    #[tokio::test]
    async fn test_llm_error_uses_unexpected_error_output() {
        let agent = VisualizationAgent::new(failing_llm());

        let output = agent.run("ISRO launches", Some("ISRO data"), false).await;
        assert_eq!(output, Degradation::UnexpectedError.output());
    }
}
