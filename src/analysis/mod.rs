//! Decision analysis core.
//!
//! - [`DecisionRequest`] / [`DecisionInput`]: input validation
//! - [`DecisionAnalysis`]: the structured output schema
//! - [`AnalysisRequester`]: ordered primary/fallback backend attempts
//! - [`DecisionSimulator`]: validate, analyze and record in one call

mod input;
mod requester;
mod schema;
mod simulator;

pub use input::*;
pub use requester::*;
pub use schema::*;
pub use simulator::*;

/// Extract JSON from a completion string, handling markdown code blocks.
///
/// Attempts extraction in this order:
/// 1. Raw JSON object or array
/// 2. Contents of a ```json ... ``` block
/// 3. Contents of a ``` ... ``` block
pub(crate) fn extract_json_from_completion(completion: &str) -> Result<&str, String> {
    let trimmed = completion.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed);
    }

    if completion.contains("```json") {
        return completion
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ```json block but content was empty or malformed".to_string());
    }

    if completion.contains("```") {
        return completion
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ``` block but content was empty or malformed".to_string());
    }

    Err(format!(
        "No JSON found in response. First 100 chars: '{}'",
        completion.chars().take(100).collect::<String>()
    ))
}
