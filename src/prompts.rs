//! Prompt text sent to the inference backends.
//!
//! The system prompt pins the output to the [`DecisionAnalysis`] field set;
//! the user prompt is rendered from validated input by [`format_decision_prompt`].
//!
//! [`DecisionAnalysis`]: crate::analysis::DecisionAnalysis

use crate::analysis::DecisionInput;

/// System prompt shared by the primary and fallback backends.
pub const DECISION_ANALYSIS_PROMPT: &str = r#"
You are an AI Decision Impact Simulator.

STRICT RULES:
- Do NOT browse the web
- Do NOT search
- Do NOT call tools
- Use reasoning only

Output MUST be valid JSON.
Keys MUST exactly match the schema.
Use lowercase snake_case only.
Do NOT change key names.
Do NOT omit any required field.

Required fields:
decision_summary
risks
best_case
worst_case
most_likely_case
alternatives
confidence_score
uncertainty_explanation

Shapes:
risks: array of {"risk", "impact_level", "explanation"}
best_case, worst_case, most_likely_case: {"title", "description", "likelihood", "impact"}
alternatives: array of {"option", "why_safer"}
confidence_score: integer from 0 to 100

No advice.
No recommendations.
No markdown.
Return ONLY the JSON object.
"#;

/// Render the user prompt for a validated decision.
///
/// The decision text is embedded verbatim, followed by one `- ` bullet per
/// constraint in input order.
pub fn format_decision_prompt(input: &DecisionInput) -> String {
    let constraints_text = input
        .constraints()
        .iter()
        .map(|c| format!("- {}", c.constraint))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\nDecision:\n{}\n\nConstraints:\n{}\n",
        input.decision(),
        constraints_text
    )
}
