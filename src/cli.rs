//! Command-line interface.
//!
//! `serve` runs the HTTP service; `analyze` runs a single decision through the
//! same pipeline from the terminal; `history` prints stored analyses.

use clap::{Parser, Subcommand};

use crate::analysis::{DecisionRequest, DecisionSimulator};
use crate::storage::DecisionStore;

/// Decision impact simulator.
#[derive(Parser, Debug)]
#[command(name = "decision-sim", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Analyze one decision and print the result as JSON
    Analyze {
        /// The decision being considered
        #[arg(long)]
        decision: String,

        /// A constraint on the decision; repeat for several
        #[arg(long = "constraint")]
        constraints: Vec<String>,

        /// Skip writing the result to the database
        #[arg(long)]
        no_save: bool,
    },

    /// Show recently stored analyses
    History {
        /// Maximum number of records to show
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Run `analyze`.
pub async fn execute_analyze(
    simulator: &DecisionSimulator,
    decision: String,
    constraints: Vec<String>,
    no_save: bool,
) -> CliResult {
    let request = constraints
        .into_iter()
        .fold(DecisionRequest::new(decision), |r, c| r.with_constraint(c));

    let input = match request.validate() {
        Ok(input) => input,
        Err(e) => return CliResult::error(e.to_string()),
    };

    let result = if no_save {
        simulator.analyze(&input).await
    } else {
        simulator.analyze_and_record(&input).await
    };

    match result {
        Ok(outcome) => match serde_json::to_string_pretty(&outcome) {
            Ok(json) => CliResult::success(json),
            Err(e) => CliResult::error(format!("Failed to render result: {}", e)),
        },
        Err(e) => CliResult::error(e.to_string()),
    }
}

/// Run `history`.
pub async fn execute_history(store: &dyn DecisionStore, limit: u32) -> CliResult {
    let records = match store.recent(limit).await {
        Ok(r) => r,
        Err(e) => return CliResult::error(format!("Failed to load history: {}", e)),
    };

    if records.is_empty() {
        return CliResult::success("No decisions recorded yet.");
    }

    let lines: Vec<String> = records
        .iter()
        .map(|r| {
            let confidence = r
                .response
                .get("confidence_score")
                .and_then(|v| v.as_i64())
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_string());
            format!(
                "#{:<5} {}  {:<32} {:<9} confidence={:<3}  {}",
                r.id,
                r.created_at.format("%Y-%m-%d %H:%M:%S"),
                r.model_used,
                if r.fallback_used { "fallback" } else { "primary" },
                confidence,
                r.decision.chars().take(60).collect::<String>()
            )
        })
        .collect();

    CliResult::success(lines.join("\n"))
}
