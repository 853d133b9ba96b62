//! # Decision Impact Simulator
//!
//! An HTTP service that takes a decision plus its constraints, asks a large
//! language model for a structured risk and outcome analysis, stores the
//! result in SQLite and returns it.
//!
//! ## Architecture
//!
//! ```text
//! POST /analyze-decision → validate → format prompt → primary model
//!                                                   ↘ fallback model (on any error)
//!                                       ↓
//!                                SQLite (decisions)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use decision_impact_simulator::analysis::{AnalysisRequester, DecisionSimulator};
//! use decision_impact_simulator::backend::{backends_from_config, ChatClient};
//! use decision_impact_simulator::storage::SqliteStorage;
//! use decision_impact_simulator::{server, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let client = ChatClient::new(&config.provider, config.request.clone())?;
//!     let requester = AnalysisRequester::new(
//!         backends_from_config(&config.models, &client),
//!         config.policy.clone(),
//!     );
//!     let simulator = DecisionSimulator::new(requester, Arc::new(storage));
//!     server::serve(Arc::new(AppState::new(simulator)), &config.server).await?;
//!     Ok(())
//! }
//! ```

/// Decision input, output schema, fallback requester and pipeline.
pub mod analysis;
/// Inference backend trait and chat-completions client.
pub mod backend;
/// Command-line interface.
pub mod cli;
/// Configuration loaded from the environment.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// System and user prompts.
pub mod prompts;
/// HTTP router and handlers.
pub mod server;
/// SQLite storage layer for persistence.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, SharedState};
