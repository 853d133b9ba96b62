use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub models: ModelConfig,
    pub policy: FallbackPolicy,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub server: ServerConfig,
}

/// Inference provider credentials and endpoint
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    pub base_url: String,
}

/// Model identifiers and sampling settings shared by every backend
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub primary: String,
    pub fallback: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

/// Ordered-attempt policy for the analysis requester
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    /// Upper bound on backends tried for a single request
    pub max_attempts: usize,
    /// Optional deadline for each individual attempt
    pub attempt_timeout: Option<Duration>,
    /// When false, a schema-invalid completion fails the request instead of
    /// moving on to the next backend
    pub fallback_on_invalid_output: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `["*"]` allows any origin
    pub cors_allow_origins: Vec<String>,
}

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "groq:llama-3.1-8b-instant";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let provider = ProviderConfig {
            api_key: env::var("GROQ_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| AppError::Config {
                    message: "GROQ_API_KEY is not set".to_string(),
                })?,
            base_url: env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };

        let models = ModelConfig {
            primary: env::var("PRIMARY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            fallback: env::var("FALLBACK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature: parse_var("TEMPERATURE").unwrap_or(0.2),
            max_tokens: parse_var("MAX_TOKENS"),
        };

        let policy = FallbackPolicy {
            max_attempts: parse_var("MAX_ATTEMPTS").filter(|n| *n > 0).unwrap_or(2),
            attempt_timeout: parse_var("ATTEMPT_TIMEOUT_MS").map(Duration::from_millis),
            fallback_on_invalid_output: parse_var("FALLBACK_ON_INVALID_OUTPUT").unwrap_or(true),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/decisions.db".to_string()),
            ),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS").unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: parse_var("REQUEST_TIMEOUT_MS").unwrap_or(30000),
        };

        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT").unwrap_or(8000),
            cors_allow_origins: env::var("CORS_ALLOW_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        Ok(Config {
            provider,
            models,
            policy,
            database,
            logging,
            request,
            server,
        })
    }
}

impl ServerConfig {
    /// Socket address the HTTP listener binds to
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config {
                message: format!("Invalid listen address {}:{}: {}", self.host, self.port, e),
            })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 30000 }
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            attempt_timeout: None,
            fallback_on_invalid_output: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allow_origins: vec!["*".to_string()],
        }
    }
}
