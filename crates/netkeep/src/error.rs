//! CLI error types with miette diagnostics.
//!
//! Maps server/API failures into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes for scripted callers.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Could not connect to the netkeep server at {url}")]
    #[diagnostic(
        code(netkeep::connection_failed),
        help(
            "Check that the server is running and the --server URL is right.\n\
             Start one locally with: netkeep serve"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(netkeep::api_error))]
    Api { status: u16, message: String },

    #[error("Unexpected response from server: {0}")]
    #[diagnostic(code(netkeep::bad_response))]
    BadResponse(String),

    #[error("Configuration error")]
    #[diagnostic(code(netkeep::config))]
    Config(#[from] netkeep_config::ConfigError),

    #[error("Could not start the server: {message}")]
    #[diagnostic(code(netkeep::startup))]
    Startup { message: String },

    #[error(transparent)]
    #[diagnostic(code(netkeep::io))]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(netkeep::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Api { status: 404, .. } => exit_code::NOT_FOUND,
            Self::Api { status: 409, .. } => exit_code::CONFLICT,
            Self::Config(_) | Self::Startup { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}
