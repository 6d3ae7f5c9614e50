// Error types for the photoapp client.
//
// Only start-up problems (configuration, local files, building the HTTP
// client) are errors in the `Result` sense. Anything that happens while
// talking to the web service is reported through `CallOutcome` and
// `WorkflowResult` instead, so a failed call never ends the session.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the library.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Config file was not found at the given path.
    #[error("config file '{path}' does not exist")]
    ConfigNotFound { path: PathBuf },

    #[error("failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file '{path}' is malformed: {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    /// Base URL failed validation (too short, https, ...).
    #[error("baseurl '{url}' {reason}, please fix")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("local file '{path}' does not exist")]
    FileNotFound { path: PathBuf },

    #[error("failed to read local file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reqwest client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
