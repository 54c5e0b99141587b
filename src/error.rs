use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(meetbot::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(meetbot::config))]
    Config(String),

    #[error("Credentials error: {0}")]
    #[diagnostic(
        code(meetbot::credentials),
        help("Install a service account key or an OAuth token file under /etc/meet-bot")
    )]
    Credentials(String),

    #[error("Google API error: {0}")]
    #[diagnostic(code(meetbot::google_api))]
    GoogleApi(String),

    #[error("Invalid meeting request: {0}")]
    #[diagnostic(code(meetbot::invalid_request))]
    InvalidRequest(String),

    #[error(transparent)]
    #[diagnostic(code(meetbot::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(meetbot::serialization))]
    Serialization(String),

    #[error("HTTP client error: {0}")]
    #[diagnostic(code(meetbot::http))]
    Http(#[from] reqwest::Error),

    #[error("Other error: {0}")]
    #[diagnostic(code(meetbot::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type BotResult<T> = Result<T, Error>;

/// Why a meeting provider could not produce a link.
///
/// Every variant reaches the chat user as the same generic failure message;
/// the distinction only exists for the logs.
#[derive(Debug, Error)]
pub enum MeetingError {
    #[error("provider rejected our credentials: {0}")]
    Unauthorized(String),

    #[error("calendar or resource not found: {0}")]
    NotFound(String),

    #[error("network error talking to provider: {0}")]
    Network(String),

    #[error("provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("could not parse provider response: {0}")]
    MalformedResponse(String),

    #[error("provider response did not contain a meeting link")]
    MissingLink,

    #[error("could not obtain an access token: {0}")]
    Credentials(String),

    #[error("meeting request rejected before sending: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for MeetingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MeetingError::MalformedResponse(err.to_string())
        } else {
            MeetingError::Network(err.to_string())
        }
    }
}

impl From<Error> for MeetingError {
    fn from(err: Error) -> Self {
        match err {
            Error::Http(e) => e.into(),
            Error::InvalidRequest(msg) => MeetingError::InvalidRequest(msg),
            other => MeetingError::Credentials(other.to_string()),
        }
    }
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid value for environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create credential errors
pub fn credentials_error(message: &str) -> Error {
    Error::Credentials(message.to_string())
}

/// Helper to create Google API errors
pub fn google_api_error(message: &str) -> Error {
    Error::GoogleApi(message.to_string())
}

