//! Error types shared by the external clients and the startup path.
//!
//! Two families of failure exist:
//! - [`ApiError`]: anything that goes wrong talking to an external service.
//!   These never escape a pipeline run; callers swap in a substitute value.
//! - [`ConfigError`]: missing credentials or a bad settings file. These are
//!   fatal at startup and nowhere else.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single call to an external HTTP service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection failure, timeout, or a body that could not be read.
    /// The request URL is stripped, since query strings may carry keys.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// The service answered, but not with a status the caller accepts.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The body was read but did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.without_url())
    }
}

impl ApiError {
    /// HTTP status attached to the failure, if the service answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Startup configuration failure. The process refuses to run when one occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid schedule time {0:?}, expected HH:MM")]
    ScheduleTime(String),

    #[error("invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_exposes_status() {
        let err = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "{\"message\":\"Invalid access token\"}".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("Invalid access token"));
    }

    #[test]
    fn test_malformed_has_no_status() {
        let err = ApiError::Malformed("no choices".to_string());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_missing_setting_names_variable() {
        let err = ConfigError::Missing("NEWS_API_KEY");
        assert_eq!(err.to_string(), "missing required setting NEWS_API_KEY");
    }
}
