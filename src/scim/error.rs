use serde_json::Value;
use thiserror::Error;

/// Failures raised while normalizing a request or talking to the downstream service
#[derive(Debug, Error)]
pub enum ScimError {
    /// Downstream answered with a non-success status
    #[error("Upstream error: status {status}")]
    Upstream { status: u16, data: Value },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Downstream answered 2xx with a body that does not have the expected shape
    #[error("Malformed downstream response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScimError {
    pub fn upstream(status: u16, data: Option<Value>) -> Self {
        ScimError::Upstream {
            status,
            data: data.unwrap_or(Value::Null),
        }
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        ScimError::InvalidBody(message.into())
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        ScimError::MalformedResponse(message.into())
    }
}

impl From<reqwest::Error> for ScimError {
    fn from(err: reqwest::Error) -> Self {
        ScimError::Transport(err.to_string())
    }
}
