// HTTP API Error Types
use axum::{
    http::{header::ALLOW, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::scim::{ScimError, ScimMethod};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidJson(String),

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // Downstream answered with an error; its status and body are forwarded as-is
    Upstream { status: u16, data: Value },

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (downstream unreachable)
    BadGateway(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::MethodNotAllowed(_) => 405,
            ApiError::Upstream { status, .. } => *status,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::MethodNotAllowed(msg) => msg,
            ApiError::Upstream { .. } => "Downstream request failed",
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Upstream { data, .. } => data.clone(),
            _ => json!({
                "error": true,
                "message": self.message(),
                "code": self.error_code()
            }),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ApiError::Upstream { .. } => "UPSTREAM_ERROR",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn method_not_allowed(method: &str) -> Self {
        ApiError::MethodNotAllowed(format!("Method {} is not supported by the bridge", method))
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }
}

impl From<ScimError> for ApiError {
    fn from(err: ScimError) -> Self {
        match err {
            ScimError::Upstream { status, data } => {
                tracing::warn!("Downstream rejected request with status {}", status);
                ApiError::Upstream { status, data }
            }
            ScimError::InvalidBody(msg) => ApiError::bad_request(msg),
            ScimError::MalformedResponse(msg) => {
                tracing::error!("Downstream response could not be read: {}", msg);
                ApiError::bad_gateway("Downstream SCIM service sent an unreadable response")
            }
            // Inbound bodies are parsed by the handler, so this is an encoding fault
            ScimError::Json(e) => {
                tracing::error!("JSON encoding error: {}", e);
                ApiError::internal_server_error("Failed to encode downstream request")
            }
            ScimError::Transport(msg) => {
                // Log the real error but return generic message
                tracing::error!("Downstream transport error: {}", msg);
                ApiError::bad_gateway("Downstream SCIM service unreachable")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_json())).into_response();

        if let ApiError::MethodNotAllowed(_) = self {
            if let Ok(allow) = HeaderValue::from_str(&ScimMethod::allow_header()) {
                response.headers_mut().insert(ALLOW, allow);
            }
        }

        response
    }
}
