//! API response structures

use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{SessionError, SessionStatus, SleepOutcome};

/// API response structure for state change endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SleepOutcome>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, session: Option<SessionStatus>) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            session,
            outcome: None,
        }
    }

    /// Create a success response carrying the session status
    pub fn ok(message: String, session: SessionStatus) -> Self {
        Self::new("ok", message, Some(session))
    }

    /// Create an error response
    pub fn error(message: String) -> Self {
        Self::new("error", message, None)
    }

    pub fn with_outcome(mut self, outcome: SleepOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ApiResponse>);

/// The timer loop could not be reached
pub fn loop_unavailable(message: String) -> ApiError {
    (StatusCode::SERVICE_UNAVAILABLE, Json(ApiResponse::error(message)))
}

/// The session refused the request; the message is meant for the user
pub fn rejected(error: SessionError) -> ApiError {
    let code = match error {
        SessionError::Settings(_) | SessionError::SettingsRequired => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::NotConfigured | SessionError::NoPendingConfirmation => StatusCode::CONFLICT,
    };
    (code, Json(ApiResponse::error(error.to_string())))
}

/// Status response with server information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub session: SessionStatus,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
