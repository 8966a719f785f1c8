//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utm_core::{Depth, Error, Grid};

use crate::refresh::{RefreshOutcome, RenderedView};

/// Success response for record submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub message: String,
    pub id: String,
}

impl SaveResponse {
    pub fn saved(id: impl Into<String>) -> Self {
        Self {
            message: "UTM data saved".to_string(),
            id: id.into(),
        }
    }
}

/// Rendered pivot grid.
#[derive(Debug, Serialize)]
pub struct PivotResponse {
    pub ticket: u64,
    pub depth: Depth,
    pub published: bool,
    pub rendered_at: i64,
    pub grid: Grid,
    /// Snapshot records that failed validation and were left out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<Vec<String>>,
}

impl PivotResponse {
    pub fn from_view(view: &RenderedView, published: bool) -> Self {
        Self {
            ticket: view.ticket,
            depth: view.depth,
            published,
            rendered_at: view.rendered_at.timestamp_millis(),
            grid: view.grid.clone(),
            skipped: None,
        }
    }

    pub fn from_outcome(outcome: &RefreshOutcome) -> Self {
        Self::from_view(&outcome.view, outcome.published)
    }

    pub fn with_skipped(mut self, skipped: Vec<String>) -> Self {
        self.skipped = if skipped.is_empty() { None } else { Some(skipped) };
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub clickhouse_connected: bool,
    pub records_inserted: u64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error type with coded error bodies.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn validation(status: StatusCode, code: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new("Validation failed", code).with_details(errors),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::ValidationWithCode {
                code,
                message,
                http_status,
            } => {
                let status = StatusCode::from_u16(*http_status).unwrap_or(StatusCode::BAD_REQUEST);
                ApiError::validation(status, *code, vec![message.clone()])
            }
            Error::Database { code, message, .. } => {
                ApiError::with_code(StatusCode::INTERNAL_SERVER_ERROR, *code, message)
            }
            Error::Validation(msg) => ApiError::bad_request(msg),
        }
    }
}
