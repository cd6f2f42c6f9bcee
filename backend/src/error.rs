//! Error handling for the Land Survey Platform
//!
//! Every error is returned to the caller; the calling layer decides whether
//! to retry or prompt again.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::PlanError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Request context errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Survey ledger errors
    #[error("Parcel is already claimed by another surveyor")]
    AlreadyClaimed,

    #[error("Parcel is not claimed by this surveyor")]
    NotClaimedBySurveyor,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn conflict(resource: &str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            resource: resource.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(resource.to_string())
    }

    /// Lift a unique or foreign-key violation into a retryable conflict
    pub fn from_write(err: sqlx::Error, resource: &str) -> Self {
        match &err {
            sqlx::Error::Database(db)
                if db.is_unique_violation() || db.is_foreign_key_violation() =>
            {
                AppError::conflict(
                    resource,
                    format!("Concurrent write on {}, retry the request", resource),
                )
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::UnknownPlant(_) => AppError::not_found("Plant"),
            PlanError::ChoiceWithoutRecommendation { .. } => {
                AppError::validation("chosen_plant_id", &err.to_string())
            }
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", msg.clone()),
            ),
            AppError::AlreadyClaimed => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "ALREADY_CLAIMED",
                    "This parcel is already being surveyed by another surveyor",
                ),
            ),
            AppError::NotClaimedBySurveyor => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "NOT_CLAIMED_BY_SURVEYOR",
                    "Claim the parcel before submitting a survey",
                ),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone()).with_field(field),
            ),
            AppError::Conflict { resource, message } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", message.clone()).with_field(resource),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg)),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> String {
        self.status_and_detail().1.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
