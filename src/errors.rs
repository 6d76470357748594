// ABOUTME: Unified error handling with error codes, HTTP status mapping, and JSON responses
// ABOUTME: Covers quota denials, upstream LLM failures, plan parse failures, and storage errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling
//!
//! Every fallible operation in the coach returns [`AppResult`]. The [`ErrorCode`]
//! decides the HTTP status the thin transport layer should use, and the
//! `details` payload carries the machine-readable context (quota scope and
//! retry hint, upstream status, raw model output for parse failures).

use std::fmt;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Standard error codes used throughout the coach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request failed validation
    InvalidInput,
    /// A coach usage quota window is exhausted
    QuotaExceeded,
    /// The LLM backend answered with a non-success status
    ExternalServiceError,
    /// The LLM backend could not be reached or timed out
    ExternalServiceUnavailable,
    /// Model output could not be decoded into a training plan
    PlanParseFailed,
    /// Required configuration (e.g. an API key) is absent
    ConfigMissing,
    /// Configuration value is malformed
    ConfigInvalid,
    /// SQL storage failure
    DatabaseError,
    /// Counter store or other storage failure
    StorageError,
    /// Serialization or deserialization failure
    SerializationError,
    /// Unexpected internal failure
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::ExternalServiceError | Self::PlanParseFailed => StatusCode::BAD_GATEWAY,
            Self::ExternalServiceUnavailable => StatusCode::GATEWAY_TIMEOUT,
            Self::ConfigMissing => StatusCode::SERVICE_UNAVAILABLE,
            Self::ConfigInvalid
            | Self::DatabaseError
            | Self::StorageError
            | Self::SerializationError
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short user-facing description of this error class
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::QuotaExceeded => "Coach usage limit reached",
            Self::ExternalServiceError => "The AI service returned an error",
            Self::ExternalServiceUnavailable => "The AI service could not be reached",
            Self::PlanParseFailed => "The AI service returned a plan that could not be read",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::DatabaseError => "Database operation failed",
            Self::StorageError => "Storage operation failed",
            Self::SerializationError => "Data serialization failed",
            Self::InternalError => "An internal error occurred",
        }
    }
}

/// Unified error type for the coach
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable, user-actionable message
    pub message: String,
    /// Structured context for clients and diagnostics
    pub details: Value,
}

impl AppError {
    /// Create a new error with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Value::Null,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Quota window exhausted
    #[must_use]
    pub fn quota_exceeded(
        scope: impl Into<String>,
        retry_after_minutes: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCode::QuotaExceeded, message).with_details(json!({
            "scope": scope.into(),
            "retry_after_minutes": retry_after_minutes,
        }))
    }

    /// Backend could not be reached (connect failure or call timeout)
    #[must_use]
    pub fn upstream_unreachable(provider: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceUnavailable,
            format!("Failed to reach AI service: {}", message.into()),
        )
        .with_details(json!({ "provider": provider }))
    }

    /// Backend answered with a non-success status
    #[must_use]
    pub fn upstream_rejected(provider: &str, status: u16) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("AI service error (status {status})"),
        )
        .with_details(json!({ "provider": provider, "status": status }))
    }

    /// Plan output could not be decoded; the raw text is retained
    #[must_use]
    pub fn plan_parse(reason: impl Into<String>, raw_response: &str) -> Self {
        Self::new(
            ErrorCode::PlanParseFailed,
            format!("Failed to parse AI plan response: {}", reason.into()),
        )
        .with_details(json!({ "raw_response": raw_response }))
    }

    /// Required configuration is missing
    #[must_use]
    pub fn config_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissing, message)
    }

    /// Configuration is malformed
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Database error
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Counter store or other storage error
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Retry hint in minutes for quota denials
    #[must_use]
    pub fn retry_after_minutes(&self) -> Option<u64> {
        if self.code != ErrorCode::QuotaExceeded {
            return None;
        }
        self.details
            .get("retry_after_minutes")
            .and_then(Value::as_u64)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(error: redis::RedisError) -> Self {
        Self::storage(format!("Counter store error: {error}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Error payload inside [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Structured details
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub details: Value,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                details: error.details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let retry_after_secs = self.retry_after_minutes().map(|minutes| minutes * 60);

        if status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "Request failed");
        }

        let mut response = (status, Json(ErrorResponse::from(self))).into_response();
        if let Some(secs) = retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
