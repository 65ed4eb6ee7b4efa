//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used by the HTTP layer.
//! It is the only place where internal failures are turned into wire-visible
//! status codes; every error body has the shape `{ "message": string }`.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can return
//! it directly. `From` implementations exist for `validator::ValidationErrors`,
//! `bcrypt::BcryptError`, [`StoreError`] and [`AuthError`], allowing easy
//! conversion using the `?` operator.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::{AuthError, Rejection};
use crate::store::StoreError;

/// Message sent for every 401 caused by a missing or malformed `Authorization` header.
pub const NO_TOKEN_MESSAGE: &str = "Not authorized, no token";
/// Message sent for every other authentication failure.
pub const TOKEN_FAILED_MESSAGE: &str = "Not authorized, token failed";

/// Represents all possible errors that can reach an HTTP client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed or is required but missing (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Malformed or otherwise invalid request (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// The caller is authenticated but does not own the resource (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// The requested resource was not found (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Input validation failed after successful deserialization (HTTP 422).
    #[error("Validation Error: {0}")]
    ValidationError(String),
    /// A backing store could not be reached in time (HTTP 503).
    #[error("Service Unavailable: {0}")]
    Unavailable(String),
    /// A store operation failed (HTTP 500). The detail is logged, not sent.
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// Any other unexpected server-side failure (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg) => msg.as_str(),
            AppError::Unavailable(detail) => {
                log::warn!("store unavailable: {}", detail);
                "Service temporarily unavailable"
            }
            AppError::DatabaseError(detail) | AppError::InternalServerError(detail) => {
                log::error!("{}", detail);
                "Server error"
            }
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("bcrypt: {}", error))
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Conflict(msg) => AppError::BadRequest(msg),
            StoreError::Unavailable(msg) => AppError::Unavailable(msg),
            StoreError::Backend(msg) => AppError::DatabaseError(msg),
        }
    }
}

/// Collapses every authentication failure into one of two generic client messages.
///
/// Revoked, expired, forged and orphaned tokens all look the same from outside.
impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::Unauthenticated(Rejection::MissingToken) => {
                AppError::Unauthorized(NO_TOKEN_MESSAGE.into())
            }
            AuthError::Unauthenticated(_)
            | AuthError::InvalidSignature
            | AuthError::Expired
            | AuthError::Malformed(_) => AppError::Unauthorized(TOKEN_FAILED_MESSAGE.into()),
            AuthError::StoreUnavailable(msg) => AppError::Unavailable(msg),
            AuthError::Signing(msg) => AppError::InternalServerError(msg),
        }
    }
}
