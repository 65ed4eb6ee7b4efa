use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Why the auth gate turned a request away. Logged, never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No `Authorization: Bearer <token>` header.
    MissingToken,
    /// The token is in the revocation ledger.
    Revoked,
    /// The token is malformed, forged or expired.
    TokenFailed,
    /// The token is valid but its subject no longer exists.
    UnknownUser,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let reason = match self {
            Rejection::MissingToken => "no token",
            Rejection::Revoked => "token invalidated",
            Rejection::TokenFailed => "token failed",
            Rejection::UnknownUser => "user not found",
        };
        f.write_str(reason)
    }
}

/// Failures of the token service, the revocation ledger and the auth gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("not authenticated: {0}")]
    Unauthenticated(Rejection),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Any store failure on the auth path fails closed.
impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> AuthError {
        AuthError::StoreUnavailable(error.to_string())
    }
}
