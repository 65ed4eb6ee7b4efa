use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;

use super::revocation::RevocationLedger;
use super::token::{looks_like_token, TokenService};
use super::{AuthError, Rejection};
use crate::models::UserProfile;
use crate::store::{bounded, UserStore};

/// What a successful authentication hands to downstream handlers.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: UserProfile,
    /// The presented bearer token, kept so logout can revoke it.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// The per-request trust boundary.
///
/// Holds no mutable state of its own; everything it needs is injected here and
/// shared across requests.
pub struct AuthGate {
    tokens: Arc<TokenService>,
    ledger: Arc<RevocationLedger>,
    users: Arc<dyn UserStore>,
    store_timeout: Duration,
}

impl AuthGate {
    pub fn new(
        tokens: Arc<TokenService>,
        ledger: Arc<RevocationLedger>,
        users: Arc<dyn UserStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            ledger,
            users,
            store_timeout,
        }
    }

    /// Resolves an `Authorization` header value to an authenticated user.
    ///
    /// The ledger is consulted before the signature is checked. A store failure
    /// or timeout at either lookup yields [`AuthError::StoreUnavailable`].
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        let result = self.resolve(authorization).await;
        if let Err(e) = &result {
            debug!("authentication rejected: {}", e);
        }
        result
    }

    async fn resolve(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        let token = bearer_token(authorization)
            .ok_or(AuthError::Unauthenticated(Rejection::MissingToken))?;

        if !looks_like_token(token) {
            return Err(AuthError::Unauthenticated(Rejection::TokenFailed));
        }

        if self.ledger.is_revoked(token).await? {
            return Err(AuthError::Unauthenticated(Rejection::Revoked));
        }

        let claims = self.tokens.verify(token).map_err(|e| {
            debug!("token verification failed: {}", e);
            AuthError::Unauthenticated(Rejection::TokenFailed)
        })?;

        let user = bounded(self.store_timeout, self.users.find_by_id(&claims.sub))
            .await?
            .ok_or(AuthError::Unauthenticated(Rejection::UnknownUser))?;

        Ok(AuthContext {
            user: user.into(),
            token: token.to_string(),
            expires_at: claims.expires_at(),
        })
    }
}

/// Extracts `<token>` from a `Bearer <token>` header value.
///
/// Any other scheme, or an empty token, counts as no token at all.
pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    authorization?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
