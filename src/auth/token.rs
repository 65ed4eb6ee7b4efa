use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token, the user's identifier.
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token id, so tokens issued in the same second differ.
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token together with the instant it stops being valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and validates HS256 session tokens.
///
/// The secret and TTL are fixed at construction. Expiry is checked here against
/// `chrono::Utc` with no leeway, rather than by `jsonwebtoken`, so that a token
/// is rejected at exactly `iat + ttl`.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing("token expiry overflows".into()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies signature and structure, then expiry against `now`.
    ///
    /// Does not consult the revocation ledger.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                // A header naming another algorithm was not signed with our key either.
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                _ => AuthError::Malformed(e.to_string()),
            })?;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

/// Cheap structural check: does `token` at least carry a decodable JWT header?
pub fn looks_like_token(token: &str) -> bool {
    decode_header(token).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Duration::hours(1))
    }

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = service("test_secret_for_gen_verify");
        let issued = tokens.issue("U123").unwrap();
        let claims = tokens.verify(&issued.token).unwrap();

        assert_eq!(claims.sub, "U123");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.expires_at(), issued.expires_at);
    }

    #[test]
    fn test_expiry_boundary() {
        let tokens = service("test_secret_for_expiration");
        let issued_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let issued = tokens.issue_at("U123", issued_at).unwrap();

        let just_before = issued_at + Duration::hours(1) - Duration::seconds(1);
        assert!(tokens.verify_at(&issued.token, just_before).is_ok());

        let at_expiry = issued_at + Duration::hours(1);
        assert_eq!(
            tokens.verify_at(&issued.token, at_expiry),
            Err(AuthError::Expired)
        );
        assert_eq!(
            tokens.verify_at(&issued.token, at_expiry + Duration::days(1)),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn test_expired_token_fails_with_wall_clock() {
        let tokens = service("test_secret_for_expiration");
        let issued = tokens
            .issue_at("U123", Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(tokens.verify(&issued.token), Err(AuthError::Expired));
    }

    #[test]
    fn test_invalid_token_signature() {
        let issuer = service("some_other_secret");
        let verifier = service("a_completely_different_secret");
        let issued = issuer.issue("U123").unwrap();

        assert_eq!(
            verifier.verify(&issued.token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_foreign_signature_wins_over_expiry() {
        let issuer = service("some_other_secret");
        let verifier = service("a_completely_different_secret");
        let issued = issuer
            .issue_at("U123", Utc::now() - Duration::days(3))
            .unwrap();

        assert_eq!(
            verifier.verify(&issued.token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_foreign_algorithm_and_key_is_invalid_signature() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "U123".to_string(),
            iat: now,
            exp: now + 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"theirs"),
        )
        .unwrap();

        assert_eq!(service("ours").verify(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = service("secret");
        assert!(matches!(
            tokens.verify("garbage"),
            Err(AuthError::Malformed(_))
        ));
        assert!(!looks_like_token("garbage"));
        assert!(looks_like_token(&tokens.issue("U1").unwrap().token));
    }

    #[test]
    fn test_tokens_are_unique_per_issue() {
        let tokens = service("secret");
        let now = Utc::now();
        let first = tokens.issue_at("U123", now).unwrap();
        let second = tokens.issue_at("U123", now).unwrap();
        assert_ne!(first.token, second.token);
    }
}
