use crate::{errors::ApiError, repository::Repository, store::StoreError};
use axum::http::{HeaderMap, header};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

pub const BEARER_SCHEME: &str = "Bearer";
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Which kind of token; written into the `iss` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    Access,
    Refresh,
}

impl TokenRole {
    pub fn issuer(self) -> &'static str {
        match self {
            TokenRole::Access => "chirpy-access",
            TokenRole::Refresh => "chirpy-refresh",
        }
    }

    pub fn ttl(self) -> Duration {
        match self {
            TokenRole::Access => Duration::hours(1),
            // 24 * 60 hours (60 days)
            TokenRole::Refresh => Duration::hours(24 * 60),
        }
    }

    /// Only refresh tokens are looked up in the revocation ledger.
    pub fn is_revocable(self) -> bool {
        matches!(self, TokenRole::Refresh)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String, // Subject (user ID)
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub jti: String,
}

impl Claims {
    /// The user ID carried in `sub`.
    pub fn subject(&self) -> Result<u64, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::MalformedSubject(self.sub.clone()))
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
    #[error("token issued by `{found}`, expected `{expected}`")]
    WrongIssuer { expected: &'static str, found: String },
    #[error("token has been revoked")]
    Revoked,
    #[error("token subject `{0}` is not a user id")]
    MalformedSubject(String),
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Ledger(#[from] StoreError),
}

/// Issues and checks HS256 session tokens.
#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ledger: Repository,
}

impl TokenManager {
    pub fn new(secret: &str, ledger: Repository) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked by hand so that revocation takes precedence
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ledger,
        }
    }

    pub fn issue(&self, user_id: u64, role: TokenRole) -> Result<String, TokenError> {
        self.sign(user_id, role, Utc::now())
    }

    fn sign(
        &self,
        user_id: u64,
        role: TokenRole,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            iss: role.issuer().to_string(),
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + role.ttl()).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Checks signature, issuer role, revocation (refresh tokens only) and
    /// expiry, in that order. A revoked refresh token stays `Revoked` after
    /// it would also have expired.
    pub async fn verify(&self, token: &str, expected: TokenRole) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(TokenError::Malformed)?
            .claims;

        if claims.iss != expected.issuer() {
            return Err(TokenError::WrongIssuer {
                expected: expected.issuer(),
                found: claims.iss,
            });
        }

        if expected.is_revocable() && self.ledger.is_revoked(token).await? {
            return Err(TokenError::Revoked);
        }

        if Utc::now().timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Resolves the user behind an `Authorization: Bearer <token>` header.
    pub async fn authorize(&self, headers: &HeaderMap, role: TokenRole) -> Result<u64, ApiError> {
        let token = credential(headers, BEARER_SCHEME)?;
        let claims = self.verify(token, role).await.inspect_err(|err| {
            warn!(error = %err, issuer = role.issuer(), "token rejected");
        })?;
        Ok(claims.subject()?)
    }
}

/// Pulls the credential out of `Authorization: <scheme> <credential>`.
pub fn credential<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::MissingAuthorization)?;

    match auth_header.split_once(' ') {
        Some((found, value)) if found == scheme && !value.trim().is_empty() => Ok(value.trim()),
        _ => Err(ApiError::MissingAuthorization),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::repository;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret";

    async fn manager() -> (tempfile::TempDir, TokenManager) {
        let (dir, repo) = repository().await;
        (dir, TokenManager::new(SECRET, repo))
    }

    #[tokio::test]
    async fn issued_tokens_verify_for_their_role() {
        let (_dir, tokens) = manager().await;

        let access = tokens.issue(7, TokenRole::Access).unwrap();
        let claims = tokens.verify(&access, TokenRole::Access).await.unwrap();
        assert_eq!(claims.iss, "chirpy-access");
        assert_eq!(claims.subject().unwrap(), 7);
        assert_eq!(claims.exp - claims.iat, 3600);

        let refresh = tokens.issue(7, TokenRole::Refresh).unwrap();
        let claims = tokens.verify(&refresh, TokenRole::Refresh).await.unwrap();
        assert_eq!(claims.iss, "chirpy-refresh");
    }

    #[tokio::test]
    async fn refresh_lifetime_is_1440_hours() {
        let (_dir, tokens) = manager().await;
        let refresh = tokens.issue(1, TokenRole::Refresh).unwrap();
        let claims = tokens.verify(&refresh, TokenRole::Refresh).await.unwrap();
        assert_eq!(claims.exp - claims.iat, 1440 * 3600);
        assert_eq!(TokenRole::Refresh.ttl(), Duration::days(60));
    }

    #[tokio::test]
    async fn roles_are_not_interchangeable() {
        let (_dir, tokens) = manager().await;
        let access = tokens.issue(1, TokenRole::Access).unwrap();
        let refresh = tokens.issue(1, TokenRole::Refresh).unwrap();

        assert!(matches!(
            tokens.verify(&access, TokenRole::Refresh).await,
            Err(TokenError::WrongIssuer { expected: "chirpy-refresh", .. })
        ));
        assert!(matches!(
            tokens.verify(&refresh, TokenRole::Access).await,
            Err(TokenError::WrongIssuer { expected: "chirpy-access", .. })
        ));

        // an expired access token is still the wrong role
        let stale = tokens
            .sign(1, TokenRole::Access, Utc::now() - Duration::hours(3))
            .unwrap();
        assert!(matches!(
            tokens.verify(&stale, TokenRole::Refresh).await,
            Err(TokenError::WrongIssuer { .. })
        ));
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let (_dir, tokens) = manager().await;
        let stale = tokens
            .sign(1, TokenRole::Access, Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(
            tokens.verify(&stale, TokenRole::Access).await,
            Err(TokenError::Expired)
        ));
    }

    #[tokio::test]
    async fn foreign_or_garbage_tokens_are_malformed() {
        let (_dir, tokens) = manager().await;
        let (_other_dir, repo) = repository().await;
        let other = TokenManager::new("another-secret", repo);

        let forged = other.issue(1, TokenRole::Access).unwrap();
        assert!(matches!(
            tokens.verify(&forged, TokenRole::Access).await,
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(
            tokens.verify("not.a.jwt", TokenRole::Access).await,
            Err(TokenError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn revoked_refresh_token_stays_revoked() {
        let (_dir, tokens) = manager().await;
        let refresh = tokens.issue(1, TokenRole::Refresh).unwrap();
        tokens.ledger.revoke(&refresh).await.unwrap();

        for _ in 0..2 {
            assert!(matches!(
                tokens.verify(&refresh, TokenRole::Refresh).await,
                Err(TokenError::Revoked)
            ));
        }

        // a fresh refresh token for the same user is unaffected
        let next = tokens.issue(1, TokenRole::Refresh).unwrap();
        assert_ne!(next, refresh);
        assert!(tokens.verify(&next, TokenRole::Refresh).await.is_ok());
    }

    #[tokio::test]
    async fn revocation_outranks_expiry() {
        let (_dir, tokens) = manager().await;
        let old = tokens
            .sign(1, TokenRole::Refresh, Utc::now() - Duration::days(61))
            .unwrap();
        assert!(matches!(
            tokens.verify(&old, TokenRole::Refresh).await,
            Err(TokenError::Expired)
        ));

        tokens.ledger.revoke(&old).await.unwrap();
        assert!(matches!(
            tokens.verify(&old, TokenRole::Refresh).await,
            Err(TokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn access_tokens_ignore_the_ledger() {
        let (_dir, tokens) = manager().await;
        let access = tokens.issue(1, TokenRole::Access).unwrap();
        tokens.ledger.revoke(&access).await.unwrap();
        assert!(tokens.verify(&access, TokenRole::Access).await.is_ok());
    }

    #[test]
    fn subject_must_be_numeric() {
        let claims = Claims {
            iss: "chirpy-access".into(),
            sub: "abc".into(),
            iat: 0,
            exp: 0,
            jti: String::new(),
        };
        assert!(matches!(
            claims.subject(),
            Err(TokenError::MalformedSubject(ref sub)) if sub == "abc"
        ));
    }

    #[test]
    fn credential_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            credential(&headers, BEARER_SCHEME),
            Err(ApiError::MissingAuthorization)
        ));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(credential(&headers, BEARER_SCHEME).unwrap(), "abc.def");
        assert!(credential(&headers, API_KEY_SCHEME).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert!(credential(&headers, BEARER_SCHEME).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("ApiKey k-123"));
        assert_eq!(credential(&headers, API_KEY_SCHEME).unwrap(), "k-123");
    }

    #[tokio::test]
    async fn authorize_reads_bearer_header() {
        let (_dir, tokens) = manager().await;
        let access = tokens.issue(12, TokenRole::Access).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access}")).unwrap(),
        );
        assert_eq!(tokens.authorize(&headers, TokenRole::Access).await.unwrap(), 12);
        assert!(matches!(
            tokens.authorize(&headers, TokenRole::Refresh).await,
            Err(ApiError::Unauthorized)
        ));
    }
}
