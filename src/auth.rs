//! Bearer-token validation for protected routes.
//!
//! Token issuance (login, refresh) is handled by an external identity
//! service; this module only validates `Authorization: Bearer` headers and
//! makes the authenticated principal available to handlers.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{ErrorResponse, ServiceError};

/// JWT claims accepted by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,
    /// Display name, if the issuer includes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued-at, seconds since epoch
    pub iat: usize,
    /// Expiry, seconds since epoch
    pub exp: usize,
}

/// The authenticated principal, inserted into request extensions by the
/// auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(secret: &str, token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            token_ttl,
        }
    }

    /// Validates a bearer token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ServiceError::AuthError(format!("invalid token: {}", e)))
    }

    /// Mints a token for the given subject. Used by operational tooling and
    /// the test harness; the production login flow lives elsewhere.
    pub fn mint_token(&self, subject: &str, name: Option<&str>) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: subject.to_string(),
            name: name.map(str::to_string),
            iat: now,
            exp: now + self.token_ttl.as_secs() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::InternalError(format!("failed to sign token: {}", e)))
    }
}

fn unauthorized(message: &str) -> Response {
    let body = ErrorResponse {
        error: "Unauthorized".to_string(),
        message: message.to_string(),
        details: None,
        timestamp: Utc::now().to_rfc3339(),
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Authentication middleware: validates the bearer token and inserts an
/// [`AuthUser`] into request extensions. The [`AuthService`] itself is
/// injected into extensions by a layer in `main`.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let token = match token {
        Some(token) if !token.is_empty() => token,
        _ => return unauthorized("missing bearer token"),
    };

    match auth_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser {
                user_id: claims.sub,
                name: claims.name,
            });
            next.run(request).await
        }
        Err(_) => unauthorized("invalid or expired bearer token"),
    }
}

/// Extension methods for Router to attach the auth middleware.
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            "test_secret_key_for_testing_purposes_only_32chars",
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn minted_token_validates() {
        let svc = service();
        let token = svc.mint_token("user-1", Some("Pat")).expect("mint");
        let claims = svc.validate_token(&token).expect("validate");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.name.as_deref(), Some("Pat"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let svc = service();
        assert!(svc.validate_token("not-a-jwt").is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let svc = service();
        let other = AuthService::new(
            "a_completely_different_secret_that_is_also_long",
            Duration::from_secs(3600),
        );
        let token = other.mint_token("user-1", None).expect("mint");
        assert!(svc.validate_token(&token).is_err());
    }
}
