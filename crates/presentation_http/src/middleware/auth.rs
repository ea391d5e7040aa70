//! Bearer token authentication
//!
//! [`BearerToken`] pulls the raw token out of `Authorization: Bearer ...`;
//! [`AuthenticatedUser`] additionally verifies it and loads the account.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use domain::PublicUser;
use tracing::debug;

use crate::{error::ApiError, state::AppState};

const MISSING_TOKEN: &str = "Token di autenticazione mancante";

/// Raw bearer token from the `Authorization` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    debug!(reason = %e, "Bearer token missing");
                    ApiError::Unauthorized(MISSING_TOKEN.to_string())
                })?;

        let token = bearer.token().trim();
        if token.is_empty() {
            return Err(ApiError::Unauthorized(MISSING_TOKEN.to_string()));
        }
        Ok(Self(token.to_string()))
    }
}

/// The account behind a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub PublicUser);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let user = state.auth.current_user(&token).await?;
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        extract::Request,
        http::{StatusCode, header::AUTHORIZATION},
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;

    async fn echo(BearerToken(token): BearerToken) -> String {
        token
    }

    fn request(auth: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn call(auth: Option<&str>) -> (StatusCode, String) {
        let response = Router::new()
            .route("/", get(echo))
            .oneshot(request(auth))
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn bearer_token_is_extracted() {
        let (status, body) = call(Some("Bearer abc.def.ghi")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "abc.def.ghi");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let (status, body) = call(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(MISSING_TOKEN));
    }

    #[tokio::test]
    async fn other_schemes_are_unauthorized() {
        let (status, _) = call(Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
