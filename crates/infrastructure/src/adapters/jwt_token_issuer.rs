//! Bearer token issuance using HS256 JWTs

use application::{
    error::ApplicationError,
    ports::{IssuedToken, TokenClaims, TokenIssuerPort},
};
use chrono::{DateTime, Duration, Utc};
use domain::{User, UserId};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Registered and private claims carried by every token
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
    iss: String,
}

pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for JwtTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl JwtTokenIssuer {
    pub fn new(secret: &SecretString, issuer: impl Into<String>, ttl: Duration) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            issuer: issuer.into(),
            ttl,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation
    }
}

impl TokenIssuerPort for JwtTokenIssuer {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    fn issue(&self, user: &User) -> Result<IssuedToken, ApplicationError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.as_str().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApplicationError::Internal(format!("Failed to sign token: {e}")))?;

        debug!("Token issued");
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, ApplicationError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation()).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidIssuer => "token issuer mismatch",
                ErrorKind::InvalidSignature => "token signature invalid",
                _ => "token malformed",
            };
            ApplicationError::NotAuthorized(reason.to_string())
        })?;

        let claims = data.claims;
        let user_id = UserId::parse(&claims.sub)
            .map_err(|_| ApplicationError::NotAuthorized("token subject invalid".to_string()))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| ApplicationError::NotAuthorized("token expiry invalid".to_string()))?;

        Ok(TokenClaims {
            user_id,
            email: claims.email,
            expires_at,
        })
    }
}
