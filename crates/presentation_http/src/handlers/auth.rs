//! Account registration, login and profile

use application::{AuthSession, RegisterCommand};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use domain::PublicUser;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::ApiError,
    middleware::{AuthenticatedUser, FieldRule, ResponseCommit, ValidatedJson, ValidationSchema},
    state::AppState,
};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub nome: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("nome", &self.nome)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: PublicUser,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token.token,
            expires_at: session.token.expires_at,
            user: session.user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

pub fn register_schema() -> ValidationSchema {
    ValidationSchema::new()
        .field("email", FieldRule::email().required().length(None, Some(254)))
        .field(
            "password",
            FieldRule::string()
                .required()
                .verbatim()
                .length(Some(8), Some(128)),
        )
        .field("nome", FieldRule::string().length(None, Some(100)))
}

pub fn login_schema() -> ValidationSchema {
    ValidationSchema::new()
        .field("email", FieldRule::email().required().length(None, Some(254)))
        .field(
            "password",
            FieldRule::string()
                .required()
                .verbatim()
                .length(None, Some(128)),
        )
}

/// Create an account and sign it in
///
/// The account exists once the store accepted it, so the outcome is
/// committed before the token is returned.
#[instrument(skip(state, commit, request), fields(email = %request.email))]
pub async fn register(
    State(state): State<AppState>,
    commit: ResponseCommit,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state
        .auth
        .register(RegisterCommand {
            email: request.email,
            password: request.password,
            nome: request.nome,
        })
        .await?;
    commit.mark();

    Ok((StatusCode::CREATED, Json(session.into())))
}

#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(session.into()))
}

pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse { user })
}
