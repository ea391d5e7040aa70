//! Account registration, login and token resolution

use std::{fmt, sync::Arc};

use domain::{EmailAddress, Password, PublicUser, User};
use tracing::{info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{IssuedToken, PasswordHasherPort, TokenIssuerPort, UserStore},
};

#[derive(Clone)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
    pub nome: Option<String>,
}

impl fmt::Debug for RegisterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCommand")
            .field("email", &self.email)
            .field("nome", &self.nome)
            .finish_non_exhaustive()
    }
}

/// Token plus the user it was issued for
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: IssuedToken,
    pub user: PublicUser,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasherPort>,
    tokens: Arc<dyn TokenIssuerPort>,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasherPort>,
        tokens: Arc<dyn TokenIssuerPort>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    #[instrument(skip(self, command))]
    pub async fn register(&self, command: RegisterCommand) -> Result<AuthSession, ApplicationError> {
        let email = EmailAddress::new(command.email)?;
        let password = Password::new(command.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            info!(domain = email.domain(), "Registration with existing email");
            return Err(ApplicationError::EmailTaken);
        }

        let hash = self.hash_blocking(password).await?;
        let user = User::new(email, command.nome.map(|n| n.trim().to_string()), hash);
        self.users.insert(&user).await?;

        info!(user_id = %user.id, "User registered");
        self.session_for(&user)
    }

    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApplicationError> {
        let Ok(email) = EmailAddress::new(email) else {
            return Err(ApplicationError::InvalidCredentials);
        };

        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!(domain = email.domain(), "Login for unknown account");
            return Err(ApplicationError::InvalidCredentials);
        };

        if !self.verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(ApplicationError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        self.session_for(&user)
    }

    /// Resolve a bearer token to the current account
    #[instrument(skip(self, token))]
    pub async fn current_user(&self, token: &str) -> Result<PublicUser, ApplicationError> {
        let claims = self.tokens.verify(token)?;
        self.users
            .find_by_id(claims.user_id)
            .await?
            .map(|u| u.public())
            .ok_or_else(|| ApplicationError::NotAuthorized("account no longer exists".to_string()))
    }

    fn session_for(&self, user: &User) -> Result<AuthSession, ApplicationError> {
        Ok(AuthSession {
            token: self.tokens.issue(user)?,
            user: user.public(),
        })
    }

    async fn hash_blocking(&self, password: Password) -> Result<String, ApplicationError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(password.expose()))
            .await
            .map_err(|e| ApplicationError::Internal(format!("hashing task failed: {e}")))?
    }

    async fn verify_blocking(&self, password: String, hash: String) -> Result<bool, ApplicationError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| ApplicationError::Internal(format!("verification task failed: {e}")))
    }
}
