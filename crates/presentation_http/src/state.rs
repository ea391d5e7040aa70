//! Application state shared across handlers

use std::sync::Arc;

use application::{
    ApplicationError, AudioWorkflowService, AuthService, BpmnService, ChatService,
    DatabaseHealthPort, InferencePort, MigrationPort, PasswordHasherPort, SuggestionService,
    TokenIssuerPort, TranscriptionPort, UserStore, VbaService,
};
use infrastructure::{
    AppConfig, Argon2PasswordHasher, HostedInferenceAdapter, InMemoryUserStore, JwtTokenIssuer,
    PgDatabaseHealth, PgMigrator, PgUserStore, UnconfiguredDatabase, WhisperTranscriptionAdapter,
    create_pool,
};
use tracing::{info, warn};

use crate::middleware::{InMemoryRateLimitStore, RateLimitStore};

#[derive(Clone)]
pub struct AppState {
    pub bpmn: Arc<BpmnService>,
    pub vba: Arc<VbaService>,
    pub chat: Arc<ChatService>,
    pub suggestions: Arc<SuggestionService>,
    /// Absent when no transcription provider is configured
    pub audio: Option<Arc<AudioWorkflowService>>,
    pub auth: Arc<AuthService>,
    /// Absent without a database
    pub migrator: Option<Arc<dyn MigrationPort>>,
    pub database: Arc<dyn DatabaseHealthPort>,
    pub rate_limits: Arc<dyn RateLimitStore>,
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bpmn", &self.bpmn)
            .field("audio", &self.audio.is_some())
            .field("migrator", &self.migrator.is_some())
            .field("environment", &self.config.environment)
            .finish_non_exhaustive()
    }
}

/// Outbound adapters the state is assembled from
pub struct Adapters {
    pub routes: Vec<Arc<dyn InferencePort>>,
    pub transcriber: Option<Arc<dyn TranscriptionPort>>,
    pub users: Arc<dyn UserStore>,
    pub hasher: Arc<dyn PasswordHasherPort>,
    pub tokens: Arc<dyn TokenIssuerPort>,
    pub migrator: Option<Arc<dyn MigrationPort>>,
    pub database: Arc<dyn DatabaseHealthPort>,
}

impl std::fmt::Debug for Adapters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapters")
            .field("routes", &self.routes.iter().map(|r| r.label()).collect::<Vec<_>>())
            .field("transcriber", &self.transcriber.is_some())
            .field("migrator", &self.migrator.is_some())
            .finish_non_exhaustive()
    }
}

impl Adapters {
    /// Real adapters for the given configuration.
    ///
    /// Without `DATABASE_URL` users live in memory and the migration and
    /// health endpoints report the database as unavailable. Must run inside
    /// a tokio runtime because the Postgres pool is created lazily there.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        let routes =
            HostedInferenceAdapter::from_routes(config.ai.routes(config.server.public_url.as_deref()))?;
        info!(
            routes = ?routes.iter().map(|r| r.label()).collect::<Vec<_>>(),
            "Inference routes configured"
        );

        let transcriber = match config.ai.transcription() {
            Some(transcription) => Some(
                Arc::new(WhisperTranscriptionAdapter::new(transcription)?)
                    as Arc<dyn TranscriptionPort>,
            ),
            None => {
                warn!("No transcription provider configured, audio processing disabled");
                None
            },
        };

        let secret = config.security.jwt_secret_or_default();
        let tokens = Arc::new(JwtTokenIssuer::new(
            &secret,
            config.security.token_issuer.clone(),
            chrono::Duration::hours(config.security.token_ttl_hours),
        ));

        let (users, migrator, database): (
            Arc<dyn UserStore>,
            Option<Arc<dyn MigrationPort>>,
            Arc<dyn DatabaseHealthPort>,
        ) = if config.database.is_configured() {
            let pool = create_pool(&config.database)?;
            (
                Arc::new(PgUserStore::new(pool.clone())),
                Some(Arc::new(PgMigrator::new(pool.clone()))),
                Arc::new(PgDatabaseHealth::new(pool)),
            )
        } else {
            warn!("DATABASE_URL not set, users are kept in memory");
            (
                Arc::new(InMemoryUserStore::new()),
                None,
                Arc::new(UnconfiguredDatabase),
            )
        };

        Ok(Self {
            routes,
            transcriber,
            users,
            hasher: Arc::new(Argon2PasswordHasher::new()),
            tokens,
            migrator,
            database,
        })
    }
}

impl AppState {
    pub fn new(config: AppConfig, adapters: Adapters) -> Self {
        let Adapters {
            routes,
            transcriber,
            users,
            hasher,
            tokens,
            migrator,
            database,
        } = adapters;

        Self {
            bpmn: Arc::new(BpmnService::new(&routes)),
            vba: Arc::new(VbaService::new(&routes)),
            chat: Arc::new(ChatService::new(&routes)),
            suggestions: Arc::new(SuggestionService::new(&routes)),
            audio: transcriber.map(|t| Arc::new(AudioWorkflowService::new(t, &routes))),
            auth: Arc::new(AuthService::new(users, hasher, tokens)),
            migrator,
            database,
            rate_limits: Arc::new(InMemoryRateLimitStore::new()),
            config: Arc::new(config),
        }
    }

    pub fn from_config(config: AppConfig) -> Result<Self, ApplicationError> {
        let adapters = Adapters::from_config(&config)?;
        Ok(Self::new(config, adapters))
    }
}
