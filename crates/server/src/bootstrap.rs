use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tracing::info;

use tutur_agent::{build_llm_client, CatalogRetriever, GuideGenerator};
use tutur_core::config::{AppConfig, ConfigError, LoadOptions};
use tutur_core::errors::ApplicationError;
use tutur_core::identifier::IdentifierGenerator;
use tutur_core::resolver::ActivityResolver;
use tutur_db::repositories::{
    ActivityRepository, SqlActivityRepository, SqlItineraryRepository, SqlSequenceSource,
};
use tutur_db::{connect_with_settings, migrations, DbPool};

use crate::guide::GuideService;
use crate::persistence::{PersistenceQueue, TracingObserver};
use crate::{guide, health, info as info_routes};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub guides: Arc<GuideService>,
    pub activities: Arc<dyn ActivityRepository>,
    pub persistence: PersistenceQueue,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client setup failed: {0}")]
    Llm(String),
    #[error("guide service setup failed: {0}")]
    Service(#[source] ApplicationError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        llm_provider = ?config.llm.provider,
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let activities = Arc::new(SqlActivityRepository::new(db_pool.clone()));
    let itineraries = Arc::new(SqlItineraryRepository::new(db_pool.clone()));
    let sequence = Arc::new(SqlSequenceSource::new(db_pool.clone()));

    let llm = build_llm_client(&config.llm)
        .map_err(|error| BootstrapError::Llm(format!("{error:#}")))?;
    let retriever =
        Arc::new(CatalogRetriever::new(activities.clone(), config.retrieval.max_documents));
    let generator = GuideGenerator::new(llm, retriever).map_err(BootstrapError::Service)?;

    let persistence = PersistenceQueue::start(
        itineraries,
        Arc::new(TracingObserver),
        config.persistence.workers,
        config.persistence.queue_capacity,
    );

    let guides = Arc::new(GuideService::new(
        generator,
        ActivityResolver::new(activities.clone()),
        IdentifierGenerator::new(sequence),
        persistence.handle(),
    ));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        persistence_workers = config.persistence.workers,
        "guide pipeline assembled"
    );

    Ok(Application { config, db_pool, guides, activities, persistence })
}

impl Application {
    pub fn router(&self) -> Router {
        Router::new()
            .merge(health::router(self.db_pool.clone()))
            .merge(guide::router(Arc::clone(&self.guides)))
            .nest(info_routes::INFO_PREFIX, info_routes::router(Arc::clone(&self.activities)))
    }

    /// Drains pending itinerary writes, then closes the pool.
    pub async fn shutdown(self) {
        let grace = Duration::from_secs(self.config.server.graceful_shutdown_secs);
        self.persistence.shutdown(grace).await;
        self.db_pool.close().await;
        info!(event_name = "system.server.stopped", correlation_id = "shutdown", "shutdown complete");
    }
}
