use std::sync::Arc;

use axum::Router;
use clientele_core::clock::SystemClock;
use clientele_core::config::{AppConfig, ConfigError, LoadOptions};
use clientele_db::repositories::SqlCustomerRepository;
use clientele_db::{connect_with_config, migrations, DbPool};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{customers, health, service::CustomerService};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
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

    Ok(Application { config, db_pool })
}

impl Application {
    pub fn customer_service(&self) -> CustomerService {
        CustomerService::new(
            Arc::new(SqlCustomerRepository::new(self.db_pool.clone())),
            Arc::new(SystemClock),
        )
    }

    pub fn router(&self) -> Router {
        app_router(self.customer_service(), self.db_pool.clone())
    }
}

pub fn app_router(service: CustomerService, db_pool: DbPool) -> Router {
    customers::router(service).merge(health::router(db_pool)).layer(TraceLayer::new_for_http())
}
