use crate::config::AppConfig;
use crate::database;
use crate::error::Result;
use crate::interceptor::{Interceptor, InterceptorLayer, LoggingInterceptor};
use crate::transactional::{SeaOrmTransactionManager, TransactionManager};
use crate::user::{SeaOrmUserRepository, UserController, UserRepository, UserService};
use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// A feature wired from its parts, exposing its routes to the application.
pub trait Module: Send + Sync {
    fn name(&self) -> &'static str;

    fn routes(&self) -> Router;
}

/// Store → service → controller for users, built by hand.
pub struct UserModule {
    controller: Arc<UserController>,
}

impl UserModule {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let repository: Arc<dyn UserRepository> =
            Arc::new(SeaOrmUserRepository::new(Arc::clone(&db)));
        let transaction_manager: Arc<dyn TransactionManager> =
            Arc::new(SeaOrmTransactionManager::new(db));
        let service = Arc::new(UserService::new(repository, transaction_manager));

        Self {
            controller: Arc::new(UserController::new(service)),
        }
    }
}

impl Module for UserModule {
    fn name(&self) -> &'static str {
        "UserModule"
    }

    fn routes(&self) -> Router {
        Router::new().nest(
            UserController::base_path(),
            UserController::router(Arc::clone(&self.controller)),
        )
    }
}

/// Every feature module of the application.
pub fn modules(db: Arc<DatabaseConnection>) -> Vec<Box<dyn Module>> {
    vec![Box::new(UserModule::new(db))]
}

/// Mounts every module under `config.api_prefix` and wraps the result in the
/// request interceptors.
pub fn build_router(db: Arc<DatabaseConnection>, config: &AppConfig) -> Router {
    let mut api = Router::new();
    for module in modules(db) {
        tracing::debug!(module = module.name(), "mounting module");
        api = api.merge(module.routes());
    }

    let app = if config.api_prefix.is_empty() {
        api
    } else {
        Router::new().nest(&config.api_prefix, api)
    };

    let interceptors: Vec<Arc<dyn Interceptor>> = vec![Arc::new(LoggingInterceptor)];
    app.layer(InterceptorLayer::new(interceptors))
}

/// Connects, prepares the schema, and returns the application router.
pub async fn bootstrap(config: &AppConfig) -> Result<Router> {
    let db = database::connect(&config.database).await?;
    if config.database.auto_create {
        database::ensure_schema(&db).await?;
    }
    database::validate_schema(&db).await?;

    Ok(build_router(Arc::new(db), config))
}
