//! Connection setup and schema bootstrap for the user table.
//!
//! The table layout is owned by [`crate::user::entity`]. At startup the
//! explicit field ↔ column mapping is checked against the entity and the live
//! table is probed with a query selecting every mapped column, so a drifted
//! schema fails fast instead of on the first request.

use crate::config::DatabaseConfig;
use crate::error::{RegistryError, Result};
use crate::user::entity::{self, COLUMN_MAPPING, Entity as UserEntity};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityName, EntityTrait,
    IdenStatic, Iterable, QuerySelect, Schema,
};
use std::time::Duration;

fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .sqlx_logging(false);

    // An in-memory database lives exactly as long as its connection, so the
    // pool must never retire it.
    if config.is_in_memory() {
        options
            .min_connections(1)
            .max_lifetime(None::<Duration>)
            .idle_timeout(None::<Duration>);
    }
    options
}

/// Opens the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    if config.is_in_memory() {
        tracing::warn!("using an in-memory database; data is lost on shutdown");
    }

    let db = Database::connect(connect_options(config))
        .await
        .map_err(|e| RegistryError::Database(format!("failed to connect: {e}")))?;

    tracing::info!(backend = ?db.get_database_backend(), "database connected");
    Ok(db)
}

/// Creates the `usuarios` table when it does not exist yet.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    let backend = db.get_database_backend();
    let mut create = Schema::new(backend).create_table_from_entity(UserEntity);
    create.if_not_exists();

    db.execute_unprepared(&backend.build(&create).sql)
        .await
        .map_err(|e| RegistryError::Schema(format!("failed to create users table: {e}")))?;

    tracing::debug!(table = UserEntity.table_name(), "users table ensured");
    Ok(())
}

/// Checks the mapping against the entity, then the entity against the table.
pub async fn validate_schema(db: &DatabaseConnection) -> Result<()> {
    let columns: Vec<&str> = entity::Column::iter().map(|c| c.as_str()).collect();
    check_mapping(&columns, COLUMN_MAPPING)?;

    UserEntity::find()
        .limit(1)
        .all(db)
        .await
        .map_err(|e| {
            RegistryError::Schema(format!(
                "table {} does not match the user mapping: {e}",
                UserEntity.table_name()
            ))
        })?;

    tracing::info!(
        table = UserEntity.table_name(),
        columns = columns.len(),
        "users schema validated"
    );
    Ok(())
}

fn check_mapping(columns: &[&str], mapping: &[(&str, &str)]) -> Result<()> {
    let mut expected: Vec<&str> = columns.to_vec();
    let mut mapped: Vec<&str> = mapping.iter().map(|(_, column)| *column).collect();
    expected.sort_unstable();
    mapped.sort_unstable();

    if expected != mapped {
        return Err(RegistryError::Schema(format!(
            "entity columns {expected:?} do not match mapped columns {mapped:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Arc;

    /// A fresh single-connection in-memory database with the users table.
    pub(crate) async fn memory_database() -> Arc<DatabaseConnection> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            auto_create: true,
        };
        let db = connect(&config).await.unwrap();
        ensure_schema(&db).await.unwrap();
        Arc::new(db)
    }
}
