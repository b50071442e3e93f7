use super::{IsolationLevel, Transaction, TransactionManager, TransactionOptions};
use crate::error::RegistryError;
use async_trait::async_trait;
use sea_orm::{AccessMode, DatabaseConnection, DatabaseTransaction, DbBackend, TransactionTrait};
use std::any::Any;
use std::sync::Arc;

/// Wraps `sea_orm::DatabaseTransaction`.
///
/// SeaORM's commit and rollback consume the transaction, hence the `Option`.
pub struct SeaOrmTransaction {
    pub inner: Option<DatabaseTransaction>,
}

#[async_trait]
impl Transaction for SeaOrmTransaction {
    async fn commit(&mut self) -> Result<(), RegistryError> {
        tracing::debug!("SeaOrmTransaction: committing");
        match self.inner.take() {
            Some(inner) => inner
                .commit()
                .await
                .map_err(|e| RegistryError::Transaction(e.to_string())),
            None => Err(RegistryError::Transaction(
                "Attempted to commit a transaction that has already been finalized".to_string(),
            )),
        }
    }

    async fn rollback(&mut self) -> Result<(), RegistryError> {
        tracing::debug!("SeaOrmTransaction: rolling back");
        match self.inner.take() {
            Some(inner) => inner
                .rollback()
                .await
                .map_err(|e| RegistryError::Transaction(e.to_string())),
            // Already finalized; nothing left to undo.
            None => Ok(()),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Begins SeaORM transactions on a shared connection pool.
#[derive(Clone)]
pub struct SeaOrmTransactionManager {
    conn: Arc<DatabaseConnection>,
}

impl SeaOrmTransactionManager {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }
}

fn to_sea_orm_isolation(level: IsolationLevel) -> sea_orm::IsolationLevel {
    match level {
        IsolationLevel::ReadUncommitted => sea_orm::IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted => sea_orm::IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead => sea_orm::IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable => sea_orm::IsolationLevel::Serializable,
    }
}

#[async_trait]
impl TransactionManager for SeaOrmTransactionManager {
    async fn begin(&self, options: TransactionOptions) -> Result<Box<dyn Transaction>, RegistryError> {
        tracing::debug!(
            propagation = %options.propagation,
            isolation = ?options.isolation.map(|level| level.to_string()),
            read_only = options.read_only,
            "SeaOrmTransactionManager: beginning transaction"
        );

        // SQLite has no per-transaction isolation or access mode.
        let db_tx = if self.conn.get_database_backend() == DbBackend::Sqlite {
            self.conn.begin().await
        } else {
            let access_mode = if options.read_only {
                AccessMode::ReadOnly
            } else {
                AccessMode::ReadWrite
            };
            self.conn
                .begin_with_config(options.isolation.map(to_sea_orm_isolation), Some(access_mode))
                .await
        }
        .map_err(|e| RegistryError::Transaction(e.to_string()))?;

        Ok(Box::new(SeaOrmTransaction {
            inner: Some(db_tx),
        }))
    }
}

/// Borrows the SeaORM connection behind a task's active transaction.
pub fn connection_of(tx: &mut dyn Transaction) -> Result<&DatabaseTransaction, RegistryError> {
    tx.as_any_mut()
        .downcast_mut::<SeaOrmTransaction>()
        .ok_or_else(|| {
            RegistryError::Transaction("active transaction is not a SeaORM transaction".to_string())
        })?
        .inner
        .as_ref()
        .ok_or_else(|| {
            RegistryError::Transaction("active transaction has already been finalized".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Database;

    async fn sqlite() -> Arc<DatabaseConnection> {
        Arc::new(Database::connect("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_commit_twice_fails() {
        let manager = SeaOrmTransactionManager::new(sqlite().await);
        let mut tx = manager.begin(TransactionOptions::default()).await.unwrap();

        tx.commit().await.unwrap();
        assert!(matches!(tx.commit().await, Err(RegistryError::Transaction(_))));
        // Rolling back a finalized transaction is a no-op.
        assert!(tx.rollback().await.is_ok());
    }

    #[tokio::test]
    async fn test_connection_of_finalized_transaction() {
        let manager = SeaOrmTransactionManager::new(sqlite().await);
        let mut tx = manager.begin(TransactionOptions::default()).await.unwrap();

        assert!(connection_of(tx.as_mut()).is_ok());
        tx.rollback().await.unwrap();
        assert!(connection_of(tx.as_mut()).is_err());
    }
}
