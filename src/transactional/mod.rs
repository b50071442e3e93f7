use crate::error::RegistryError;
use async_trait::async_trait;
use std::sync::Arc;
use strum_macros::Display;
use tokio::sync::Mutex;

mod orm;

pub use orm::{SeaOrmTransaction, SeaOrmTransactionManager, connection_of};

/// Shared handle to the transaction bound to the current task.
pub type SharedTransaction = Arc<Mutex<Box<dyn Transaction>>>;

tokio::task_local! {
    /// Task-local storage for the active transaction.
    ///
    /// Set by `#[transactional]` for the duration of the wrapped body so that
    /// repositories can join the transaction without it being passed in.
    pub static ACTIVE_TRANSACTION: Option<SharedTransaction>;
}

/// Returns the transaction started by an enclosing `#[transactional]` method,
/// or `None` outside of one.
pub fn get_current_transaction() -> Option<SharedTransaction> {
    ACTIVE_TRANSACTION.try_with(|tx| tx.clone()).unwrap_or(None)
}

/// Isolation levels for database transactions.
///
/// SQLite ignores everything but its own serialized behaviour; Postgres
/// honours all four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IsolationLevel {
    /// Reads may observe uncommitted writes of other transactions.
    ReadUncommitted,

    /// Reads only observe committed data. The default for Postgres.
    ReadCommitted,

    /// Repeated reads of the same row return the same data.
    RepeatableRead,

    /// Equivalent to some serial execution of all transactions.
    Serializable,
}

/// How a new transaction boundary interacts with one already active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Propagation {
    /// Join the active transaction, or begin one if none exists.
    Required,

    /// Always begin a separate transaction.
    RequiresNew,
}

#[derive(Debug, Clone)]
pub struct TransactionOptions {
    pub isolation: Option<IsolationLevel>,
    pub propagation: Propagation,
    pub read_only: bool,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            isolation: None,
            propagation: Propagation::Required,
            read_only: false,
        }
    }
}

/// Begins transactions against the backing store.
#[async_trait]
pub trait TransactionManager: Send + Sync + 'static {
    async fn begin(&self, options: TransactionOptions) -> Result<Box<dyn Transaction>, RegistryError>;
}

/// A transaction that can be finalised exactly once.
#[async_trait]
pub trait Transaction: Send + Sync + std::any::Any {
    async fn commit(&mut self) -> Result<(), RegistryError>;

    async fn rollback(&mut self) -> Result<(), RegistryError>;

    /// Gets this trait object as a mutable `Any` reference for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopTransaction;

    #[async_trait]
    impl Transaction for NoopTransaction {
        async fn commit(&mut self) -> Result<(), RegistryError> {
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), RegistryError> {
            Ok(())
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[tokio::test]
    async fn test_no_transaction_outside_scope() {
        assert!(get_current_transaction().is_none());
    }

    #[tokio::test]
    async fn test_scope_exposes_transaction() {
        let tx: SharedTransaction = Arc::new(Mutex::new(Box::new(NoopTransaction)));

        let seen = ACTIVE_TRANSACTION
            .scope(Some(Arc::clone(&tx)), async {
                get_current_transaction().map(|current| Arc::ptr_eq(&current, &tx))
            })
            .await;

        assert_eq!(seen, Some(true));
        assert!(get_current_transaction().is_none());
    }

    #[test]
    fn test_default_options() {
        let options = TransactionOptions::default();
        assert_eq!(options.propagation, Propagation::Required);
        assert!(options.isolation.is_none());
        assert!(!options.read_only);
        assert_eq!(IsolationLevel::Serializable.to_string(), "Serializable");
    }
}
