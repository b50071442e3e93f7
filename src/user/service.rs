use crate::error::Result;
use crate::transactional::TransactionManager;
use crate::user::domain::{User, UserPayload};
use crate::user::repository::UserRepository;
use std::sync::Arc;
use user_registry_macro::transactional;

/// User operations, each in its own transaction.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    transaction_manager: Arc<dyn TransactionManager>,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        transaction_manager: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            repository,
            transaction_manager,
        }
    }

    #[transactional(read_only = true)]
    pub async fn get_all(&self) -> Result<Vec<User>> {
        self.repository.find_all().await
    }

    #[transactional(read_only = true)]
    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.repository.find_by_id(id).await
    }

    #[transactional]
    pub async fn save(&self, user: User) -> Result<User> {
        self.repository.save(user).await
    }

    /// Overwrites an existing user; `None` when there is no user `id`.
    /// The lookup and the write share one transaction.
    #[transactional]
    pub async fn update(&self, id: i64, payload: UserPayload) -> Result<Option<User>> {
        let Some(mut user) = self.repository.find_by_id(id).await? else {
            return Ok(None);
        };

        user.overwrite_with(payload);
        self.repository.update_by_id(id, user).await
    }

    #[transactional]
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.repository.delete_by_id(id).await
    }
}
