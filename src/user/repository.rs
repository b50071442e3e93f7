use crate::error::Result;
use crate::transactional::{connection_of, get_current_transaction};
use crate::user::domain::User;
use crate::user::entity::{self, Entity as UserEntity};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;

/// Persistence operations for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, ordered by id.
    async fn find_all(&self) -> Result<Vec<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Inserts when `user.id` is `None`, otherwise updates the row with that
    /// id, inserting it if missing. Returns the stored user.
    async fn save(&self, user: User) -> Result<User>;

    /// Overwrites the fields of row `id`. Never inserts: `None` when the row
    /// is gone.
    async fn update_by_id(&self, id: i64, user: User) -> Result<Option<User>>;

    /// Removes the row; does nothing when it is absent.
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

/// Runs `$body` on the task's active transaction, or on the pool when there
/// is none.
macro_rules! on_connection {
    ($db:expr, |$conn:ident| $body:expr) => {{
        match get_current_transaction() {
            Some(tx) => {
                let mut guard = tx.lock().await;
                let $conn = connection_of(&mut **guard)?;
                $body
            }
            None => {
                let $conn = $db;
                $body
            }
        }
    }};
}

pub struct SeaOrmUserRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmUserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_all(&self) -> Result<Vec<User>> {
        on_connection!(self.db.as_ref(), |conn| {
            let models = UserEntity::find()
                .order_by_asc(entity::Column::Id)
                .all(conn)
                .await?;
            Ok(models.into_iter().map(User::from).collect())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        on_connection!(self.db.as_ref(), |conn| {
            let model = UserEntity::find_by_id(id).one(conn).await?;
            Ok(model.map(User::from))
        })
    }

    async fn save(&self, user: User) -> Result<User> {
        on_connection!(self.db.as_ref(), |conn| {
            let mut active = entity::ActiveModel {
                id: NotSet,
                name: Set(user.name.clone()),
                email: Set(user.email.clone()),
                password: Set(user.password.clone()),
            };

            let model = match user.id {
                None => active.insert(conn).await?,
                Some(id) => {
                    active.id = Set(id);
                    if UserEntity::find_by_id(id).one(conn).await?.is_some() {
                        active.update(conn).await?
                    } else {
                        tracing::debug!(id, "no user row to update, inserting");
                        active.insert(conn).await?
                    }
                }
            };

            Ok(User::from(model))
        })
    }

    async fn update_by_id(&self, id: i64, user: User) -> Result<Option<User>> {
        on_connection!(self.db.as_ref(), |conn| {
            let result = UserEntity::update_many()
                .set(entity::ActiveModel {
                    id: NotSet,
                    name: Set(user.name.clone()),
                    email: Set(user.email.clone()),
                    password: Set(user.password.clone()),
                })
                .filter(entity::Column::Id.eq(id))
                .exec(conn)
                .await?;

            if result.rows_affected == 0 {
                tracing::debug!(id, "no user row to update");
                return Ok(None);
            }
            Ok(Some(User {
                id: Some(id),
                ..user
            }))
        })
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        on_connection!(self.db.as_ref(), |conn| {
            let result = UserEntity::delete_by_id(id).exec(conn).await?;
            tracing::debug!(id, rows_affected = result.rows_affected, "deleted user");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::memory_database;
    use crate::error::RegistryError;

    async fn repository() -> SeaOrmUserRepository {
        SeaOrmUserRepository::new(memory_database().await)
    }

    #[tokio::test]
    async fn test_find_all_empty() {
        let repo = repository().await;
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_distinct_ids() {
        let repo = repository().await;

        let ana = repo.save(User::new("Ana", "ana@x.com", "p1")).await.unwrap();
        let bea = repo.save(User::new("Bea", "bea@x.com", "p2")).await.unwrap();

        assert!(ana.id.is_some());
        assert!(bea.id.is_some());
        assert_ne!(ana.id, bea.id);
        assert_eq!(repo.find_all().await.unwrap(), vec![ana, bea]);
    }

    #[tokio::test]
    async fn test_save_with_id_updates_in_place() {
        let repo = repository().await;
        let mut ana = repo.save(User::new("Ana", "ana@x.com", "p1")).await.unwrap();

        ana.name = "Ana B".to_string();
        ana.password = "p2".to_string();
        let saved = repo.save(ana.clone()).await.unwrap();

        assert_eq!(saved, ana);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_with_unknown_id_inserts() {
        let repo = repository().await;
        let user = User {
            id: Some(42),
            ..User::new("Ana", "ana@x.com", "p1")
        };

        let saved = repo.save(user.clone()).await.unwrap();

        assert_eq!(saved, user);
        assert_eq!(repo.find_by_id(42).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = repository().await;
        repo.save(User::new("Ana", "ana@x.com", "p1")).await.unwrap();

        let err = repo
            .save(User::new("Other", "ana@x.com", "p2"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_update_by_id_never_inserts() {
        let repo = repository().await;
        let ana = repo.save(User::new("Ana", "ana@x.com", "p1")).await.unwrap();
        let id = ana.id.unwrap();

        let updated = repo
            .update_by_id(id, User::new("Ana B", "ana@x.com", "p2"))
            .await
            .unwrap();
        assert_eq!(
            updated,
            Some(User {
                id: Some(id),
                ..User::new("Ana B", "ana@x.com", "p2")
            })
        );

        assert_eq!(
            repo.update_by_id(42, User::new("Ghost", "g@x.com", "p3"))
                .await
                .unwrap(),
            None
        );
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_conflict() {
        let repo = repository().await;
        repo.save(User::new("Ana", "ana@x.com", "p1")).await.unwrap();
        let bea = repo.save(User::new("Bea", "bea@x.com", "p2")).await.unwrap();
        let id = bea.id.unwrap();

        let err = repo
            .update_by_id(id, User::new("Bea", "ana@x.com", "p2"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict(_)), "got {err:?}");
        assert_eq!(repo.find_by_id(id).await.unwrap(), Some(bea));
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let repo = repository().await;
        let ana = repo.save(User::new("Ana", "ana@x.com", "p1")).await.unwrap();

        repo.delete_by_id(999).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 1);

        repo.delete_by_id(ana.id.unwrap()).await.unwrap();
        assert_eq!(repo.find_by_id(ana.id.unwrap()).await.unwrap(), None);
    }
}
