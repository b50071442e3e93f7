use crate::error::{RegistryError, Result};
use crate::user::domain::{User, UserPayload};
use crate::user::service::UserService;
use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

/// HTTP handlers for `/users`.
pub struct UserController {
    service: Arc<UserService>,
}

impl UserController {
    pub fn new(service: Arc<UserService>) -> Self {
        Self { service }
    }

    pub fn base_path() -> &'static str {
        "/users"
    }

    pub async fn list(&self) -> Result<Json<Vec<User>>> {
        Ok(Json(self.service.get_all().await?))
    }

    pub async fn detail(&self, id: i64) -> Result<Json<User>> {
        match self.service.user_by_id(id).await? {
            Some(user) => Ok(Json(user)),
            None => Err(RegistryError::NotFound),
        }
    }

    pub async fn create(&self, payload: UserPayload) -> Result<Response> {
        let created = self.service.save(User::from(payload)).await?;
        tracing::info!(id = ?created.id, "user created");
        Ok((StatusCode::CREATED, Json(created)).into_response())
    }

    /// Full overwrite of an existing user. Never creates one.
    pub async fn update(&self, id: i64, payload: UserPayload) -> Result<Response> {
        let Some(saved) = self.service.update(id, payload).await? else {
            return Err(RegistryError::NotFound);
        };

        tracing::info!(id, "user updated");
        Ok((StatusCode::CREATED, Json(saved)).into_response())
    }

    pub async fn remove(&self, id: i64) -> Result<StatusCode> {
        if self.service.user_by_id(id).await?.is_none() {
            return Err(RegistryError::NotFound);
        }

        self.service.delete(id).await?;
        tracing::info!(id, "user deleted");
        Ok(StatusCode::NO_CONTENT)
    }

    /// Routes relative to [`Self::base_path`].
    pub fn router<S>(controller: Arc<Self>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route(
                "/",
                get({
                    let controller = controller.clone();
                    move || async move { controller.list().await.into_response() }
                })
                .post({
                    let controller = controller.clone();
                    move |Json(payload): Json<UserPayload>| async move {
                        controller.create(payload).await.into_response()
                    }
                }),
            )
            .route(
                "/{id}",
                get({
                    let controller = controller.clone();
                    move |Path(id): Path<i64>| async move {
                        controller.detail(id).await.into_response()
                    }
                })
                .put({
                    let controller = controller.clone();
                    move |Path(id): Path<i64>, Json(payload): Json<UserPayload>| async move {
                        controller.update(id, payload).await.into_response()
                    }
                })
                .delete({
                    let controller = controller.clone();
                    move |Path(id): Path<i64>| async move {
                        controller.remove(id).await.into_response()
                    }
                }),
            )
    }
}
