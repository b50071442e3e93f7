use serde::{Deserialize, Serialize};

use super::entity;

/// A user as seen by the service and on the wire.
///
/// `id` is `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of create and update requests. Any `id` sent along is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Replaces every mutable field; `id` is kept.
    pub fn overwrite_with(&mut self, payload: UserPayload) {
        self.name = payload.name;
        self.email = payload.email;
        self.password = payload.password;
    }
}

impl From<UserPayload> for User {
    fn from(payload: UserPayload) -> Self {
        User::new(payload.name, payload.email, payload.password)
    }
}

impl From<entity::Model> for User {
    fn from(model: entity::Model) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            email: model.email,
            password: model.password,
        }
    }
}
