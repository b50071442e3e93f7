//! # user-registry
//!
//! A small HTTP service for creating, reading, updating and deleting users,
//! backed by a relational table through sea-orm.
//!
//! Routes, mounted under the configured `API_PREFIX`:
//!
//! | Method   | Path          | Success                |
//! |----------|---------------|------------------------|
//! | `GET`    | `/users`      | `200` with every user  |
//! | `GET`    | `/users/{id}` | `200`, `404` if absent |
//! | `POST`   | `/users`      | `201` with the created user |
//! | `PUT`    | `/users/{id}` | `201`, `404` if absent |
//! | `DELETE` | `/users/{id}` | `204`, `404` if absent |
//!
//! Everything is wired by hand in [`module::UserModule`]; there is no
//! container.

// Lets `#[transactional]` expand to `::user_registry::...` inside this crate.
extern crate self as user_registry;

pub mod config;
pub mod database;
pub mod error;
pub mod exception;
pub mod interceptor;
pub mod lifecycle;
pub mod module;
pub mod transactional;
pub mod user;

pub use config::{AppConfig, ConfigService, DatabaseConfig};
pub use error::{RegistryError, Result};
pub use module::{Module, UserModule, bootstrap, build_router};
pub use user::{User, UserPayload};

pub use user_registry_macro::transactional;
