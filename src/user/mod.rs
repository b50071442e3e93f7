//! The user feature: table mapping, store, service and HTTP handlers.

pub mod controller;
pub mod domain;
pub mod entity;
pub mod repository;
pub mod service;

pub use controller::UserController;
pub use domain::{User, UserPayload};
pub use repository::{SeaOrmUserRepository, UserRepository};
pub use service::UserService;
