//! Request handlers, one submodule per resource.
//!
//! Handlers delegate to the repositories in `buildcrm_db`, run domain
//! validation from `buildcrm_core`, and map errors via [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod auth;
pub mod client;
pub mod dashboard;
pub mod project;
pub mod stats;
pub mod user;
