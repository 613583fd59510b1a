//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod client_repo;
pub mod project_repo;
pub mod session_repo;
pub mod stats_repo;
pub mod user_repo;

pub use client_repo::ClientRepo;
pub use project_repo::ProjectRepo;
pub use session_repo::SessionRepo;
pub use stats_repo::StatsRepo;
pub use user_repo::UserRepo;
