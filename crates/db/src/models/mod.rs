//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//! - Where the wire shape differs from the row, a camelCase view model

mod columns;

pub mod client;
pub mod project;
pub mod session;
pub mod user;
