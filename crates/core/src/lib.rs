//! Domain logic for the BuildCRM service.
//!
//! Pure functions and types only: validation, statistics, pagination,
//! derived display fields, and role capabilities. No database or HTTP
//! dependencies live here.

pub mod case;
pub mod client;
pub mod display;
pub mod error;
pub mod pagination;
pub mod project;
pub mod roles;
pub mod stats;
pub mod status;
pub mod types;
