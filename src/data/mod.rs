//! Data layer module
//!
//! SQLite persistence for OAuth-created users.

mod database;
mod models;

pub use database::{Database, UserStore};
pub use models::*;

#[cfg(test)]
pub use database::MockUserStore;
