//! Pairbook Storage Layer
//!
//! SQLite-backed persistence for the catalogue.
//! One connection per process, shared by every clone of [`Database`].

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
