//! SQLite-Implementierung der Repository-Traits

pub mod pool;
pub mod roles;
pub mod users;

pub use pool::SqliteDb;
