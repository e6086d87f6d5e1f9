//! pfoertner-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern fuer die Benutzer- und
//! Rollendaten bereit. Die Konten werden niemals physisch geloescht;
//! jede Mutation laeuft ueber ein versionsgeprueftes Speichern
//! (Optimistic Locking).

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

// Bequeme Re-Exporte
pub use error::{DbError, DbResult};
pub use repository::{DatabaseConfig, RoleRepository, UserRepository};
pub use sqlite::SqliteDb;
