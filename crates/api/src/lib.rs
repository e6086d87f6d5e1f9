//! pfoertner-api – REST-Schnittstelle
//!
//! Duenne HTTP-Schicht ueber dem Auth-Kern: Request-Bindung und -Validierung,
//! Antwort-Huelle, Auth-/Rollen-Middleware und Routen. Alle Fachlogik lebt
//! in pfoertner-auth.

pub mod antwort;
pub mod handlers;
pub mod middleware;
pub mod requests;
pub mod routes;

use std::sync::Arc;

use pfoertner_auth::{AuthService, BenutzerVerwaltung, MemoryTokenRegister};
use pfoertner_db::SqliteDb;

/// Konkreter Auth-Service der API (SQLite + In-Memory-Register)
pub type Auth = AuthService<SqliteDb, MemoryTokenRegister>;

/// Konkreter Verwaltungs-Service der API
pub type Verwaltung = BenutzerVerwaltung<SqliteDb, SqliteDb>;

/// Axum-State der REST-API
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    pub verwaltung: Arc<Verwaltung>,
}

impl AppState {
    pub fn neu(auth: Arc<Auth>, verwaltung: Arc<Verwaltung>) -> Self {
        Self { auth, verwaltung }
    }
}

pub use routes::api_router;
