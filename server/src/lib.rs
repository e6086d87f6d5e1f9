//! pfoertner-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den Einstiegspunkt fuer
//! Integrationstests bereit.

pub mod config;

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use chrono::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use pfoertner_api::{api_router, AppState};
use pfoertner_auth::{AuthService, BenutzerVerwaltung, MemoryTokenRegister, TokenDienst};
use pfoertner_db::{DatabaseConfig, SqliteDb};

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Server und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbank oeffnen (fuehrt Migrationen aus)
    /// 2. Session-Register mit Cleanup-Task aufbauen
    /// 3. Token-Dienst aus dem injizierten Geheimnis bauen
    /// 4. Services verdrahten und REST-API starten
    /// 5. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        if self.config.auth.geheimnis.is_empty() {
            anyhow::bail!(
                "Kein Signiergeheimnis konfiguriert ([auth] geheimnis) – Start verweigert"
            );
        }

        tracing::info!(
            server_name = %self.config.server.name,
            api = %self.config.api_bind_adresse(),
            "Server startet"
        );

        let db = SqliteDb::oeffnen(&DatabaseConfig {
            url: self.config.datenbank.url.clone(),
            max_verbindungen: self.config.datenbank.max_verbindungen,
        })
        .await?;
        let db = Arc::new(db);

        let register = MemoryTokenRegister::neu_mit_cleanup(MemoryTokenRegister::neu());

        let token_dienst = Arc::new(TokenDienst::neu(
            &self.config.auth.geheimnis,
            Duration::hours(self.config.auth.token_ttl_stunden),
        ));

        let auth = Arc::new(AuthService::neu(
            Arc::clone(&db),
            Arc::clone(&register),
            token_dienst,
        ));
        let verwaltung = Arc::new(BenutzerVerwaltung::neu(Arc::clone(&db), Arc::clone(&db)));

        let state = AppState::neu(auth, verwaltung);

        let app: Router = api_router(state)
            .route("/health", get(health))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        let listener = tokio::net::TcpListener::bind(self.config.api_bind_adresse()).await?;
        tracing::info!(addr = %self.config.api_bind_adresse(), "REST-API gestartet");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}

/// GET /health – Health-Check-Endpunkt
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Wartet auf Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Shutdown-Signal nicht verfuegbar: {e}");
    } else {
        tracing::info!("Shutdown-Signal empfangen");
    }
}
