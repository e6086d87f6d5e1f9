//! Route-Definitionen der REST-API (/api/...)

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{auth, benutzer};
use crate::middleware::{admin_middleware, auth_middleware};
use crate::AppState;

/// Erstellt den vollstaendigen /api/-Router
pub fn api_router(state: AppState) -> Router {
    // Oeffentliche Endpunkte
    let oeffentlich = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/validate", get(auth::validate));

    // Geschuetzte Endpunkte (register-konsistente Token-Pruefung)
    let geschuetzt = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", get(auth::logout))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/password", put(auth::passwort_aendern))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Admin-Endpunkte (zusaetzlich Rollenpruefung)
    let admin = Router::new()
        .route("/api/user/all", post(benutzer::alle))
        .route("/api/user/search", post(benutzer::suchen))
        .route("/api/user/role/all", get(benutzer::rollen_katalog))
        .route("/api/user/username/:username", get(benutzer::nach_name))
        .route(
            "/api/user/:id",
            get(benutzer::nach_id)
                .put(benutzer::aktualisieren)
                .delete(benutzer::loeschen),
        )
        .route("/api/user/:id/role", put(benutzer::rollen_aendern))
        .route("/api/user/:id/password", put(benutzer::passwort_aendern))
        .route(
            "/api/user/:id/password/force",
            put(benutzer::passwort_erzwingen),
        )
        .route("/api/user/:id/block", put(benutzer::bannen))
        .route("/api/user/:id/unblock", put(benutzer::entbannen))
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(oeffentlich)
        .merge(geschuetzt)
        .merge(admin)
        .with_state(state)
}
