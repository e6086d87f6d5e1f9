//! REST-Handler fuer Authentifizierungs-Endpunkte

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::antwort::{aus_fehler, erfolg, fehlschlag, unautorisiert};
use crate::middleware::{bearer_token, client_kontext};
use crate::requests::{AnmeldeAnfrage, PasswortAendernAnfrage, RegistrierungsAnfrage};
use crate::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegistrierungsAnfrage>,
) -> Response {
    if let Err(msg) = body.pruefen() {
        return fehlschlag(&msg);
    }

    let registrierung = pfoertner_auth::NeueRegistrierung {
        username: &body.username,
        passwort: &body.password,
        telefon: body.telefon.as_deref(),
        email: body.email.as_deref(),
    };

    match state.auth.registrieren(registrierung).await {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AnmeldeAnfrage>,
) -> Response {
    if let Err(msg) = body.pruefen() {
        return fehlschlag(&msg);
    }

    let kontext = client_kontext(&headers);
    match state
        .auth
        .anmelden(&body.username, &body.password, &kontext)
        .await
    {
        Ok(token) => erfolg(json!({ "token": token })),
        Err(e) => aus_fehler(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateParameter {
    pub token: String,
}

/// GET /api/auth/validate?token=...
///
/// Reine kryptografische Pruefung ohne Register – bewusst schwaecher als
/// die Middleware geschuetzter Routen.
pub async fn validate(
    State(state): State<AppState>,
    Query(params): Query<ValidateParameter>,
) -> Response {
    erfolg(json!({ "valid": state.auth.token_pruefen(&params.token) }))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unautorisiert("Authorization-Header fehlt");
    };

    match state.auth.aktueller_benutzer(token).await {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// GET /api/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unautorisiert("Authorization-Header fehlt");
    };

    match state.auth.abmelden(token).await {
        Ok(()) => erfolg(json!({ "success": true })),
        Err(e) => aus_fehler(&e),
    }
}

/// POST /api/auth/refresh
///
/// Stellt ein frisches Token aus, ohne das Register anzufassen – das alte
/// Token bleibt die aktive Session, bis der Aufrufer sich neu anmeldet.
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unautorisiert("Authorization-Header fehlt");
    };

    match state.auth.token_erneuern(token) {
        Ok(neues) => erfolg(json!({ "token": neues })),
        Err(e) => aus_fehler(&e),
    }
}

/// PUT /api/auth/password
///
/// Eigenes Passwort aendern (verlangt das alte Passwort). Beendet die
/// aktive Session des Benutzers.
pub async fn passwort_aendern(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PasswortAendernAnfrage>,
) -> Response {
    if let Err(msg) = body.pruefen() {
        return fehlschlag(&msg);
    }

    let Some(token) = bearer_token(&headers) else {
        return unautorisiert("Authorization-Header fehlt");
    };

    let benutzer = match state.auth.aktueller_benutzer(token).await {
        Ok(b) => b,
        Err(e) => return aus_fehler(&e),
    };

    match state
        .auth
        .passwort_aendern(benutzer.id, &body.altes_passwort, &body.neues_passwort)
        .await
    {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}
