//! REST-Handler fuer die Benutzerverwaltung (Admin-Endpunkte)

use axum::{
    extract::{Path, State},
    response::Response,
    Extension, Json,
};

use pfoertner_auth::BenutzerAenderung;
use pfoertner_core::{BenutzerId, RollenId};

use crate::antwort::{aus_fehler, erfolg, fehlschlag};
use crate::middleware::AuthClaims;
use crate::requests::{
    BenutzerAktualisierenAnfrage, PasswortAendernAnfrage, PasswortErzwingenAnfrage,
    RollenAendernAnfrage, SeitenParameter, SuchAnfrage,
};
use crate::AppState;

/// POST /api/user/all
pub async fn alle(
    State(state): State<AppState>,
    Json(seite): Json<SeitenParameter>,
) -> Response {
    if let Err(msg) = seite.pruefen() {
        return fehlschlag(&msg);
    }

    match state.verwaltung.alle_benutzer(seite.als_anfrage()).await {
        Ok(seite) => erfolg(seite),
        Err(e) => aus_fehler(&e),
    }
}

/// GET /api/user/:id
pub async fn nach_id(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.verwaltung.benutzer_nach_id(BenutzerId(id)).await {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// GET /api/user/username/:username
pub async fn nach_name(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Response {
    match state.verwaltung.benutzer_nach_name(&username).await {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// POST /api/user/search
pub async fn suchen(State(state): State<AppState>, Json(body): Json<SuchAnfrage>) -> Response {
    if let Err(msg) = body.seite.pruefen() {
        return fehlschlag(&msg);
    }

    match state
        .verwaltung
        .suchen(&body.filter, body.seite.als_anfrage())
        .await
    {
        Ok(seite) => erfolg(seite),
        Err(e) => aus_fehler(&e),
    }
}

/// GET /api/user/role/all
pub async fn rollen_katalog(State(state): State<AppState>) -> Response {
    match state.verwaltung.rollen_katalog().await {
        Ok(rollen) => erfolg(rollen),
        Err(e) => aus_fehler(&e),
    }
}

/// PUT /api/user/:id
pub async fn aktualisieren(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthClaims(claims)): Extension<AuthClaims>,
    Json(body): Json<BenutzerAktualisierenAnfrage>,
) -> Response {
    if let Err(msg) = body.pruefen() {
        return fehlschlag(&msg);
    }

    let aenderung = BenutzerAenderung {
        username: body.username,
        telefon: body.telefon,
        email: body.email,
    };

    match state
        .verwaltung
        .aktualisieren(BenutzerId(id), aenderung, &claims.username)
        .await
    {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// PUT /api/user/:id/role
pub async fn rollen_aendern(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthClaims(claims)): Extension<AuthClaims>,
    Json(body): Json<RollenAendernAnfrage>,
) -> Response {
    let rollen_ids: Vec<RollenId> = body.rollen_ids.iter().map(|id| RollenId(*id)).collect();

    match state
        .verwaltung
        .rollen_aendern(BenutzerId(id), &rollen_ids, &claims.username)
        .await
    {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// PUT /api/user/:id/password
pub async fn passwort_aendern(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PasswortAendernAnfrage>,
) -> Response {
    if let Err(msg) = body.pruefen() {
        return fehlschlag(&msg);
    }

    match state
        .auth
        .passwort_aendern(BenutzerId(id), &body.altes_passwort, &body.neues_passwort)
        .await
    {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// PUT /api/user/:id/password/force
pub async fn passwort_erzwingen(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthClaims(claims)): Extension<AuthClaims>,
    Json(body): Json<PasswortErzwingenAnfrage>,
) -> Response {
    if let Err(msg) = body.pruefen() {
        return fehlschlag(&msg);
    }

    match state
        .auth
        .passwort_zuruecksetzen(BenutzerId(id), &body.neues_passwort, &claims.username)
        .await
    {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// PUT /api/user/:id/block
pub async fn bannen(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthClaims(claims)): Extension<AuthClaims>,
) -> Response {
    match state
        .verwaltung
        .bannen(BenutzerId(id), &claims.username)
        .await
    {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// PUT /api/user/:id/unblock
pub async fn entbannen(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthClaims(claims)): Extension<AuthClaims>,
) -> Response {
    match state
        .verwaltung
        .entbannen(BenutzerId(id), &claims.username)
        .await
    {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}

/// DELETE /api/user/:id
pub async fn loeschen(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(AuthClaims(claims)): Extension<AuthClaims>,
) -> Response {
    match state
        .verwaltung
        .loeschen(BenutzerId(id), &claims.username)
        .await
    {
        Ok(benutzer) => erfolg(benutzer),
        Err(e) => aus_fehler(&e),
    }
}
