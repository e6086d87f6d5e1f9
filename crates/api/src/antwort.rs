//! Einheitliche Antwort-Huelle der REST-API
//!
//! Alle Endpunkte antworten mit `{code, message, data?}`:
//! 200 Erfolg, 400 Validierung/Fachfehler, 401 Authentifizierung,
//! 403 Autorisierung, 500 intern. Der HTTP-Status spiegelt den Code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use pfoertner_auth::AuthError;
use pfoertner_db::DbError;

/// Antwort-Huelle fuer alle API-Endpunkte
#[derive(Debug, Serialize)]
pub struct Antwort {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

fn antwort(status: StatusCode, message: &str, data: Option<serde_json::Value>) -> Response {
    (
        status,
        Json(Antwort {
            code: status.as_u16(),
            message: message.to_string(),
            data,
        }),
    )
        .into_response()
}

/// 200 – Erfolg mit Nutzdaten
pub fn erfolg(data: impl Serialize) -> Response {
    match serde_json::to_value(data) {
        Ok(wert) => antwort(StatusCode::OK, "success", Some(wert)),
        Err(e) => intern(&format!("Serialisierung fehlgeschlagen: {e}")),
    }
}

/// 400 – Validierungs- oder Fachfehler
pub fn fehlschlag(message: &str) -> Response {
    antwort(StatusCode::BAD_REQUEST, message, None)
}

/// 401 – Authentifizierung fehlgeschlagen
pub fn unautorisiert(message: &str) -> Response {
    antwort(StatusCode::UNAUTHORIZED, message, None)
}

/// 403 – Autorisierung fehlgeschlagen
pub fn verboten(message: &str) -> Response {
    antwort(StatusCode::FORBIDDEN, message, None)
}

/// 500 – interner Fehler
pub fn intern(message: &str) -> Response {
    antwort(StatusCode::INTERNAL_SERVER_ERROR, message, None)
}

/// Zentrale Abbildung von Auth-Fehlern auf die Antwort-Huelle
pub fn aus_fehler(fehler: &AuthError) -> Response {
    match fehler {
        // Authentifizierung: 401
        AuthError::UngueltigeAnmeldedaten
        | AuthError::ZuVieleFehlversuche
        | AuthError::KontoGebannt
        | AuthError::KontoGesperrt
        | AuthError::TokenUngueltig
        | AuthError::TokenAbgelaufen
        | AuthError::TokenFehlerhaft(_)
        | AuthError::TokenWiderrufen => unautorisiert(&fehler.to_string()),

        // Autorisierung: 403
        AuthError::ZugriffVerweigert(_) => verboten(&fehler.to_string()),

        // Validierungs- und Fachfehler: 400
        AuthError::Validierung(_)
        | AuthError::BenutzernameVergeben(_)
        | AuthError::BenutzerNichtGefunden(_)
        | AuthError::RolleNichtGefunden(_)
        | AuthError::AltesPasswortFalsch => fehlschlag(&fehler.to_string()),

        // Konflikte sind fachlich und wiederholbar: 400
        AuthError::Datenbank(e @ (DbError::Eindeutigkeit(_) | DbError::VersionsKonflikt(_))) => {
            fehlschlag(&e.to_string())
        }

        // Alles andere: 500
        AuthError::Datenbank(_) | AuthError::PasswortHashing(_) | AuthError::Intern(_) => {
            tracing::error!("Interner Fehler: {fehler}");
            intern(&fehler.to_string())
        }
    }
}
