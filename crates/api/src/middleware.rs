//! Axum-Middleware: Authentifizierung und Rollenpruefung
//!
//! Die Auth-Middleware prueft Tokens register-konsistent: Signatur + Ablauf
//! UND der Registereintrag des Benutzers muss exakt diesem Tokenstring
//! entsprechen. Bei Erfolg wandern die Claims in die Request-Extensions und
//! die Register-TTL wird verlaengert (gleitendes Session-Fenster). Die
//! Rollenpruefung ist eine getrennte, pro Route komponierbare Stufe.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use pfoertner_auth::{guard, ClientKontext, TokenClaims};
use pfoertner_core::rollen;

use crate::antwort::{aus_fehler, unautorisiert, verboten};
use crate::AppState;

/// Verifizierte Claims in den Request-Extensions
#[derive(Debug, Clone)]
pub struct AuthClaims(pub TokenClaims);

/// Extrahiert den Bearer-Token aus dem Authorization-Header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// Extrahiert die Client-IP aus den Request-Headern
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Baut den Client-Kontext (IP, User-Agent) aus den Headern
pub fn client_kontext(headers: &HeaderMap) -> ClientKontext {
    ClientKontext {
        ip: client_ip(headers),
        user_agent: headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    }
}

/// Middleware fuer geschuetzte Routen: register-konsistente Token-Pruefung
///
/// Faellt geschlossen aus: fehlender oder fehlerhafter Header ergibt 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return unautorisiert("Authorization-Header fehlt oder fehlerhaft");
    };

    match state.auth.token_mit_register_pruefen(token).await {
        Ok(claims) => {
            request.extensions_mut().insert(AuthClaims(claims));
            next.run(request).await
        }
        Err(e) => aus_fehler(&e),
    }
}

/// Middleware fuer Admin-Routen: verlangt die Administrator-Rolle
///
/// Muss hinter der Auth-Middleware liegen (liest deren Claims).
pub async fn admin_middleware(request: Request, next: Next) -> Response {
    let Some(AuthClaims(claims)) = request.extensions().get::<AuthClaims>() else {
        return unautorisiert("Nicht authentifiziert");
    };

    if guard::rolle_erlaubt(&claims.rollen, rollen::ADMIN) {
        next.run(request).await
    } else {
        verboten("Administratorrechte erforderlich")
    }
}
