//! Fehlertypen fuer den Auth-Kern

use thiserror::Error;

/// Alle moeglichen Fehler im Auth-Kern
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Authentifizierung ---
    // Absichtlich dieselbe Meldung fuer "Benutzer unbekannt" und
    // "Passwort falsch" (keine Benutzernamen-Enumeration).
    #[error("Benutzername oder Passwort falsch")]
    UngueltigeAnmeldedaten,

    #[error("Zu viele Fehlversuche, Konto gesperrt")]
    ZuVieleFehlversuche,

    #[error("Konto gebannt")]
    KontoGebannt,

    #[error("Konto gesperrt, bitte spaeter erneut versuchen")]
    KontoGesperrt,

    #[error("Altes Passwort falsch")]
    AltesPasswortFalsch,

    // --- Token ---
    #[error("Token ungueltig")]
    TokenUngueltig,

    #[error("Token abgelaufen")]
    TokenAbgelaufen,

    #[error("Token fehlerhaft: {0}")]
    TokenFehlerhaft(String),

    #[error("Token widerrufen")]
    TokenWiderrufen,

    // --- Berechtigungen ---
    #[error("Zugriff verweigert: Rolle '{0}' fehlt")]
    ZugriffVerweigert(String),

    // --- Benutzerverwaltung ---
    #[error("Benutzername bereits vergeben: {0}")]
    BenutzernameVergeben(String),

    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    #[error("Rolle nicht gefunden: {0}")]
    RolleNichtGefunden(String),

    #[error("Ungueltige Eingabe: {0}")]
    Validierung(String),

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] pfoertner_db::DbError),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl AuthError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Alias fuer den Auth-Kern
pub type AuthResult<T> = Result<T, AuthError>;
