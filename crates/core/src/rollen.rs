//! Rollen-Namenskonvention
//!
//! Rollen werden als benannte Tokens gefuehrt (z.B. "ROLE_USER").
//! Das Praefix erlaubt es Aufrufern, Rollen wahlweise mit oder ohne
//! Praefix anzufordern ("ADMIN" und "ROLE_ADMIN" meinen dieselbe Rolle).

/// Praefix fuer Rollennamen
pub const PRAEFIX: &str = "ROLE_";

/// Standardrolle die jeder neue Benutzer bei der Registrierung erhaelt
pub const STANDARD: &str = "ROLE_USER";

/// Administrator-Rolle fuer Verwaltungsoperationen
pub const ADMIN: &str = "ROLE_ADMIN";

/// Trennzeichen fuer die Rollenliste am Benutzer-Datensatz
pub const TRENNZEICHEN: char = ',';
