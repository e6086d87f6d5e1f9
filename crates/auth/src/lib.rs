//! pfoertner-auth – Auth-Kern
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id
//! - Signierte Session-Tokens (HS256, injiziertes Geheimnis)
//! - Session-Register (ein aktives Token pro Benutzer, TTL)
//! - Kontozustands-Maschine (Fehlversuche, Sperre, Bann)
//! - AuthService (Registrierung, Login, Logout, Token-Pruefung, Passwortwechsel)
//! - BenutzerVerwaltung (Suche, Rollen, Bann, weiches Loeschen)
//! - Rollenpruefung fuer geschuetzte Operationen

pub mod error;
pub mod guard;
pub mod konto;
pub mod password;
pub mod registry;
pub mod service;
pub mod token;
pub mod verwaltung;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use guard::{ist_admin, rolle_erlaubt};
pub use password::{passwort_hashen, passwort_verifizieren};
pub use registry::{MemoryTokenRegister, TokenRegister};
pub use service::{AuthService, ClientKontext, NeueRegistrierung};
pub use token::{TokenClaims, TokenDienst};
pub use verwaltung::{BenutzerAenderung, BenutzerVerwaltung};
