//! Rollenpruefung fuer geschuetzte Operationen
//!
//! Rollen werden als ganze Tokens verglichen – niemals als Teilstring.
//! "ADMIN" trifft damit "ROLE_ADMIN", aber nie "ROLE_SUPERADMIN".

use pfoertner_core::rollen;

/// Prueft ob die Rollenmenge die geforderte Rolle enthaelt
///
/// Die geforderte Rolle darf mit oder ohne Praefix angegeben werden:
/// sowohl `"ADMIN"` als auch `"ROLE_ADMIN"` treffen den Eintrag
/// `"ROLE_ADMIN"`.
pub fn rolle_erlaubt(rollen_menge: &[String], gefordert: &str) -> bool {
    let mit_praefix = format!("{}{}", rollen::PRAEFIX, gefordert);
    rollen_menge
        .iter()
        .any(|r| r == gefordert || r == &mit_praefix)
}

/// Prueft ob die Rollenmenge Administratorrechte enthaelt
pub fn ist_admin(rollen_menge: &[String]) -> bool {
    rolle_erlaubt(rollen_menge, rollen::ADMIN)
}
