//! pfoertner-core – Gemeinsame Typen und Konventionen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Pfoertner-Crates gemeinsam genutzt werden: ID-Newtypes und die
//! Rollen-Namenskonvention.

pub mod rollen;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{BenutzerId, RollenId};
