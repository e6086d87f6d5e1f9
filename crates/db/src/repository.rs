//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Die SQLite-Implementierung liegt in
//! `crate::sqlite`.

use pfoertner_core::{BenutzerId, RollenId};

use crate::error::DbResult;
use crate::models::{
    BenutzerFilter, BenutzerRecord, NeuerBenutzer, RolleRecord, Seite, SeitenAnfrage,
};

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://pfoertner.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pfoertner.db".into(),
            max_verbindungen: 5,
        }
    }
}

/// Repository fuer Benutzer-Datenzugriffe
///
/// Weich geloeschte Benutzer werden von `get_by_id`/`get_by_name` wie
/// nicht vorhanden behandelt; nur `list` und `search` koennen sie sehen.
#[allow(async_fn_in_trait)]
pub trait UserRepository: Send + Sync {
    /// Einen neuen Benutzer anlegen
    ///
    /// Der UNIQUE-Constraint auf `username` ist die Autoritaet gegen
    /// doppelte Namen; eine Verletzung wird als `DbError::Eindeutigkeit`
    /// gemeldet.
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Einen Benutzer anhand seiner ID laden (ohne weich geloeschte)
    async fn get_by_id(&self, id: BenutzerId) -> DbResult<Option<BenutzerRecord>>;

    /// Einen Benutzer anhand seines Namens laden (ohne weich geloeschte)
    async fn get_by_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Den kompletten Datensatz mit Versionspruefung speichern
    ///
    /// Schreibt alle veraenderbaren Felder in einem einzigen bedingten
    /// UPDATE (`WHERE id = ? AND version = ?`) und erhoeht die Version.
    /// Hat ein konkurrierender Schreiber die Version bereits erhoeht,
    /// schlaegt der Aufruf mit `DbError::VersionsKonflikt` fehl statt den
    /// fremden Stand zu ueberschreiben.
    async fn save(&self, record: &BenutzerRecord) -> DbResult<BenutzerRecord>;

    /// Alle Benutzer seitenweise auflisten (inklusive weich geloeschter)
    async fn list(&self, seite: SeitenAnfrage) -> DbResult<Seite<BenutzerRecord>>;

    /// Benutzer nach Filterkriterien seitenweise suchen
    async fn search(
        &self,
        filter: &BenutzerFilter,
        seite: SeitenAnfrage,
    ) -> DbResult<Seite<BenutzerRecord>>;
}

/// Repository fuer den Rollenkatalog (Referenzdaten, nur lesend)
#[allow(async_fn_in_trait)]
pub trait RoleRepository: Send + Sync {
    /// Alle Rollen laden
    async fn list_all(&self) -> DbResult<Vec<RolleRecord>>;

    /// Rollen anhand ihrer IDs laden
    async fn get_by_ids(&self, ids: &[RollenId]) -> DbResult<Vec<RolleRecord>>;

    /// Die Standardrolle laden (fuer neue Registrierungen)
    async fn get_default(&self) -> DbResult<Option<RolleRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_config_standard() {
        let cfg = DatabaseConfig::default();
        assert_eq!(cfg.url, "sqlite://pfoertner.db");
        assert_eq!(cfg.max_verbindungen, 5);
    }
}
