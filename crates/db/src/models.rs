//! Datenbankmodelle fuer Pfoertner
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den Domain-Typen getrennt und dienen als reine
//! Datenuebertragungsobjekte.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pfoertner_core::{rollen, BenutzerId, RollenId};

// ---------------------------------------------------------------------------
// Kontostatus
// ---------------------------------------------------------------------------

/// Lebenszyklus-Status eines Benutzerkontos
///
/// `Gebannt` ist terminal bis zur expliziten Entbannung durch einen Admin.
/// `Gesperrt` (zu viele Fehlversuche) heilt nach Ablauf der Sperrfrist von selbst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KontoStatus {
    Aktiv,
    Gebannt,
    Gesperrt,
}

impl KontoStatus {
    /// Integer-Repraesentation fuer die Datenbank (0/1/2)
    pub fn als_i64(&self) -> i64 {
        match self {
            Self::Aktiv => 0,
            Self::Gebannt => 1,
            Self::Gesperrt => 2,
        }
    }

    pub fn from_i64(v: i64) -> Result<Self, String> {
        match v {
            0 => Ok(Self::Aktiv),
            1 => Ok(Self::Gebannt),
            2 => Ok(Self::Gesperrt),
            other => Err(format!("Unbekannter Kontostatus: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
///
/// Der Passwort-Hash und das Loesch-Flag werden niemals nach aussen
/// serialisiert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: BenutzerId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub telefon: Option<String>,
    pub email: Option<String>,
    pub status: KontoStatus,
    /// Rollennamen, mit Komma getrennt (nach Registrierung nie leer)
    pub rollen: String,
    pub login_fail_count: i64,
    pub last_login: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub password_reset_at: Option<DateTime<Utc>>,
    /// Gesetzt genau dann wenn status == Gesperrt
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub deleted: bool,
    /// Optimistic-Lock-Version, bei jedem Speichern inkrementiert
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl BenutzerRecord {
    /// Zerlegt die Rollenliste in einzelne Rollennamen
    pub fn rollen_liste(&self) -> Vec<String> {
        self.rollen
            .split(rollen::TRENNZEICHEN)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Setzt die Rollenliste aus einzelnen Rollennamen
    pub fn rollen_setzen(&mut self, namen: &[String]) {
        self.rollen = namen.join(&rollen::TRENNZEICHEN.to_string());
    }
}

/// Daten zum Erstellen eines neuen Benutzers
///
/// Zeitstempel und Defaults stampt das Repository beim Anlegen –
/// keine impliziten Lifecycle-Hooks am Entity-Typ.
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub telefon: Option<&'a str>,
    pub email: Option<&'a str>,
    pub rollen: &'a str,
    pub erstellt_von: &'a str,
}

// ---------------------------------------------------------------------------
// Rollen (Referenzdaten)
// ---------------------------------------------------------------------------

/// Rollen-Datensatz aus dem Rollenkatalog
///
/// Aus Sicht des Auth-Kerns nur lesbar; Rollenaenderungen am Benutzer
/// geschehen ueber Namen, aufgeloest aus IDs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolleRecord {
    pub id: RollenId,
    pub name: String,
    pub ist_standard: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Paginierung & Suche
// ---------------------------------------------------------------------------

/// Seitenweise Abfrage (1-basierte Seitennummer)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeitenAnfrage {
    pub seite: i64,
    pub groesse: i64,
}

impl Default for SeitenAnfrage {
    fn default() -> Self {
        Self {
            seite: 1,
            groesse: 10,
        }
    }
}

impl SeitenAnfrage {
    /// Offset fuer die SQL-Abfrage
    pub fn offset(&self) -> i64 {
        (self.seite.max(1) - 1) * self.groesse
    }
}

/// Eine Ergebnisseite inklusive Gesamtanzahl
#[derive(Debug, Clone, Serialize)]
pub struct Seite<T> {
    pub eintraege: Vec<T>,
    pub gesamt: i64,
}

/// Filter fuer die Benutzersuche (alle Felder optional, UND-verknuepft)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BenutzerFilter {
    pub username: Option<String>,
    pub telefon: Option<String>,
    pub email: Option<String>,
    pub rollen: Option<String>,
    pub status: Option<KontoStatus>,
    pub login_fail_count: Option<i64>,
    pub deleted: Option<bool>,
    pub erstellt_ab: Option<DateTime<Utc>>,
    pub erstellt_bis: Option<DateTime<Utc>>,
    pub aktualisiert_ab: Option<DateTime<Utc>>,
    pub aktualisiert_bis: Option<DateTime<Utc>>,
}
