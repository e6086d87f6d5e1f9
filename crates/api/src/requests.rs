//! Request-Strukturen der REST-API mit manueller Validierung
//!
//! Validierungsfehler werden dem Aufrufer woertlich gemeldet (400);
//! die Wire-Feldnamen entsprechen der JSON-Konvention der API.

use serde::Deserialize;

use pfoertner_db::models::{BenutzerFilter, SeitenAnfrage};

/// Registrierung eines neuen Benutzers
#[derive(Debug, Deserialize)]
pub struct RegistrierungsAnfrage {
    pub username: String,
    pub password: String,
    #[serde(default, rename = "phoneNumber")]
    pub telefon: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl RegistrierungsAnfrage {
    pub fn pruefen(&self) -> Result<(), String> {
        benutzername_pruefen(&self.username)?;
        passwort_pruefen(&self.password)?;
        if let Some(ref telefon) = self.telefon {
            telefon_pruefen(telefon)?;
        }
        if let Some(ref email) = self.email {
            email_pruefen(email)?;
        }
        Ok(())
    }
}

/// Login mit Benutzername und Passwort
#[derive(Debug, Deserialize)]
pub struct AnmeldeAnfrage {
    pub username: String,
    pub password: String,
}

impl AnmeldeAnfrage {
    pub fn pruefen(&self) -> Result<(), String> {
        benutzername_pruefen(&self.username)?;
        passwort_pruefen(&self.password)
    }
}

/// Passwortwechsel mit Pruefung des alten Passworts
#[derive(Debug, Deserialize)]
pub struct PasswortAendernAnfrage {
    #[serde(rename = "oldPassword")]
    pub altes_passwort: String,
    #[serde(rename = "newPassword")]
    pub neues_passwort: String,
}

impl PasswortAendernAnfrage {
    pub fn pruefen(&self) -> Result<(), String> {
        passwort_pruefen(&self.altes_passwort)?;
        passwort_pruefen(&self.neues_passwort)
    }
}

/// Erzwungener Passwort-Reset durch einen Admin
#[derive(Debug, Deserialize)]
pub struct PasswortErzwingenAnfrage {
    #[serde(rename = "newPassword")]
    pub neues_passwort: String,
}

impl PasswortErzwingenAnfrage {
    pub fn pruefen(&self) -> Result<(), String> {
        passwort_pruefen(&self.neues_passwort)
    }
}

/// Rollenwechsel ueber Katalog-IDs
#[derive(Debug, Deserialize)]
pub struct RollenAendernAnfrage {
    #[serde(rename = "roleIds")]
    pub rollen_ids: Vec<i64>,
}

/// Aktualisierung der Stammdaten eines Benutzers
#[derive(Debug, Deserialize)]
pub struct BenutzerAktualisierenAnfrage {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, rename = "phone")]
    pub telefon: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl BenutzerAktualisierenAnfrage {
    pub fn pruefen(&self) -> Result<(), String> {
        if let Some(ref username) = self.username {
            benutzername_pruefen(username)?;
        }
        if let Some(ref telefon) = self.telefon {
            telefon_pruefen(telefon)?;
        }
        if let Some(ref email) = self.email {
            email_pruefen(email)?;
        }
        Ok(())
    }
}

/// Seitenparameter (Wire-Namen pageNum/pageSize)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SeitenParameter {
    #[serde(default = "standard_seite", rename = "pageNum")]
    pub seite: i64,
    #[serde(default = "standard_groesse", rename = "pageSize")]
    pub groesse: i64,
}

fn standard_seite() -> i64 {
    1
}

fn standard_groesse() -> i64 {
    10
}

impl Default for SeitenParameter {
    fn default() -> Self {
        Self {
            seite: standard_seite(),
            groesse: standard_groesse(),
        }
    }
}

impl SeitenParameter {
    pub fn pruefen(&self) -> Result<(), String> {
        if self.seite < 1 {
            return Err("Seitennummer muss mindestens 1 sein".into());
        }
        if self.groesse < 1 || self.groesse > 100 {
            return Err("Seitengroesse muss zwischen 1 und 100 liegen".into());
        }
        Ok(())
    }

    pub fn als_anfrage(&self) -> SeitenAnfrage {
        SeitenAnfrage {
            seite: self.seite,
            groesse: self.groesse,
        }
    }
}

/// Benutzersuche: Filterfelder plus Seitenparameter in einem Body
#[derive(Debug, Deserialize)]
pub struct SuchAnfrage {
    #[serde(flatten)]
    pub filter: BenutzerFilter,
    #[serde(flatten)]
    pub seite: SeitenParameter,
}

// ---------------------------------------------------------------------------
// Feldpruefungen
// ---------------------------------------------------------------------------

fn benutzername_pruefen(username: &str) -> Result<(), String> {
    let laenge = username.chars().count();
    if !(2..=20).contains(&laenge) {
        return Err("Benutzername muss 2 bis 20 Zeichen haben".into());
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_')
    {
        return Err("Benutzername darf nur Buchstaben, Ziffern und Unterstrich enthalten".into());
    }
    Ok(())
}

fn passwort_pruefen(passwort: &str) -> Result<(), String> {
    if passwort.len() < 6 {
        return Err("Passwort muss mindestens 6 Zeichen haben".into());
    }
    Ok(())
}

fn telefon_pruefen(telefon: &str) -> Result<(), String> {
    let laenge = telefon.chars().count();
    if !(5..=20).contains(&laenge)
        || !telefon.chars().all(|c| c.is_ascii_digit() || c == '+')
    {
        return Err("Telefonnummer hat ein ungueltiges Format".into());
    }
    Ok(())
}

fn email_pruefen(email: &str) -> Result<(), String> {
    if email.len() > 100 || !email.contains('@') {
        return Err("E-Mail-Adresse hat ein ungueltiges Format".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gueltige_registrierung() {
        let anfrage = RegistrierungsAnfrage {
            username: "alice_99".into(),
            password: "geheim123".into(),
            telefon: Some("+4912345678".into()),
            email: Some("alice@example.org".into()),
        };
        assert!(anfrage.pruefen().is_ok());
    }

    #[test]
    fn zu_kurzer_benutzername() {
        let anfrage = RegistrierungsAnfrage {
            username: "a".into(),
            password: "geheim123".into(),
            telefon: None,
            email: None,
        };
        assert!(anfrage.pruefen().is_err());
    }

    #[test]
    fn sonderzeichen_im_benutzernamen() {
        let anfrage = AnmeldeAnfrage {
            username: "böse name!".into(),
            password: "geheim123".into(),
        };
        assert!(anfrage.pruefen().is_err());
    }

    #[test]
    fn zu_kurzes_passwort() {
        let anfrage = AnmeldeAnfrage {
            username: "alice".into(),
            password: "kurz".into(),
        };
        assert!(anfrage.pruefen().is_err());
    }

    #[test]
    fn ungueltige_email() {
        let anfrage = RegistrierungsAnfrage {
            username: "alice".into(),
            password: "geheim123".into(),
            telefon: None,
            email: Some("keine-adresse".into()),
        };
        assert!(anfrage.pruefen().is_err());
    }

    #[test]
    fn wire_namen_werden_gelesen() {
        let json = r#"{
            "username": "bob",
            "password": "geheim123",
            "phoneNumber": "+4987654",
            "email": "bob@example.org"
        }"#;
        let anfrage: RegistrierungsAnfrage = serde_json::from_str(json).unwrap();
        assert_eq!(anfrage.telefon.as_deref(), Some("+4987654"));

        let json = r#"{"oldPassword": "alt_geheim", "newPassword": "neu_geheim"}"#;
        let anfrage: PasswortAendernAnfrage = serde_json::from_str(json).unwrap();
        assert_eq!(anfrage.altes_passwort, "alt_geheim");
    }

    #[test]
    fn seitenparameter_defaults() {
        let json = r#"{}"#;
        let seite: SeitenParameter = serde_json::from_str(json).unwrap();
        assert_eq!(seite.seite, 1);
        assert_eq!(seite.groesse, 10);
        assert!(seite.pruefen().is_ok());

        let ungueltig = SeitenParameter {
            seite: 0,
            groesse: 10,
        };
        assert!(ungueltig.pruefen().is_err());
    }

    #[test]
    fn suchanfrage_mit_filter_und_seite() {
        let json = r#"{"username": "ali", "pageNum": 2, "pageSize": 5}"#;
        let anfrage: SuchAnfrage = serde_json::from_str(json).unwrap();
        assert_eq!(anfrage.filter.username.as_deref(), Some("ali"));
        assert_eq!(anfrage.seite.seite, 2);
        assert_eq!(anfrage.seite.als_anfrage().offset(), 5);
    }
}
