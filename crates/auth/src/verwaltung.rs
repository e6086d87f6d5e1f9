//! Benutzerverwaltung fuer Administratoren
//!
//! Suche, Aktualisierung, Rollenwechsel, Bann/Entbannung, weiches Loeschen
//! und erzwungener Passwort-Reset. Alle Mutationen stempeln Bearbeiter und
//! Zeitpunkt und laufen ueber das versionsgepruefte Speichern.

use std::sync::Arc;

use chrono::Utc;

use pfoertner_core::{BenutzerId, RollenId};
use pfoertner_db::{
    models::{BenutzerFilter, BenutzerRecord, KontoStatus, RolleRecord, Seite, SeitenAnfrage},
    repository::{RoleRepository, UserRepository},
};

use crate::error::{AuthError, AuthResult};

/// Aenderbare Stammdaten eines Benutzers
#[derive(Debug, Clone, Default)]
pub struct BenutzerAenderung {
    pub username: Option<String>,
    pub telefon: Option<String>,
    pub email: Option<String>,
}

/// Verwaltungs-Service fuer Benutzerkonten
pub struct BenutzerVerwaltung<U: UserRepository, R: RoleRepository> {
    benutzer_repo: Arc<U>,
    rollen_repo: Arc<R>,
}

impl<U: UserRepository, R: RoleRepository> BenutzerVerwaltung<U, R> {
    /// Erstellt einen neuen Verwaltungs-Service
    pub fn neu(benutzer_repo: Arc<U>, rollen_repo: Arc<R>) -> Self {
        Self {
            benutzer_repo,
            rollen_repo,
        }
    }

    /// Alle Benutzer seitenweise auflisten
    pub async fn alle_benutzer(&self, seite: SeitenAnfrage) -> AuthResult<Seite<BenutzerRecord>> {
        Ok(self.benutzer_repo.list(seite).await?)
    }

    /// Einen Benutzer anhand seiner ID laden
    pub async fn benutzer_nach_id(&self, id: BenutzerId) -> AuthResult<BenutzerRecord> {
        self.benutzer_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(id.to_string()))
    }

    /// Einen Benutzer anhand seines Namens laden
    pub async fn benutzer_nach_name(&self, username: &str) -> AuthResult<BenutzerRecord> {
        self.benutzer_repo
            .get_by_name(username)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(username.to_string()))
    }

    /// Benutzer nach Kriterien suchen
    pub async fn suchen(
        &self,
        filter: &BenutzerFilter,
        seite: SeitenAnfrage,
    ) -> AuthResult<Seite<BenutzerRecord>> {
        Ok(self.benutzer_repo.search(filter, seite).await?)
    }

    /// Den Rollenkatalog auflisten
    pub async fn rollen_katalog(&self) -> AuthResult<Vec<RolleRecord>> {
        Ok(self.rollen_repo.list_all().await?)
    }

    /// Stammdaten eines Benutzers aktualisieren
    ///
    /// Ein neuer Benutzername wird vorab auf Eindeutigkeit geprueft;
    /// die Autoritaet bleibt der UNIQUE-Constraint beim Speichern.
    pub async fn aktualisieren(
        &self,
        id: BenutzerId,
        aenderung: BenutzerAenderung,
        bearbeiter: &str,
    ) -> AuthResult<BenutzerRecord> {
        let mut benutzer = self.benutzer_nach_id(id).await?;

        if let Some(ref neuer_name) = aenderung.username {
            if neuer_name != &benutzer.username {
                if let Some(vorhanden) = self.benutzer_repo.get_by_name(neuer_name).await? {
                    if vorhanden.id != id {
                        return Err(AuthError::BenutzernameVergeben(neuer_name.clone()));
                    }
                }
                benutzer.username = neuer_name.clone();
            }
        }
        if let Some(telefon) = aenderung.telefon {
            benutzer.telefon = Some(telefon);
        }
        if let Some(email) = aenderung.email {
            benutzer.email = Some(email);
        }

        self.speichern(benutzer, bearbeiter).await
    }

    /// Die Rollen eines Benutzers anhand von Katalog-IDs neu setzen
    ///
    /// Alle IDs muessen existieren; fehlende werden gesammelt gemeldet.
    pub async fn rollen_aendern(
        &self,
        id: BenutzerId,
        rollen_ids: &[RollenId],
        bearbeiter: &str,
    ) -> AuthResult<BenutzerRecord> {
        if rollen_ids.is_empty() {
            return Err(AuthError::Validierung(
                "Mindestens eine Rolle angeben".into(),
            ));
        }

        let mut benutzer = self.benutzer_nach_id(id).await?;

        let rollen = self.rollen_repo.get_by_ids(rollen_ids).await?;
        if rollen.len() != rollen_ids.len() {
            let gefunden: Vec<RollenId> = rollen.iter().map(|r| r.id).collect();
            let fehlend: Vec<String> = rollen_ids
                .iter()
                .filter(|id| !gefunden.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(AuthError::RolleNichtGefunden(fehlend.join(", ")));
        }

        let namen: Vec<String> = rollen.iter().map(|r| r.name.clone()).collect();
        benutzer.rollen_setzen(&namen);

        let gespeichert = self.speichern(benutzer, bearbeiter).await?;
        tracing::info!(
            user_id = %gespeichert.id,
            rollen = %gespeichert.rollen,
            bearbeiter = %bearbeiter,
            "Rollen geaendert"
        );
        Ok(gespeichert)
    }

    /// Bannt einen Benutzer (direkter Statuswechsel, unabhaengig vom
    /// Fehlversuchszaehler)
    pub async fn bannen(&self, id: BenutzerId, bearbeiter: &str) -> AuthResult<BenutzerRecord> {
        let mut benutzer = self.benutzer_nach_id(id).await?;
        benutzer.status = KontoStatus::Gebannt;

        let gespeichert = self.speichern(benutzer, bearbeiter).await?;
        tracing::info!(user_id = %gespeichert.id, bearbeiter = %bearbeiter, "Benutzer gebannt");
        Ok(gespeichert)
    }

    /// Hebt einen Bann auf und setzt das Konto auf Aktiv zurueck
    pub async fn entbannen(&self, id: BenutzerId, bearbeiter: &str) -> AuthResult<BenutzerRecord> {
        let mut benutzer = self.benutzer_nach_id(id).await?;
        benutzer.status = KontoStatus::Aktiv;
        benutzer.locked_at = None;
        benutzer.login_fail_count = 0;

        let gespeichert = self.speichern(benutzer, bearbeiter).await?;
        tracing::info!(user_id = %gespeichert.id, bearbeiter = %bearbeiter, "Benutzer entbannt");
        Ok(gespeichert)
    }

    /// Loescht einen Benutzer weich
    ///
    /// Der Datensatz bleibt erhalten, verschwindet aber aus allen
    /// Einzel-Lookups.
    pub async fn loeschen(&self, id: BenutzerId, bearbeiter: &str) -> AuthResult<BenutzerRecord> {
        let mut benutzer = self.benutzer_nach_id(id).await?;
        benutzer.deleted = true;

        let gespeichert = self.speichern(benutzer, bearbeiter).await?;
        tracing::info!(user_id = %gespeichert.id, bearbeiter = %bearbeiter, "Benutzer geloescht (weich)");
        Ok(gespeichert)
    }

    /// Stempelt Bearbeiter/Zeitpunkt und speichert versionsgeprueft
    async fn speichern(
        &self,
        mut benutzer: BenutzerRecord,
        bearbeiter: &str,
    ) -> AuthResult<BenutzerRecord> {
        benutzer.updated_at = Some(Utc::now());
        benutzer.updated_by = Some(bearbeiter.to_string());
        Ok(self.benutzer_repo.save(&benutzer).await?)
    }
}
