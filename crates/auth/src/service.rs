//! Auth-Service fuer Pfoertner
//!
//! Zentraler Orchestrator fuer Registrierung, Login, Logout, Token-Pruefung
//! und Passwortwechsel. Komponiert Passwort-Codec, Token-Dienst,
//! Session-Register und Kontozustands-Maschine; andere Schichten rufen nur
//! diesen Service.

use std::sync::Arc;

use chrono::Utc;

use pfoertner_core::{rollen, BenutzerId};
use pfoertner_db::{models::BenutzerRecord, repository::UserRepository};

use crate::{
    error::{AuthError, AuthResult},
    konto::{self, Fehlversuch, Zulassung},
    password::{passwort_hashen, passwort_verifizieren},
    registry::TokenRegister,
    token::{TokenClaims, TokenDienst},
};

/// Obergrenze fuer Wiederholungen bei Versionskonflikten auf dem
/// Fehlversuchszaehler (Read-Modify-Write-Rennen zweier Logins)
const MAX_SPEICHER_VERSUCHE: usize = 3;

/// Client-Metadaten eines Login-Requests (IP, User-Agent)
#[derive(Debug, Clone, Default)]
pub struct ClientKontext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Eingabedaten fuer eine Registrierung
#[derive(Debug, Clone)]
pub struct NeueRegistrierung<'a> {
    pub username: &'a str,
    pub passwort: &'a str,
    pub telefon: Option<&'a str>,
    pub email: Option<&'a str>,
}

/// Auth-Service – zentraler Einstiegspunkt fuer alle Authentifizierungsvorgaenge
pub struct AuthService<U: UserRepository, R: TokenRegister> {
    benutzer_repo: Arc<U>,
    register: Arc<R>,
    token_dienst: Arc<TokenDienst>,
}

impl<U: UserRepository, R: TokenRegister> AuthService<U, R> {
    /// Erstellt einen neuen AuthService
    pub fn neu(benutzer_repo: Arc<U>, register: Arc<R>, token_dienst: Arc<TokenDienst>) -> Self {
        Self {
            benutzer_repo,
            register,
            token_dienst,
        }
    }

    /// Registriert einen neuen Benutzer
    ///
    /// Der Vorab-Check auf den Namen ist nur eine Abkuerzung; die Autoritaet
    /// gegen doppelte Namen ist der UNIQUE-Constraint beim Einfuegen.
    pub async fn registrieren(&self, daten: NeueRegistrierung<'_>) -> AuthResult<BenutzerRecord> {
        if daten.username.trim().len() < 2 {
            return Err(AuthError::Validierung(
                "Benutzername muss mindestens 2 Zeichen haben".into(),
            ));
        }
        if daten.passwort.len() < 6 {
            return Err(AuthError::Validierung(
                "Passwort muss mindestens 6 Zeichen haben".into(),
            ));
        }

        if self.benutzer_repo.get_by_name(daten.username).await?.is_some() {
            return Err(AuthError::BenutzernameVergeben(daten.username.to_string()));
        }

        let passwort_hash = passwort_hashen(daten.passwort)?;

        let benutzer = self
            .benutzer_repo
            .create(pfoertner_db::models::NeuerBenutzer {
                username: daten.username,
                password_hash: &passwort_hash,
                telefon: daten.telefon,
                email: daten.email,
                rollen: rollen::STANDARD,
                erstellt_von: daten.username,
            })
            .await
            .map_err(|e| {
                if e.ist_eindeutigkeit() {
                    AuthError::BenutzernameVergeben(daten.username.to_string())
                } else {
                    AuthError::Datenbank(e)
                }
            })?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            "Neuer Benutzer registriert"
        );

        Ok(benutzer)
    }

    /// Meldet einen Benutzer an und gibt das Session-Token zurueck
    ///
    /// Ein noch gueltiges Token aus dem Register wird wiederverwendet
    /// (TTL verlaengert) statt neu ausgestellt – wiederholte Logins
    /// desselben Benutzers liefern denselben Tokenstring, bis das Token
    /// explizit ungueltig wird.
    pub async fn anmelden(
        &self,
        username: &str,
        passwort: &str,
        kontext: &ClientKontext,
    ) -> AuthResult<String> {
        let jetzt = Utc::now();

        // Unbekannte und weich geloeschte Benutzer bekommen dieselbe
        // Meldung wie ein falsches Passwort
        let mut benutzer = self
            .benutzer_repo
            .get_by_name(username)
            .await?
            .ok_or(AuthError::UngueltigeAnmeldedaten)?;

        if !passwort_verifizieren(passwort, &benutzer.password_hash) {
            tracing::warn!(username = %username, "Fehlgeschlagener Login-Versuch");
            return Err(self.fehlversuch_speichern(benutzer).await?);
        }

        // Zulassung pruefen und Erfolg verbuchen (Zaehler zuruecksetzen,
        // Login stempeln, evtl. Entsperrung persistieren). Kollidiert das
        // Speichern mit einem gleichzeitigen Login, wird der Datensatz neu
        // geladen und die Pruefung wiederholt.
        let mut versuch = 0;
        let benutzer = loop {
            match konto::zulassung_pruefen(&mut benutzer, jetzt) {
                Zulassung::Gebannt => return Err(AuthError::KontoGebannt),
                Zulassung::NochGesperrt => return Err(AuthError::KontoGesperrt),
                Zulassung::Erlaubt { entsperrt } => {
                    if entsperrt {
                        tracing::info!(username = %username, "Sperrfrist abgelaufen, Konto entsperrt");
                    }
                }
            }

            konto::anmeldung_verbuchen(&mut benutzer, jetzt, kontext.ip.as_deref());
            benutzer.updated_at = Some(jetzt);
            benutzer.updated_by = Some(benutzer.username.clone());

            match self.benutzer_repo.save(&benutzer).await {
                Ok(gespeichert) => break gespeichert,
                Err(e) if e.ist_versions_konflikt() && versuch < MAX_SPEICHER_VERSUCHE => {
                    versuch += 1;
                    benutzer = self
                        .benutzer_repo
                        .get_by_name(username)
                        .await?
                        .ok_or(AuthError::UngueltigeAnmeldedaten)?;
                }
                Err(e) => return Err(e.into()),
            }
        };

        // Register zuerst: vorhandenes, noch gueltiges Token wiederverwenden
        if let Some(vorhanden) = self.register.holen(&benutzer.username).await? {
            if self.token_dienst.ist_gueltig(&vorhanden) {
                self.register
                    .verlaengern(&benutzer.username, self.token_dienst.gueltigkeit())
                    .await?;
                tracing::debug!(user_id = %benutzer.id, "Bestehendes Token wiederverwendet");
                return Ok(vorhanden);
            }
        }

        let token = self.token_dienst.ausstellen(
            benutzer.id,
            &benutzer.username,
            &benutzer.rollen_liste(),
        )?;
        self.register
            .setzen(&benutzer.username, &token, self.token_dienst.gueltigkeit())
            .await?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            user_agent = ?kontext.user_agent,
            "Benutzer angemeldet"
        );

        Ok(token)
    }

    /// Verbucht einen Fehlversuch mit Versionspruefung und Wiederholung
    ///
    /// Zwei gleichzeitige Logins duerfen sich beim Zaehler nicht gegenseitig
    /// ueberschreiben: bei einem Versionskonflikt wird der Datensatz neu
    /// geladen und der Versuch erneut gezaehlt. Gibt den Fehler zurueck, den
    /// der Aufrufer an den Client weiterreicht.
    async fn fehlversuch_speichern(&self, mut benutzer: BenutzerRecord) -> AuthResult<AuthError> {
        for _ in 0..MAX_SPEICHER_VERSUCHE {
            let jetzt = Utc::now();
            let mut kandidat = benutzer.clone();
            let ergebnis = konto::fehlversuch_verbuchen(&mut kandidat, jetzt);
            kandidat.updated_at = Some(jetzt);

            match self.benutzer_repo.save(&kandidat).await {
                Ok(_) => {
                    return Ok(match ergebnis {
                        Fehlversuch::Gesperrt => {
                            tracing::warn!(
                                username = %kandidat.username,
                                "Konto nach zu vielen Fehlversuchen gesperrt"
                            );
                            AuthError::ZuVieleFehlversuche
                        }
                        Fehlversuch::Verbleibend(_) => AuthError::UngueltigeAnmeldedaten,
                    });
                }
                Err(e) if e.ist_versions_konflikt() => {
                    benutzer = self
                        .benutzer_repo
                        .get_by_name(&benutzer.username)
                        .await?
                        .ok_or(AuthError::UngueltigeAnmeldedaten)?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Aufgegeben – ein konkurrierender Schreiber hat den Versuch bereits
        // gezaehlt, die Antwort an den Client bleibt dieselbe
        tracing::warn!(username = %benutzer.username, "Fehlversuchszaehler nicht gespeichert");
        Ok(AuthError::UngueltigeAnmeldedaten)
    }

    /// Meldet einen Benutzer ab (entfernt den Registereintrag)
    ///
    /// Idempotent: ein bereits fehlender Eintrag ist ebenfalls Erfolg.
    pub async fn abmelden(&self, token: &str) -> AuthResult<()> {
        let claims = self.token_dienst.pruefen(token)?;
        self.register.entfernen(&claims.username).await?;
        tracing::debug!(username = %claims.username, "Benutzer abgemeldet");
        Ok(())
    }

    /// Reine kryptografische Pruefung (Signatur + Ablauf)
    ///
    /// Konsultiert das Register NICHT – ein abgemeldetes Token besteht diese
    /// Pruefung bis zu seinem natuerlichen Ablauf. Widerrufs-bewusste
    /// Aufrufer nutzen [`Self::token_mit_register_pruefen`].
    pub fn token_pruefen(&self, token: &str) -> bool {
        self.token_dienst.ist_gueltig(token)
    }

    /// Register-konsistente Pruefung fuer geschuetzte Routen
    ///
    /// Gueltig ist ein Token nur, wenn (a) die Signatur stimmt, (b) es nicht
    /// abgelaufen ist und (c) der Registereintrag des Benutzers exakt diesem
    /// Tokenstring entspricht. Bei Erfolg wird die Register-TTL verlaengert
    /// (gleitendes Session-Fenster).
    pub async fn token_mit_register_pruefen(&self, token: &str) -> AuthResult<TokenClaims> {
        let claims = self.token_dienst.pruefen(token)?;

        match self.register.holen(&claims.username).await? {
            Some(ref eingetragen) if eingetragen == token => {
                self.register
                    .verlaengern(&claims.username, self.token_dienst.gueltigkeit())
                    .await?;
                Ok(claims)
            }
            _ => Err(AuthError::TokenWiderrufen),
        }
    }

    /// Laedt den Benutzer zum Token frisch aus dem Speicher
    ///
    /// Liefert immer den Live-Zustand, nie veraltete Claims.
    pub async fn aktueller_benutzer(&self, token: &str) -> AuthResult<BenutzerRecord> {
        let claims = self.token_dienst.pruefen(token)?;
        let id = claims.benutzer_id()?;

        self.benutzer_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(id.to_string()))
    }

    /// Der Benutzername aus den Token-Claims
    pub fn aktueller_benutzername(&self, token: &str) -> AuthResult<String> {
        Ok(self.token_dienst.pruefen(token)?.username)
    }

    /// Die Rollenmenge aus den Token-Claims
    pub fn aktuelle_rollen(&self, token: &str) -> AuthResult<Vec<String>> {
        Ok(self.token_dienst.pruefen(token)?.rollen)
    }

    /// Prueft ob das Token Administratorrechte traegt
    pub fn ist_admin(&self, token: &str) -> AuthResult<bool> {
        Ok(crate::guard::ist_admin(
            &self.token_dienst.pruefen(token)?.rollen,
        ))
    }

    /// Stellt ein frisches Token fuer dasselbe Subjekt aus
    ///
    /// Aktualisiert das Register NICHT – der Aufrufer entscheidet, ob das
    /// neue Token die aktive Session wird.
    pub fn token_erneuern(&self, token: &str) -> AuthResult<String> {
        let claims = self.token_dienst.pruefen(token)?;
        self.token_dienst
            .ausstellen(claims.benutzer_id()?, &claims.username, &claims.rollen)
    }

    /// Aendert das Passwort eines Benutzers (verlangt das alte Passwort)
    pub async fn passwort_aendern(
        &self,
        id: BenutzerId,
        altes_passwort: &str,
        neues_passwort: &str,
    ) -> AuthResult<BenutzerRecord> {
        let benutzer = self
            .benutzer_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(id.to_string()))?;

        if !passwort_verifizieren(altes_passwort, &benutzer.password_hash) {
            return Err(AuthError::AltesPasswortFalsch);
        }

        let bearbeiter = benutzer.username.clone();
        self.passwort_setzen(benutzer, neues_passwort, &bearbeiter)
            .await
    }

    /// Setzt das Passwort ohne Pruefung des alten (Admin-Reset)
    pub async fn passwort_zuruecksetzen(
        &self,
        id: BenutzerId,
        neues_passwort: &str,
        bearbeiter: &str,
    ) -> AuthResult<BenutzerRecord> {
        let benutzer = self
            .benutzer_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(id.to_string()))?;

        self.passwort_setzen(benutzer, neues_passwort, bearbeiter)
            .await
    }

    /// Gemeinsamer Pfad beider Passwort-Operationen: neu hashen, Reset-Zeit
    /// stempeln, versionsgeprueft speichern und die aktive Session beenden.
    async fn passwort_setzen(
        &self,
        mut benutzer: BenutzerRecord,
        neues_passwort: &str,
        bearbeiter: &str,
    ) -> AuthResult<BenutzerRecord> {
        if neues_passwort.len() < 6 {
            return Err(AuthError::Validierung(
                "Passwort muss mindestens 6 Zeichen haben".into(),
            ));
        }

        let jetzt = Utc::now();
        benutzer.password_hash = passwort_hashen(neues_passwort)?;
        benutzer.password_reset_at = Some(jetzt);
        benutzer.updated_at = Some(jetzt);
        benutzer.updated_by = Some(bearbeiter.to_string());

        let gespeichert = self.benutzer_repo.save(&benutzer).await?;

        // Passwortwechsel beendet die aktive Session
        self.register.entfernen(&gespeichert.username).await?;

        tracing::info!(
            user_id = %gespeichert.id,
            bearbeiter = %bearbeiter,
            "Passwort geaendert, Session invalidiert"
        );

        Ok(gespeichert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Duration;

    use pfoertner_db::models::{
        BenutzerFilter, KontoStatus, NeuerBenutzer, Seite, SeitenAnfrage,
    };
    use pfoertner_db::{DbError, DbResult};

    use crate::registry::MemoryTokenRegister;

    // Minimaler In-Memory UserRepository fuer Tests – erzwingt die
    // Versionspruefung wie die echte SQLite-Implementierung
    #[derive(Default)]
    struct TestUserRepo {
        benutzer: Mutex<Vec<BenutzerRecord>>,
    }

    impl TestUserRepo {
        fn direkt_aendern(&self, username: &str, f: impl FnOnce(&mut BenutzerRecord)) {
            let mut benutzer = self.benutzer.lock().unwrap();
            let eintrag = benutzer
                .iter_mut()
                .find(|u| u.username == username)
                .expect("Testbenutzer fehlt");
            f(eintrag);
        }

        fn roh_laden(&self, username: &str) -> BenutzerRecord {
            self.benutzer
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username)
                .cloned()
                .expect("Testbenutzer fehlt")
        }
    }

    impl UserRepository for TestUserRepo {
        async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
            let mut benutzer = self.benutzer.lock().unwrap();
            if benutzer.iter().any(|u| u.username == data.username) {
                return Err(DbError::Eindeutigkeit(data.username.to_string()));
            }
            let record = BenutzerRecord {
                id: pfoertner_core::BenutzerId(benutzer.len() as i64 + 1),
                username: data.username.to_string(),
                password_hash: data.password_hash.to_string(),
                telefon: data.telefon.map(String::from),
                email: data.email.map(String::from),
                status: KontoStatus::Aktiv,
                rollen: data.rollen.to_string(),
                login_fail_count: 0,
                last_login: None,
                last_login_ip: None,
                password_reset_at: Some(Utc::now()),
                locked_at: None,
                deleted: false,
                version: 0,
                created_at: Utc::now(),
                updated_at: None,
                created_by: Some(data.erstellt_von.to_string()),
                updated_by: None,
            };
            benutzer.push(record.clone());
            Ok(record)
        }

        async fn get_by_id(&self, id: BenutzerId) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id && !u.deleted)
                .cloned())
        }

        async fn get_by_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username && !u.deleted)
                .cloned())
        }

        async fn save(&self, record: &BenutzerRecord) -> DbResult<BenutzerRecord> {
            let mut benutzer = self.benutzer.lock().unwrap();
            let eintrag = benutzer
                .iter_mut()
                .find(|u| u.id == record.id)
                .ok_or_else(|| DbError::nicht_gefunden(record.id.to_string()))?;
            if eintrag.version != record.version {
                return Err(DbError::VersionsKonflikt(record.id.to_string()));
            }
            *eintrag = BenutzerRecord {
                version: record.version + 1,
                ..record.clone()
            };
            Ok(eintrag.clone())
        }

        async fn list(&self, _seite: SeitenAnfrage) -> DbResult<Seite<BenutzerRecord>> {
            let benutzer = self.benutzer.lock().unwrap();
            Ok(Seite {
                eintraege: benutzer.clone(),
                gesamt: benutzer.len() as i64,
            })
        }

        async fn search(
            &self,
            _filter: &BenutzerFilter,
            seite: SeitenAnfrage,
        ) -> DbResult<Seite<BenutzerRecord>> {
            self.list(seite).await
        }
    }

    struct TestAufbau {
        repo: Arc<TestUserRepo>,
        register: Arc<MemoryTokenRegister>,
        service: AuthService<TestUserRepo, MemoryTokenRegister>,
    }

    fn aufbau() -> TestAufbau {
        let repo = Arc::new(TestUserRepo::default());
        let register = MemoryTokenRegister::neu();
        let token_dienst = Arc::new(TokenDienst::neu("test_geheimnis", Duration::hours(24)));
        let service = AuthService::neu(
            Arc::clone(&repo),
            Arc::clone(&register),
            token_dienst,
        );
        TestAufbau {
            repo,
            register,
            service,
        }
    }

    fn registrierung<'a>(username: &'a str, passwort: &'a str) -> NeueRegistrierung<'a> {
        NeueRegistrierung {
            username,
            passwort,
            telefon: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn registrieren_und_anmelden() {
        let t = aufbau();

        let user = t
            .service
            .registrieren(registrierung("testuser", "sicheres_passwort!"))
            .await
            .expect("Registrierung fehlgeschlagen");

        assert_eq!(user.username, "testuser");
        assert_eq!(user.rollen, "ROLE_USER");
        assert_eq!(user.status, KontoStatus::Aktiv);

        let token = t
            .service
            .anmelden("testuser", "sicheres_passwort!", &ClientKontext::default())
            .await
            .expect("Anmeldung fehlgeschlagen");

        assert!(!token.is_empty());
        assert!(t.service.token_pruefen(&token));

        // Login-Buchung ist persistiert
        let geladen = t.repo.roh_laden("testuser");
        assert!(geladen.last_login.is_some());
        assert_eq!(geladen.login_fail_count, 0);
    }

    #[tokio::test]
    async fn doppelte_registrierung_schlaegt_fehl() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("duplikat", "passwort1"))
            .await
            .unwrap();
        let ergebnis = t
            .service
            .registrieren(registrierung("duplikat", "passwort2"))
            .await;
        assert!(matches!(ergebnis, Err(AuthError::BenutzernameVergeben(_))));
    }

    #[tokio::test]
    async fn zu_kurze_eingaben_abgelehnt() {
        let t = aufbau();
        assert!(matches!(
            t.service.registrieren(registrierung("x", "passwort")).await,
            Err(AuthError::Validierung(_))
        ));
        assert!(matches!(
            t.service.registrieren(registrierung("gueltig", "kurz")).await,
            Err(AuthError::Validierung(_))
        ));
    }

    #[tokio::test]
    async fn falsches_passwort_gleiche_meldung_wie_unbekannt() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("user", "richtig_lang"))
            .await
            .unwrap();

        let falsch = t
            .service
            .anmelden("user", "falsches_pw", &ClientKontext::default())
            .await;
        let unbekannt = t
            .service
            .anmelden("niemand", "egal_welches", &ClientKontext::default())
            .await;

        assert!(matches!(falsch, Err(AuthError::UngueltigeAnmeldedaten)));
        assert!(matches!(unbekannt, Err(AuthError::UngueltigeAnmeldedaten)));

        // Der Fehlversuch wurde gezaehlt und persistiert
        assert_eq!(t.repo.roh_laden("user").login_fail_count, 1);
    }

    #[tokio::test]
    async fn sperrung_nach_fuenf_fehlversuchen() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("sperrkandidat", "richtig_lang"))
            .await
            .unwrap();

        for i in 1..=4 {
            let e = t
                .service
                .anmelden("sperrkandidat", "falsch!", &ClientKontext::default())
                .await;
            assert!(matches!(e, Err(AuthError::UngueltigeAnmeldedaten)), "Versuch {i}");
        }

        // Fuenfter Fehlversuch sperrt
        let fuenfter = t
            .service
            .anmelden("sperrkandidat", "falsch!", &ClientKontext::default())
            .await;
        assert!(matches!(fuenfter, Err(AuthError::ZuVieleFehlversuche)));

        let geladen = t.repo.roh_laden("sperrkandidat");
        assert_eq!(geladen.status, KontoStatus::Gesperrt);
        assert!(geladen.locked_at.is_some());

        // Sechster Versuch mit KORREKTEM Passwort scheitert an der Sperre
        let sechster = t
            .service
            .anmelden("sperrkandidat", "richtig_lang", &ClientKontext::default())
            .await;
        assert!(matches!(sechster, Err(AuthError::KontoGesperrt)));
    }

    #[tokio::test]
    async fn sperre_heilt_nach_ablauf_und_zaehler_wird_zurueckgesetzt() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("heilung", "richtig_lang"))
            .await
            .unwrap();

        // Abgelaufene Sperre simulieren
        t.repo.direkt_aendern("heilung", |u| {
            u.status = KontoStatus::Gesperrt;
            u.login_fail_count = 5;
            u.locked_at = Some(Utc::now() - Duration::hours(2));
        });

        let token = t
            .service
            .anmelden("heilung", "richtig_lang", &ClientKontext::default())
            .await
            .expect("Login nach Sperrfrist muss gelingen");
        assert!(t.service.token_pruefen(&token));

        let geladen = t.repo.roh_laden("heilung");
        assert_eq!(geladen.status, KontoStatus::Aktiv);
        assert_eq!(geladen.login_fail_count, 0);
        assert!(geladen.locked_at.is_none());
    }

    #[tokio::test]
    async fn gebanntes_konto_trotz_passwort_abgelehnt() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("gebannt", "richtig_lang"))
            .await
            .unwrap();
        t.repo
            .direkt_aendern("gebannt", |u| u.status = KontoStatus::Gebannt);

        let ergebnis = t
            .service
            .anmelden("gebannt", "richtig_lang", &ClientKontext::default())
            .await;
        assert!(matches!(ergebnis, Err(AuthError::KontoGebannt)));
    }

    #[tokio::test]
    async fn wiederholter_login_liefert_dasselbe_token() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("wiederkehrer", "richtig_lang"))
            .await
            .unwrap();

        let erstes = t
            .service
            .anmelden("wiederkehrer", "richtig_lang", &ClientKontext::default())
            .await
            .unwrap();
        let zweites = t
            .service
            .anmelden("wiederkehrer", "richtig_lang", &ClientKontext::default())
            .await
            .unwrap();

        assert_eq!(erstes, zweites, "Token muss wiederverwendet werden");
    }

    #[tokio::test]
    async fn abmelden_ist_idempotent() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("abmelder", "richtig_lang"))
            .await
            .unwrap();
        let token = t
            .service
            .anmelden("abmelder", "richtig_lang", &ClientKontext::default())
            .await
            .unwrap();

        t.service.abmelden(&token).await.expect("Erstes Abmelden");
        t.service.abmelden(&token).await.expect("Zweites Abmelden");
    }

    #[tokio::test]
    async fn widerruf_asymmetrie_nach_abmeldung() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("asym", "richtig_lang"))
            .await
            .unwrap();
        let token = t
            .service
            .anmelden("asym", "richtig_lang", &ClientKontext::default())
            .await
            .unwrap();

        assert!(t.service.token_mit_register_pruefen(&token).await.is_ok());

        t.service.abmelden(&token).await.unwrap();

        // Reine Pruefung besteht weiterhin, Register-konsistente nicht mehr
        assert!(t.service.token_pruefen(&token));
        let ergebnis = t.service.token_mit_register_pruefen(&token).await;
        assert!(matches!(ergebnis, Err(AuthError::TokenWiderrufen)));
    }

    #[tokio::test]
    async fn neuer_login_widerruft_altes_token() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("doppelt", "richtig_lang"))
            .await
            .unwrap();

        let altes = t
            .service
            .anmelden("doppelt", "richtig_lang", &ClientKontext::default())
            .await
            .unwrap();

        // Registereintrag entfernen und neu anmelden: neues Token ersetzt
        // das alte im Register
        t.register.entfernen("doppelt").await.unwrap();
        let neues = t
            .service
            .anmelden("doppelt", "richtig_lang", &ClientKontext::default())
            .await
            .unwrap();

        assert!(t.service.token_mit_register_pruefen(&neues).await.is_ok());
        if altes != neues {
            let ergebnis = t.service.token_mit_register_pruefen(&altes).await;
            assert!(matches!(ergebnis, Err(AuthError::TokenWiderrufen)));
        }
    }

    #[tokio::test]
    async fn geloeschter_benutzer_ist_unsichtbar() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("geist", "richtig_lang"))
            .await
            .unwrap();
        let token = t
            .service
            .anmelden("geist", "richtig_lang", &ClientKontext::default())
            .await
            .unwrap();

        t.repo.direkt_aendern("geist", |u| u.deleted = true);

        // Login wie unbekannter Benutzer, Live-Lookup wie nicht gefunden
        let login = t
            .service
            .anmelden("geist", "richtig_lang", &ClientKontext::default())
            .await;
        assert!(matches!(login, Err(AuthError::UngueltigeAnmeldedaten)));

        let lookup = t.service.aktueller_benutzer(&token).await;
        assert!(matches!(lookup, Err(AuthError::BenutzerNichtGefunden(_))));
    }

    #[tokio::test]
    async fn claims_projektionen() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("projektion", "richtig_lang"))
            .await
            .unwrap();
        let token = t
            .service
            .anmelden("projektion", "richtig_lang", &ClientKontext::default())
            .await
            .unwrap();

        assert_eq!(
            t.service.aktueller_benutzername(&token).unwrap(),
            "projektion"
        );
        assert_eq!(
            t.service.aktuelle_rollen(&token).unwrap(),
            vec!["ROLE_USER".to_string()]
        );
        assert!(!t.service.ist_admin(&token).unwrap());

        let benutzer = t.service.aktueller_benutzer(&token).await.unwrap();
        assert_eq!(benutzer.username, "projektion");
    }

    #[tokio::test]
    async fn token_erneuern_laesst_register_unberuehrt() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("erneuerer", "richtig_lang"))
            .await
            .unwrap();
        let altes = t
            .service
            .anmelden("erneuerer", "richtig_lang", &ClientKontext::default())
            .await
            .unwrap();

        let neues = t.service.token_erneuern(&altes).unwrap();
        assert!(t.service.token_pruefen(&neues));

        // Das alte Token bleibt die aktive Session
        assert!(t.service.token_mit_register_pruefen(&altes).await.is_ok());
        assert_eq!(
            t.register.holen("erneuerer").await.unwrap().as_deref(),
            Some(altes.as_str())
        );
    }

    #[tokio::test]
    async fn passwort_aendern_erzwingt_abmeldung() {
        let t = aufbau();
        let user = t
            .service
            .registrieren(registrierung("pwuser", "altes_passwort"))
            .await
            .unwrap();
        let token = t
            .service
            .anmelden("pwuser", "altes_passwort", &ClientKontext::default())
            .await
            .unwrap();

        t.service
            .passwort_aendern(user.id, "altes_passwort", "neues_passwort")
            .await
            .unwrap();

        // Die aktive Session wurde beendet
        let pruefung = t.service.token_mit_register_pruefen(&token).await;
        assert!(matches!(pruefung, Err(AuthError::TokenWiderrufen)));

        // Altes Passwort funktioniert nicht mehr, neues schon
        let alt = t
            .service
            .anmelden("pwuser", "altes_passwort", &ClientKontext::default())
            .await;
        assert!(matches!(alt, Err(AuthError::UngueltigeAnmeldedaten)));

        t.service
            .anmelden("pwuser", "neues_passwort", &ClientKontext::default())
            .await
            .expect("Neues Passwort muss funktionieren");
    }

    #[tokio::test]
    async fn falsches_altes_passwort_abgelehnt() {
        let t = aufbau();
        let user = t
            .service
            .registrieren(registrierung("pwfalsch", "altes_passwort"))
            .await
            .unwrap();

        let ergebnis = t
            .service
            .passwort_aendern(user.id, "nicht_das_alte", "neues_passwort")
            .await;
        assert!(matches!(ergebnis, Err(AuthError::AltesPasswortFalsch)));

        let nochmal = t
            .service
            .anmelden("pwfalsch", "altes_passwort", &ClientKontext::default())
            .await;
        assert!(nochmal.is_ok(), "Altes Passwort muss unveraendert gelten");
    }

    #[tokio::test]
    async fn passwort_zuruecksetzen_ohne_altes() {
        let t = aufbau();
        let user = t
            .service
            .registrieren(registrierung("reset", "altes_passwort"))
            .await
            .unwrap();

        t.service
            .passwort_zuruecksetzen(user.id, "erzwungenes_pw", "admin")
            .await
            .unwrap();

        let geladen = t.repo.roh_laden("reset");
        assert_eq!(geladen.updated_by.as_deref(), Some("admin"));

        t.service
            .anmelden("reset", "erzwungenes_pw", &ClientKontext::default())
            .await
            .expect("Zurueckgesetztes Passwort muss funktionieren");
    }

    #[tokio::test]
    async fn login_stempelt_client_ip() {
        let t = aufbau();
        t.service
            .registrieren(registrierung("ipuser", "richtig_lang"))
            .await
            .unwrap();

        let kontext = ClientKontext {
            ip: Some("203.0.113.9".into()),
            user_agent: Some("test-agent".into()),
        };
        t.service
            .anmelden("ipuser", "richtig_lang", &kontext)
            .await
            .unwrap();

        let geladen = t.repo.roh_laden("ipuser");
        assert_eq!(geladen.last_login_ip.as_deref(), Some("203.0.113.9"));
    }
}
