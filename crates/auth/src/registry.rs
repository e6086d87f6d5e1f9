//! Session-Register: Benutzername -> aktuell gueltiges Token
//!
//! Das Register haelt pro Benutzer genau einen Tokenwert mit TTL. Ein neuer
//! Login ueberschreibt den Eintrag bedingungslos (letzter Schreiber gewinnt) –
//! genau das erzwingt "eine aktive Session pro Benutzer". Das Loeschen des
//! Eintrags widerruft alle zuvor ausgestellten Tokens dieses Benutzers, auch
//! wenn sie kryptografisch noch bis zu ihrem Ablauf gueltig bleiben.

use std::{collections::HashMap, sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::error::AuthResult;

/// Intervall fuer den automatischen Cleanup-Task: 15 Minuten
const CLEANUP_INTERVALL: StdDuration = StdDuration::from_secs(15 * 60);

/// Schnittstelle zum Session-Register (Cache-Kollaborateur)
#[allow(async_fn_in_trait)]
pub trait TokenRegister: Send + Sync {
    /// Traegt das Token fuer den Benutzer ein (bedingungsloses Ueberschreiben)
    async fn setzen(&self, username: &str, token: &str, ttl: Duration) -> AuthResult<()>;

    /// Liest das aktuell eingetragene Token; abgelaufene Eintraege gelten
    /// als nicht vorhanden
    async fn holen(&self, username: &str) -> AuthResult<Option<String>>;

    /// Verlaengert die TTL ohne den Wert zu aendern
    ///
    /// Gibt `false` zurueck wenn kein (gueltiger) Eintrag vorhanden ist.
    async fn verlaengern(&self, username: &str, ttl: Duration) -> AuthResult<bool>;

    /// Entfernt den Eintrag (Logout)
    ///
    /// Ein fehlender Schluessel gilt als "bereits abgemeldet", nicht als Fehler.
    async fn entfernen(&self, username: &str) -> AuthResult<bool>;
}

/// Ein Registereintrag mit Ablaufzeitpunkt
#[derive(Debug, Clone)]
struct RegisterEintrag {
    token: String,
    laeuft_ab_am: DateTime<Utc>,
}

impl RegisterEintrag {
    fn ist_gueltig(&self, jetzt: DateTime<Utc>) -> bool {
        jetzt < self.laeuft_ab_am
    }
}

/// In-Memory-Implementierung des Session-Registers mit TTL-Unterstuetzung
#[derive(Debug, Default)]
pub struct MemoryTokenRegister {
    /// username -> Eintrag
    eintraege: RwLock<HashMap<String, RegisterEintrag>>,
}

impl MemoryTokenRegister {
    /// Erstellt ein neues leeres Register
    pub fn neu() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Erstellt ein Register und startet den Cleanup-Task
    pub fn neu_mit_cleanup(register: Arc<Self>) -> Arc<Self> {
        let register_klon = Arc::clone(&register);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVALL).await;
                let entfernt = register_klon.cleanup_abgelaufene().await;
                if entfernt > 0 {
                    tracing::debug!(anzahl = entfernt, "Abgelaufene Registereintraege bereinigt");
                }
            }
        });
        register
    }

    /// Bereinigt abgelaufene Eintraege und gibt die Anzahl zurueck
    pub async fn cleanup_abgelaufene(&self) -> usize {
        let jetzt = Utc::now();
        let mut eintraege = self.eintraege.write().await;
        let vorher = eintraege.len();
        eintraege.retain(|_, e| e.ist_gueltig(jetzt));
        vorher - eintraege.len()
    }

    /// Anzahl der aktiven (nicht abgelaufenen) Eintraege
    pub async fn anzahl_aktive(&self) -> usize {
        let jetzt = Utc::now();
        let eintraege = self.eintraege.read().await;
        eintraege.values().filter(|e| e.ist_gueltig(jetzt)).count()
    }
}

impl TokenRegister for MemoryTokenRegister {
    async fn setzen(&self, username: &str, token: &str, ttl: Duration) -> AuthResult<()> {
        let eintrag = RegisterEintrag {
            token: token.to_string(),
            laeuft_ab_am: Utc::now() + ttl,
        };
        self.eintraege
            .write()
            .await
            .insert(username.to_string(), eintrag);
        tracing::debug!(username = %username, "Registereintrag gesetzt");
        Ok(())
    }

    async fn holen(&self, username: &str) -> AuthResult<Option<String>> {
        let eintraege = self.eintraege.read().await;
        Ok(eintraege
            .get(username)
            .filter(|e| e.ist_gueltig(Utc::now()))
            .map(|e| e.token.clone()))
    }

    async fn verlaengern(&self, username: &str, ttl: Duration) -> AuthResult<bool> {
        let jetzt = Utc::now();
        let mut eintraege = self.eintraege.write().await;
        match eintraege.get_mut(username) {
            Some(eintrag) if eintrag.ist_gueltig(jetzt) => {
                eintrag.laeuft_ab_am = jetzt + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn entfernen(&self, username: &str) -> AuthResult<bool> {
        let entfernt = self.eintraege.write().await.remove(username).is_some();
        if entfernt {
            tracing::debug!(username = %username, "Registereintrag entfernt");
        }
        Ok(entfernt)
    }
}
