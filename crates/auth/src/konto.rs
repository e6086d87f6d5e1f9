//! Kontozustands-Maschine
//!
//! Fuehrt die Uebergaenge zwischen Aktiv, Gebannt und Gesperrt anhand von
//! Login-Versuchen. Alle Funktionen sind pur und bekommen den Zeitpunkt
//! hereingereicht, damit Tests die Uhr kontrollieren koennen. Persistiert
//! wird ausserhalb (versionsgeprueftes Speichern im Orchestrator).

use chrono::{DateTime, Duration, Utc};

use pfoertner_db::models::{BenutzerRecord, KontoStatus};

/// Anzahl Fehlversuche bis zur Sperrung
pub const MAX_FEHLVERSUCHE: i64 = 5;

/// Sperrfrist nach zu vielen Fehlversuchen: 1 Stunde
pub const SPERRDAUER_SEKUNDEN: i64 = 60 * 60;

/// Ergebnis eines verbuchten Fehlversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fehlversuch {
    /// Schwelle erreicht, Konto ist jetzt gesperrt
    Gesperrt,
    /// Noch so viele Versuche uebrig
    Verbleibend(i64),
}

/// Verbucht einen fehlgeschlagenen Login-Versuch am Datensatz
///
/// Erhoeht den Zaehler; beim Erreichen der Schwelle wechselt das Konto
/// nach Gesperrt und der Sperrzeitpunkt wird gestempelt.
pub fn fehlversuch_verbuchen(konto: &mut BenutzerRecord, jetzt: DateTime<Utc>) -> Fehlversuch {
    konto.login_fail_count += 1;

    if konto.login_fail_count >= MAX_FEHLVERSUCHE {
        konto.status = KontoStatus::Gesperrt;
        konto.locked_at = Some(jetzt);
        Fehlversuch::Gesperrt
    } else {
        Fehlversuch::Verbleibend(MAX_FEHLVERSUCHE - konto.login_fail_count)
    }
}

/// Ergebnis der Zulassungspruefung vor einem Login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zulassung {
    /// Login darf fortgesetzt werden; `entsperrt` zeigt eine gerade
    /// abgelaufene Sperre an
    Erlaubt { entsperrt: bool },
    /// Konto ist gebannt – nur ein Admin hebt das auf
    Gebannt,
    /// Sperrfrist laeuft noch
    NochGesperrt,
}

/// Prueft ob das Konto einen Login zulaesst
///
/// Eine abgelaufene Sperre wird dabei direkt am Datensatz aufgehoben
/// (Status zurueck auf Aktiv, Sperrzeitpunkt geloescht); der Aufrufer
/// persistiert den neuen Zustand zusammen mit der Login-Buchung.
pub fn zulassung_pruefen(konto: &mut BenutzerRecord, jetzt: DateTime<Utc>) -> Zulassung {
    match konto.status {
        KontoStatus::Gebannt => Zulassung::Gebannt,
        KontoStatus::Gesperrt => match konto.locked_at {
            Some(seit) if jetzt - seit < Duration::seconds(SPERRDAUER_SEKUNDEN) => {
                Zulassung::NochGesperrt
            }
            _ => {
                konto.status = KontoStatus::Aktiv;
                konto.locked_at = None;
                Zulassung::Erlaubt { entsperrt: true }
            }
        },
        KontoStatus::Aktiv => Zulassung::Erlaubt { entsperrt: false },
    }
}

/// Verbucht einen erfolgreichen Login am Datensatz
///
/// Setzt den Fehlversuchszaehler zurueck und stempelt Zeitpunkt und
/// Client-IP des Logins.
pub fn anmeldung_verbuchen(konto: &mut BenutzerRecord, jetzt: DateTime<Utc>, ip: Option<&str>) {
    konto.login_fail_count = 0;
    konto.last_login = Some(jetzt);
    konto.last_login_ip = ip.map(String::from);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfoertner_core::BenutzerId;

    fn konto(status: KontoStatus, fehlversuche: i64) -> BenutzerRecord {
        BenutzerRecord {
            id: BenutzerId(1),
            username: "test".into(),
            password_hash: "hash".into(),
            telefon: None,
            email: None,
            status,
            rollen: "ROLE_USER".into(),
            login_fail_count: fehlversuche,
            last_login: None,
            last_login_ip: None,
            password_reset_at: None,
            locked_at: None,
            deleted: false,
            version: 0,
            created_at: Utc::now(),
            updated_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    #[test]
    fn fehlversuch_erhoeht_zaehler() {
        let mut k = konto(KontoStatus::Aktiv, 0);
        let jetzt = Utc::now();

        assert_eq!(
            fehlversuch_verbuchen(&mut k, jetzt),
            Fehlversuch::Verbleibend(4)
        );
        assert_eq!(k.login_fail_count, 1);
        assert_eq!(k.status, KontoStatus::Aktiv);
        assert!(k.locked_at.is_none());
    }

    #[test]
    fn fuenfter_fehlversuch_sperrt() {
        let mut k = konto(KontoStatus::Aktiv, 4);
        let jetzt = Utc::now();

        assert_eq!(fehlversuch_verbuchen(&mut k, jetzt), Fehlversuch::Gesperrt);
        assert_eq!(k.login_fail_count, 5);
        assert_eq!(k.status, KontoStatus::Gesperrt);
        assert_eq!(k.locked_at, Some(jetzt));
    }

    #[test]
    fn aktives_konto_ist_zugelassen() {
        let mut k = konto(KontoStatus::Aktiv, 2);
        assert_eq!(
            zulassung_pruefen(&mut k, Utc::now()),
            Zulassung::Erlaubt { entsperrt: false }
        );
    }

    #[test]
    fn gebanntes_konto_bleibt_gebannt() {
        // Bann heilt nicht von selbst, auch nicht nach langer Zeit
        let mut k = konto(KontoStatus::Gebannt, 0);
        let spaeter = Utc::now() + Duration::days(365);
        assert_eq!(zulassung_pruefen(&mut k, spaeter), Zulassung::Gebannt);
        assert_eq!(k.status, KontoStatus::Gebannt);
    }

    #[test]
    fn sperre_innerhalb_der_frist() {
        let jetzt = Utc::now();
        let mut k = konto(KontoStatus::Gesperrt, 5);
        k.locked_at = Some(jetzt - Duration::minutes(30));

        assert_eq!(zulassung_pruefen(&mut k, jetzt), Zulassung::NochGesperrt);
        assert_eq!(k.status, KontoStatus::Gesperrt);
    }

    #[test]
    fn sperre_heilt_nach_ablauf() {
        let jetzt = Utc::now();
        let mut k = konto(KontoStatus::Gesperrt, 5);
        k.locked_at = Some(jetzt - Duration::seconds(SPERRDAUER_SEKUNDEN));

        // Genau die volle Frist ist verstrichen: Zulassung + Entsperrung
        assert_eq!(
            zulassung_pruefen(&mut k, jetzt),
            Zulassung::Erlaubt { entsperrt: true }
        );
        assert_eq!(k.status, KontoStatus::Aktiv);
        assert!(k.locked_at.is_none());
    }

    #[test]
    fn sperre_ohne_zeitstempel_wird_aufgehoben() {
        // Inkonsistenter Datensatz: gesperrt ohne locked_at
        let mut k = konto(KontoStatus::Gesperrt, 5);
        assert_eq!(
            zulassung_pruefen(&mut k, Utc::now()),
            Zulassung::Erlaubt { entsperrt: true }
        );
    }

    #[test]
    fn anmeldung_setzt_zaehler_zurueck() {
        let jetzt = Utc::now();
        let mut k = konto(KontoStatus::Aktiv, 4);

        anmeldung_verbuchen(&mut k, jetzt, Some("192.168.1.1"));

        assert_eq!(k.login_fail_count, 0);
        assert_eq!(k.last_login, Some(jetzt));
        assert_eq!(k.last_login_ip.as_deref(), Some("192.168.1.1"));
    }
}
