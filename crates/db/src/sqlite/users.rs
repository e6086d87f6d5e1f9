//! SQLite-Implementierung des UserRepository

use chrono::{DateTime, Utc};
use sqlx::Row as _;

use pfoertner_core::BenutzerId;

use crate::error::{DbError, DbResult};
use crate::models::{
    BenutzerFilter, BenutzerRecord, KontoStatus, NeuerBenutzer, Seite, SeitenAnfrage,
};
use crate::repository::UserRepository;
use crate::sqlite::pool::SqliteDb;

const BENUTZER_SPALTEN: &str = "id, username, password_hash, telefon, email, status, rollen, \
     login_fail_count, last_login, last_login_ip, password_reset_at, locked_at, \
     deleted, version, created_at, updated_at, created_by, updated_by";

impl UserRepository for SqliteDb {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let ergebnis = sqlx::query(
            "INSERT INTO users (username, password_hash, telefon, email, status, rollen, \
             login_fail_count, password_reset_at, deleted, version, created_at, created_by) \
             VALUES (?, ?, ?, ?, 0, ?, 0, ?, 0, 0, ?, ?)",
        )
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.telefon)
        .bind(data.email)
        .bind(data.rollen)
        .bind(&now_str)
        .bind(&now_str)
        .bind(data.erstellt_von)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!("Benutzername '{}' bereits vergeben", data.username))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(BenutzerRecord {
            id: BenutzerId(ergebnis.last_insert_rowid()),
            username: data.username.to_string(),
            password_hash: data.password_hash.to_string(),
            telefon: data.telefon.map(String::from),
            email: data.email.map(String::from),
            status: KontoStatus::Aktiv,
            rollen: data.rollen.to_string(),
            login_fail_count: 0,
            last_login: None,
            last_login_ip: None,
            password_reset_at: Some(now),
            locked_at: None,
            deleted: false,
            version: 0,
            created_at: now,
            updated_at: None,
            created_by: Some(data.erstellt_von.to_string()),
            updated_by: None,
        })
    }

    async fn get_by_id(&self, id: BenutzerId) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {BENUTZER_SPALTEN} FROM users WHERE id = ? AND deleted = 0");
        let row = sqlx::query(&sql)
            .bind(id.inner())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn get_by_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {BENUTZER_SPALTEN} FROM users WHERE username = ? AND deleted = 0");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn save(&self, record: &BenutzerRecord) -> DbResult<BenutzerRecord> {
        // Bedingtes Ganzzeilen-UPDATE: entweder greift die Versionspruefung
        // und alle Felder werden geschrieben, oder nichts wird geschrieben.
        let affected = sqlx::query(
            "UPDATE users SET username = ?, password_hash = ?, telefon = ?, email = ?, \
             status = ?, rollen = ?, login_fail_count = ?, last_login = ?, last_login_ip = ?, \
             password_reset_at = ?, locked_at = ?, deleted = ?, updated_at = ?, updated_by = ?, \
             version = version + 1 \
             WHERE id = ? AND version = ?",
        )
        .bind(&record.username)
        .bind(&record.password_hash)
        .bind(&record.telefon)
        .bind(&record.email)
        .bind(record.status.als_i64())
        .bind(&record.rollen)
        .bind(record.login_fail_count)
        .bind(record.last_login.map(|t| t.to_rfc3339()))
        .bind(&record.last_login_ip)
        .bind(record.password_reset_at.map(|t| t.to_rfc3339()))
        .bind(record.locked_at.map(|t| t.to_rfc3339()))
        .bind(record.deleted as i64)
        .bind(record.updated_at.map(|t| t.to_rfc3339()))
        .bind(&record.updated_by)
        .bind(record.id.inner())
        .bind(record.version)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            // Unterscheiden: Datensatz weg oder Version veraltet?
            let existiert: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
                .bind(record.id.inner())
                .fetch_one(&self.pool)
                .await?;
            if existiert == 0 {
                return Err(DbError::nicht_gefunden(format!("Benutzer {}", record.id)));
            }
            return Err(DbError::VersionsKonflikt(format!(
                "Benutzer {} wurde zwischenzeitlich geaendert (Version {})",
                record.id, record.version
            )));
        }

        Ok(BenutzerRecord {
            version: record.version + 1,
            ..record.clone()
        })
    }

    async fn list(&self, seite: SeitenAnfrage) -> DbResult<Seite<BenutzerRecord>> {
        let gesamt: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("SELECT {BENUTZER_SPALTEN} FROM users ORDER BY id LIMIT ? OFFSET ?");
        let rows = sqlx::query(&sql)
            .bind(seite.groesse)
            .bind(seite.offset())
            .fetch_all(&self.pool)
            .await?;

        let eintraege = rows.iter().map(row_to_benutzer).collect::<DbResult<_>>()?;
        Ok(Seite { eintraege, gesamt })
    }

    async fn search(
        &self,
        filter: &BenutzerFilter,
        seite: SeitenAnfrage,
    ) -> DbResult<Seite<BenutzerRecord>> {
        let (bedingung, werte) = filter_bedingungen(filter);

        let count_sql = format!("SELECT COUNT(*) FROM users{bedingung}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for wert in &werte {
            count_query = match wert {
                FilterWert::Text(s) => count_query.bind(s.clone()),
                FilterWert::Zahl(n) => count_query.bind(*n),
            };
        }
        let gesamt = count_query.fetch_one(&self.pool).await?;

        let select_sql = format!(
            "SELECT {BENUTZER_SPALTEN} FROM users{bedingung} ORDER BY id LIMIT ? OFFSET ?"
        );
        let mut select_query = sqlx::query(&select_sql);
        for wert in &werte {
            select_query = match wert {
                FilterWert::Text(s) => select_query.bind(s.clone()),
                FilterWert::Zahl(n) => select_query.bind(*n),
            };
        }
        let rows = select_query
            .bind(seite.groesse)
            .bind(seite.offset())
            .fetch_all(&self.pool)
            .await?;

        let eintraege = rows.iter().map(row_to_benutzer).collect::<DbResult<_>>()?;
        Ok(Seite { eintraege, gesamt })
    }
}

/// Bind-Wert fuer dynamisch gebaute WHERE-Klauseln
enum FilterWert {
    Text(String),
    Zahl(i64),
}

/// Baut die WHERE-Klausel und die zugehoerigen Bind-Werte fuer die Suche
fn filter_bedingungen(filter: &BenutzerFilter) -> (String, Vec<FilterWert>) {
    let mut klauseln: Vec<&str> = Vec::new();
    let mut werte: Vec<FilterWert> = Vec::new();

    if let Some(ref username) = filter.username {
        klauseln.push("username LIKE ?");
        werte.push(FilterWert::Text(format!("%{username}%")));
    }
    if let Some(ref telefon) = filter.telefon {
        klauseln.push("telefon LIKE ?");
        werte.push(FilterWert::Text(format!("%{telefon}%")));
    }
    if let Some(ref email) = filter.email {
        klauseln.push("email LIKE ?");
        werte.push(FilterWert::Text(format!("%{email}%")));
    }
    if let Some(ref rollen) = filter.rollen {
        klauseln.push("rollen LIKE ?");
        werte.push(FilterWert::Text(format!("%{rollen}%")));
    }
    if let Some(status) = filter.status {
        klauseln.push("status = ?");
        werte.push(FilterWert::Zahl(status.als_i64()));
    }
    if let Some(n) = filter.login_fail_count {
        klauseln.push("login_fail_count = ?");
        werte.push(FilterWert::Zahl(n));
    }
    if let Some(deleted) = filter.deleted {
        klauseln.push("deleted = ?");
        werte.push(FilterWert::Zahl(deleted as i64));
    }
    if let Some(ab) = filter.erstellt_ab {
        klauseln.push("created_at >= ?");
        werte.push(FilterWert::Text(ab.to_rfc3339()));
    }
    if let Some(bis) = filter.erstellt_bis {
        klauseln.push("created_at <= ?");
        werte.push(FilterWert::Text(bis.to_rfc3339()));
    }
    if let Some(ab) = filter.aktualisiert_ab {
        klauseln.push("updated_at >= ?");
        werte.push(FilterWert::Text(ab.to_rfc3339()));
    }
    if let Some(bis) = filter.aktualisiert_bis {
        klauseln.push("updated_at <= ?");
        werte.push(FilterWert::Text(bis.to_rfc3339()));
    }

    if klauseln.is_empty() {
        (String::new(), werte)
    } else {
        (format!(" WHERE {}", klauseln.join(" AND ")), werte)
    }
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    let status_int: i64 = row.try_get("status")?;
    let status = KontoStatus::from_i64(status_int).map_err(DbError::intern)?;

    let deleted: i64 = row.try_get("deleted")?;

    Ok(BenutzerRecord {
        id: BenutzerId(row.try_get("id")?),
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        telefon: row.try_get("telefon")?,
        email: row.try_get("email")?,
        status,
        rollen: row.try_get("rollen")?,
        login_fail_count: row.try_get("login_fail_count")?,
        last_login: zeit_lesen(row, "last_login")?,
        last_login_ip: row.try_get("last_login_ip")?,
        password_reset_at: zeit_lesen(row, "password_reset_at")?,
        locked_at: zeit_lesen(row, "locked_at")?,
        deleted: deleted != 0,
        version: row.try_get("version")?,
        created_at: zeit_lesen(row, "created_at")?
            .ok_or_else(|| DbError::intern("created_at fehlt"))?,
        updated_at: zeit_lesen(row, "updated_at")?,
        created_by: row.try_get("created_by")?,
        updated_by: row.try_get("updated_by")?,
    })
}

/// Liest eine optionale RFC3339-Zeitspalte
fn zeit_lesen(
    row: &sqlx::sqlite::SqliteRow,
    spalte: &str,
) -> DbResult<Option<DateTime<Utc>>> {
    let wert: Option<String> = row.try_get(spalte)?;
    wert.as_deref()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DbError::intern(format!("Ungueltige Zeit '{s}' in {spalte}: {e}")))
        })
        .transpose()
}
