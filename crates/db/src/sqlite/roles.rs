//! SQLite-Implementierung des RoleRepository

use chrono::{DateTime, Utc};
use sqlx::Row as _;

use pfoertner_core::RollenId;

use crate::error::{DbError, DbResult};
use crate::models::RolleRecord;
use crate::repository::RoleRepository;
use crate::sqlite::pool::SqliteDb;

impl RoleRepository for SqliteDb {
    async fn list_all(&self) -> DbResult<Vec<RolleRecord>> {
        let rows = sqlx::query("SELECT id, name, is_default, created_at FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_rolle).collect()
    }

    async fn get_by_ids(&self, ids: &[RollenId]) -> DbResult<Vec<RolleRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let platzhalter = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, name, is_default, created_at FROM roles WHERE id IN ({platzhalter}) ORDER BY id"
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.inner());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_rolle).collect()
    }

    async fn get_default(&self) -> DbResult<Option<RolleRecord>> {
        let row = sqlx::query(
            "SELECT id, name, is_default, created_at FROM roles WHERE is_default = 1 LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_rolle(&r)).transpose()
    }
}

fn row_to_rolle(row: &sqlx::sqlite::SqliteRow) -> DbResult<RolleRecord> {
    let created_at_str: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige created_at '{created_at_str}': {e}")))?;

    let is_default: i64 = row.try_get("is_default")?;

    Ok(RolleRecord {
        id: RollenId(row.try_get("id")?),
        name: row.try_get("name")?,
        ist_standard: is_default != 0,
        created_at,
    })
}
