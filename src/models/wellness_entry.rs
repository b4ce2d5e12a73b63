//! Wellness Entry model
//!
//! A self-reported check-in of stomach comfort and energy.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{EnergyLevel, StomachRating};

/// A wellness check-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellnessEntry {
    pub id: i64,
    pub date: String,
    pub stomach: StomachRating,
    pub energy: EnergyLevel,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a wellness entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellnessEntryCreate {
    pub date: String,
    pub stomach: StomachRating,
    pub energy: EnergyLevel,
    pub notes: Option<String>,
}

/// Data for updating a wellness entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WellnessEntryUpdate {
    pub date: Option<String>,
    pub stomach: Option<StomachRating>,
    pub energy: Option<EnergyLevel>,
    pub notes: Option<String>,
}

fn invalid_column(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unknown rating: {}", value).into(),
    )
}

impl WellnessEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let stomach: String = row.get("stomach")?;
        let energy: String = row.get("energy")?;

        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            stomach: StomachRating::from_str(&stomach).ok_or_else(|| invalid_column(2, &stomach))?,
            energy: EnergyLevel::from_str(&energy).ok_or_else(|| invalid_column(3, &energy))?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Create a new wellness entry
    pub fn create(conn: &Connection, data: &WellnessEntryCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO wellness_entries (date, stomach, energy, notes)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![data.date, data.stomach.as_str(), data.energy.as_str(), data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound)
    }

    /// Get a wellness entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM wellness_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List every wellness entry in insertion order
    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM wellness_entries ORDER BY id")?;

        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM wellness_entries", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Update a wellness entry
    pub fn update(conn: &Connection, id: i64, data: &WellnessEntryUpdate) -> DbResult<Option<Self>> {
        let entry = match Self::get_by_id(conn, id)? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref date) = data.date {
            updates.push(format!("date = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(date.clone()));
        }
        if let Some(stomach) = data.stomach {
            updates.push(format!("stomach = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(stomach.as_str().to_string()));
        }
        if let Some(energy) = data.energy {
            updates.push(format!("energy = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(energy.as_str().to_string()));
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if updates.is_empty() {
            return Ok(Some(entry));
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE wellness_entries SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a wellness entry
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM wellness_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_update_delete() {
        let conn = conn();
        let entry = WellnessEntry::create(
            &conn,
            &WellnessEntryCreate {
                date: "2025-01-09T21:00:00Z".to_string(),
                stomach: StomachRating::Poor,
                energy: EnergyLevel::Low,
                notes: None,
            },
        )
        .unwrap();
        assert_eq!(entry.stomach, StomachRating::Poor);

        let updated = WellnessEntry::update(
            &conn,
            entry.id,
            &WellnessEntryUpdate {
                stomach: Some(StomachRating::Good),
                notes: Some("better after walk".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.stomach, StomachRating::Good);
        assert_eq!(updated.energy, EnergyLevel::Low);
        assert_eq!(updated.notes.as_deref(), Some("better after walk"));

        assert_eq!(WellnessEntry::list_all(&conn).unwrap().len(), 1);
        assert!(WellnessEntry::delete(&conn, entry.id).unwrap());
        assert_eq!(WellnessEntry::count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_update_missing_returns_none() {
        let conn = conn();
        let result = WellnessEntry::update(&conn, 42, &WellnessEntryUpdate::default()).unwrap();
        assert!(result.is_none());
    }
}
