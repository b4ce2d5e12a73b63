//! Food Entry model
//!
//! A meal the user ate, with the ingredients and sensitivity tags extracted
//! for it.

use chrono::{NaiveTime, Timelike};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Meal type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" | "supper" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }

    /// Meal type implied by the local time the meal was eaten
    pub fn from_time(time: NaiveTime) -> Self {
        match time.hour() {
            5..=10 => MealType::Breakfast,
            11..=14 => MealType::Lunch,
            17..=21 => MealType::Dinner,
            _ => MealType::Snack,
        }
    }
}

/// Ingredients as captured: either free text or an ordered list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ingredients {
    List(Vec<String>),
    Text(String),
}

impl Default for Ingredients {
    fn default() -> Self {
        Ingredients::List(Vec::new())
    }
}

impl Ingredients {
    /// Individual ingredient names; free text is split on commas
    pub fn items(&self) -> Vec<String> {
        match self {
            Ingredients::List(items) => items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Ingredients::Text(text) => text
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: i64,
    /// Timestamp the meal was eaten, e.g. "2025-01-09T08:30:00-05:00"
    pub date: String,
    pub food: String,
    pub ingredients: Ingredients,
    #[serde(default)]
    pub sensitivities: Vec<String>,
    pub meal_type: Option<MealType>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a food entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodEntryCreate {
    pub date: String,
    pub food: String,
    pub ingredients: Ingredients,
    pub sensitivities: Vec<String>,
    pub meal_type: Option<MealType>,
    pub description: Option<String>,
}

/// Data for updating a food entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodEntryUpdate {
    pub date: Option<String>,
    pub food: Option<String>,
    pub ingredients: Option<Ingredients>,
    pub sensitivities: Option<Vec<String>>,
    pub meal_type: Option<MealType>,
    pub description: Option<String>,
}

impl FoodEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let id: i64 = row.get("id")?;
        let ingredients_raw: String = row.get("ingredients")?;
        let sensitivities_raw: String = row.get("sensitivities")?;
        let meal_type: Option<String> = row.get("meal_type")?;

        let ingredients = serde_json::from_str(&ingredients_raw)
            .unwrap_or(Ingredients::Text(ingredients_raw));

        let sensitivities = match serde_json::from_str::<Vec<String>>(&sensitivities_raw) {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!(id, error = %e, "Undecodable sensitivities on food entry, treating as empty");
                Vec::new()
            }
        };

        Ok(Self {
            id,
            date: row.get("date")?,
            food: row.get("food")?,
            ingredients,
            sensitivities,
            meal_type: meal_type.as_deref().and_then(MealType::from_str),
            description: row.get("description")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Create a new food entry
    pub fn create(conn: &Connection, data: &FoodEntryCreate) -> DbResult<Self> {
        if data.food.trim().is_empty() {
            return Err(DbError::Invalid("food name must not be empty".to_string()));
        }

        conn.execute(
            r#"
            INSERT INTO food_entries (date, food, ingredients, sensitivities, meal_type, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                data.date,
                data.food.trim(),
                serde_json::to_string(&data.ingredients)?,
                serde_json::to_string(&data.sensitivities)?,
                data.meal_type.map(|m| m.as_str()),
                data.description,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound)
    }

    /// Get a food entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List every food entry in insertion order
    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_entries ORDER BY id")?;

        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM food_entries", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Update a food entry
    pub fn update(conn: &Connection, id: i64, data: &FoodEntryUpdate) -> DbResult<Option<Self>> {
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
        if let Some(ref food) = data.food {
            if food.trim().is_empty() {
                return Err(DbError::Invalid("food name must not be empty".to_string()));
            }
            updates.push(format!("food = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(food.trim().to_string()));
        }
        if let Some(ref ingredients) = data.ingredients {
            updates.push(format!("ingredients = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(serde_json::to_string(ingredients)?));
        }
        if let Some(ref sensitivities) = data.sensitivities {
            updates.push(format!("sensitivities = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(serde_json::to_string(sensitivities)?));
        }
        if let Some(meal_type) = data.meal_type {
            updates.push(format!("meal_type = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(meal_type.as_str().to_string()));
        }
        if let Some(ref description) = data.description {
            updates.push(format!("description = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(description.clone()));
        }

        if updates.is_empty() {
            return Ok(Some(entry));
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE food_entries SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a food entry
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM food_entries WHERE id = ?1", [id])?;
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

    fn oatmeal() -> FoodEntryCreate {
        FoodEntryCreate {
            date: "2025-01-09T08:30:00-05:00".to_string(),
            food: "Oatmeal with milk".to_string(),
            ingredients: Ingredients::List(vec!["oats".to_string(), "milk".to_string()]),
            sensitivities: vec!["dairy".to_string(), "gluten".to_string()],
            meal_type: None,
            description: Some("bowl of oatmeal".to_string()),
        }
    }

    #[test]
    fn test_meal_type_from_time() {
        let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(MealType::from_time(at(7, 15)), MealType::Breakfast);
        assert_eq!(MealType::from_time(at(12, 0)), MealType::Lunch);
        assert_eq!(MealType::from_time(at(15, 30)), MealType::Snack);
        assert_eq!(MealType::from_time(at(19, 45)), MealType::Dinner);
        assert_eq!(MealType::from_time(at(23, 10)), MealType::Snack);
        assert_eq!(MealType::from_time(at(4, 59)), MealType::Snack);
    }

    #[test]
    fn test_ingredients_untagged() {
        let list: Ingredients = serde_json::from_str(r#"["rice", " beans "]"#).unwrap();
        assert_eq!(list.items(), vec!["rice", "beans"]);

        let text: Ingredients = serde_json::from_str(r#""rice, beans,, salsa""#).unwrap();
        assert_eq!(text.items(), vec!["rice", "beans", "salsa"]);
        assert!(Ingredients::default().is_empty());
    }

    #[test]
    fn test_create_and_get() {
        let conn = conn();
        let entry = FoodEntry::create(&conn, &oatmeal()).unwrap();
        assert_eq!(entry.food, "Oatmeal with milk");
        assert_eq!(entry.sensitivities, vec!["dairy", "gluten"]);
        assert_eq!(entry.meal_type, None);

        let fetched = FoodEntry::get_by_id(&conn, entry.id).unwrap().unwrap();
        assert_eq!(fetched.ingredients, entry.ingredients);
        assert!(FoodEntry::get_by_id(&conn, entry.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let conn = conn();
        let mut data = oatmeal();
        data.food = "   ".to_string();
        assert!(matches!(FoodEntry::create(&conn, &data), Err(DbError::Invalid(_))));
    }

    #[test]
    fn test_update_and_delete() {
        let conn = conn();
        let entry = FoodEntry::create(&conn, &oatmeal()).unwrap();

        let updated = FoodEntry::update(
            &conn,
            entry.id,
            &FoodEntryUpdate {
                sensitivities: Some(vec!["gluten".to_string()]),
                meal_type: Some(MealType::Snack),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.sensitivities, vec!["gluten"]);
        assert_eq!(updated.meal_type, Some(MealType::Snack));
        assert_eq!(updated.food, entry.food);

        assert!(FoodEntry::delete(&conn, entry.id).unwrap());
        assert!(!FoodEntry::delete(&conn, entry.id).unwrap());
        assert_eq!(FoodEntry::count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_undecodable_sensitivities_read_as_empty() {
        let conn = conn();
        conn.execute(
            "INSERT INTO food_entries (date, food, ingredients, sensitivities) VALUES ('2025-01-09', 'Toast', 'bread, butter', 'dairy')",
            [],
        )
        .unwrap();

        let entries = FoodEntry::list_all(&conn).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].sensitivities.is_empty());
        assert_eq!(entries[0].ingredients.items(), vec!["bread", "butter"]);
    }
}
