//! SQLite document store for recipes and reminder subscriptions.
//!
//! Each collection is one table. Ingredients are kept as a JSON array column
//! so order and duplicates survive a round trip. Ids and timestamps are
//! assigned here, never by callers.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use recetario_core::error::{RecetarioError, Result};
use recetario_core::traits::{RecipeStore, ReminderStore};
use recetario_core::types::{NewRecipe, NewReminder, Recipe, Reminder};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Recetario database: both collections in one file.
pub struct RecetarioDb {
    conn: Mutex<Connection>,
}

fn storage_err(context: &str) -> impl Fn(rusqlite::Error) -> RecetarioError + '_ {
    move |e| RecetarioError::Storage(format!("{context}: {e}"))
}

/// Current time at the precision the store keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RecetarioError::Storage(format!("Bad timestamp '{raw}': {e}")))
}

/// Raw recipe columns, converted outside the rusqlite row closure.
struct RecipeRow {
    id: String,
    name: String,
    ingredients_json: String,
    instructions: String,
    prep_time: u32,
    servings: u32,
    created_at: String,
}

impl RecipeRow {
    const COLUMNS: &'static str =
        "id, name, ingredients_json, instructions, prep_time, servings, created_at";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            ingredients_json: row.get(2)?,
            instructions: row.get(3)?,
            prep_time: row.get(4)?,
            servings: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_recipe(self) -> Result<Recipe> {
        Ok(Recipe {
            ingredients: serde_json::from_str(&self.ingredients_json)?,
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            name: self.name,
            instructions: self.instructions,
            prep_time: self.prep_time,
            servings: self.servings,
        })
    }
}

struct ReminderRow {
    id: String,
    name: String,
    email: String,
    frequency: String,
    active: bool,
    created_at: String,
}

impl ReminderRow {
    const COLUMNS: &'static str = "id, name, email, frequency, active, created_at";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            frequency: row.get(3)?,
            active: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_reminder(self) -> Result<Reminder> {
        Ok(Reminder {
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            name: self.name,
            email: self.email,
            frequency: self.frequency,
            active: self.active,
        })
    }
}

impl RecetarioDb {
    /// Open or create the database. `:memory:` gives a throwaway store.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(storage_err("DB open"))?;

        // WAL for concurrent readers; ignored for in-memory databases
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

        let db = Self { conn: Mutex::new(conn) };
        db.migrate()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RecetarioError::Storage(format!("Lock: {e}")))
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS recipes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                ingredients_json TEXT NOT NULL DEFAULT '[]',
                instructions TEXT NOT NULL,
                prep_time INTEGER NOT NULL DEFAULT 0,
                servings INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reminders (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                frequency TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
        ",
        )
        .map_err(storage_err("Migration error"))?;
        Ok(())
    }
}

impl RecipeStore for RecetarioDb {
    fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe> {
        let stored = Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            name: recipe.name.clone(),
            ingredients: recipe.ingredients.clone(),
            instructions: recipe.instructions.clone(),
            prep_time: recipe.prep_time,
            servings: recipe.servings,
            created_at: now(),
        };
        let ingredients_json = serde_json::to_string(&stored.ingredients)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO recipes (id, name, ingredients_json, instructions, prep_time, servings, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                stored.id,
                stored.name,
                ingredients_json,
                stored.instructions,
                stored.prep_time,
                stored.servings,
                timestamp(stored.created_at),
            ],
        )
        .map_err(storage_err("Insert recipe"))?;

        tracing::debug!("💾 Recipe saved: '{}' ({})", stored.name, stored.id);
        Ok(stored)
    }

    fn get_recipe(&self, id: &str) -> Result<Recipe> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM recipes WHERE id = ?1", RecipeRow::COLUMNS),
                params![id],
                RecipeRow::from_row,
            )
            .optional()
            .map_err(storage_err("Get recipe"))?;
        match row {
            Some(row) => row.into_recipe(),
            None => Err(RecetarioError::NotFound(format!("Recipe '{id}'"))),
        }
    }

    fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM recipes ORDER BY created_at DESC, rowid DESC",
                RecipeRow::COLUMNS
            ))
            .map_err(storage_err("List recipes"))?;
        let rows = stmt
            .query_map([], RecipeRow::from_row)
            .map_err(storage_err("List recipes"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_err("List recipes"))?;
        rows.into_iter().map(RecipeRow::into_recipe).collect()
    }
}

impl ReminderStore for RecetarioDb {
    fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder> {
        let stored = Reminder {
            id: uuid::Uuid::new_v4().to_string(),
            name: reminder.name.clone(),
            email: reminder.email.clone(),
            frequency: reminder.frequency.clone(),
            active: reminder.active,
            created_at: now(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO reminders (id, name, email, frequency, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                stored.id,
                stored.name,
                stored.email,
                stored.frequency,
                stored.active,
                timestamp(stored.created_at),
            ],
        )
        .map_err(storage_err("Insert reminder"))?;

        tracing::debug!("💾 Reminder saved: {} ({})", stored.email, stored.frequency);
        Ok(stored)
    }

    fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM reminders ORDER BY created_at DESC, rowid DESC",
                ReminderRow::COLUMNS
            ))
            .map_err(storage_err("List reminders"))?;
        let rows = stmt
            .query_map([], ReminderRow::from_row)
            .map_err(storage_err("List reminders"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_err("List reminders"))?;
        rows.into_iter().map(ReminderRow::into_reminder).collect()
    }

    fn delete_reminder(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM reminders WHERE id = ?1", params![id])
            .map_err(storage_err("Delete reminder"))?;
        if deleted == 0 {
            return Err(RecetarioError::NotFound(format!("Reminder '{id}'")));
        }
        Ok(())
    }
}
