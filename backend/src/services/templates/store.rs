//! # Template Store
//!
//! Persists named templates in SQLite. Each template is one row holding the whole
//! `Template` as JSON, so a load returns exactly what was saved, field order included.
//!
//! The table keeps a `position` column: the first save of a template appends it, later
//! saves update it in place, and listings follow that order.

use common::model::template::Template;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS templates (
    id       TEXT PRIMARY KEY,
    name     TEXT NOT NULL,
    position INTEGER NOT NULL,
    body     TEXT NOT NULL
)";

/// Shared handle to the template database.
#[derive(Clone)]
pub struct TemplateStore {
    conn: Arc<Mutex<Connection>>,
}

impl TemplateStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(SCHEMA, [])?;
        Ok(TemplateStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Inserts `template`, or replaces the stored template with the same id.
    pub fn save(&self, template: &Template) -> Result<(), StoreError> {
        let body = serde_json::to_string(template)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO templates (id, name, position, body)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), 0) + 1 FROM templates), ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, body = excluded.body",
            params![template.id, template.name, body],
        )?;
        debug!("Saved template {} ('{}')", template.id, template.name);
        Ok(())
    }

    pub fn get(&self, template_id: &str) -> Result<Option<Template>, StoreError> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM templates WHERE id = ?1",
                params![template_id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| serde_json::from_str(&b).map_err(StoreError::from))
            .transpose()
    }

    /// Every stored template, in first-save order.
    pub fn list(&self) -> Result<Vec<Template>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT body FROM templates ORDER BY position")?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(StoreError::from))
            .collect()
    }

    /// Removes a template. Returns whether it existed.
    pub fn delete(&self, template_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM templates WHERE id = ?1", params![template_id])?;
        Ok(removed > 0)
    }
}
