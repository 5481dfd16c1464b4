use crate::errors::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("schema.sql");

#[derive(Debug)]
pub struct CacheDb {
    conn: Mutex<Connection>,
}

impl CacheDb {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Persistence(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn read_slot(&self, name: &str) -> AppResult<Option<serde_json::Value>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("cache db mutex poisoned".to_string()))?;
        let raw: Option<String> = conn
            .query_row("SELECT value_json FROM slots WHERE name = ?1", [name], |row| row.get(0))
            .optional()?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text).map_err(|err| {
                AppError::Persistence(format!("slot {} holds unreadable json: {}", name, err))
            })?)),
            None => Ok(None),
        }
    }

    pub fn write_slot(&self, name: &str, value: &serde_json::Value) -> AppResult<()> {
        let payload = serde_json::to_string(value)?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("cache db mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO slots (name, value_json, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
            params![name, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
