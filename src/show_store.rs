use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{ShowDetails, ShowReference};

/// Cache of fetched show details, keyed by show name.
pub struct ShowStore {
    conn: Connection,
}

impl ShowStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        let store = Self { conn };
        store.migrate()?;
        log::info!("Connected to database {}", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS shows (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    start_date TEXT NOT NULL,
                    run_time TEXT NOT NULL,
                    synopsis TEXT NOT NULL,
                    poster BLOB NOT NULL
                );
                "#,
            )
            .context("failed to create shows table")?;
        Ok(())
    }

    /// Stores `details`, replacing any row cached under the same name.
    pub fn insert(&self, details: &ShowDetails) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO shows (name, start_date, run_time, synopsis, poster)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(name) DO UPDATE SET
                    start_date = excluded.start_date,
                    run_time = excluded.run_time,
                    synopsis = excluded.synopsis,
                    poster = excluded.poster
                "#,
                params![
                    details.name,
                    details.start_date,
                    details.run_time,
                    details.synopsis,
                    details.poster
                ],
            )
            .with_context(|| format!("failed to insert {} into the database", details.name))?;
        log::info!("Inserted {} into the database.", details.name);
        Ok(())
    }

    /// Cached details for `show`. The url is taken from the reference, not
    /// the table.
    pub fn select(&self, show: &ShowReference) -> Result<Option<ShowDetails>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, start_date, run_time, synopsis, poster FROM shows WHERE name = ?1",
        )?;
        let details = stmt
            .query_row(params![show.name], |row| {
                Ok(ShowDetails {
                    name: row.get(0)?,
                    start_date: row.get(1)?,
                    run_time: row.get(2)?,
                    synopsis: row.get(3)?,
                    poster: row.get(4)?,
                    url: show.url.clone(),
                })
            })
            .optional()?;
        Ok(details)
    }
}
