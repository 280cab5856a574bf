use rusqlite::Connection;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DB_FILE: &str = "coldmail.sqlite";

#[derive(Debug, Error)]
pub enum DbError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("serde error: {0}")]
  Serde(#[from] serde_json::Error),
  #[error("lock poisoned")]
  Poisoned,
}

/// `COLDMAIL_DB` if set, otherwise `coldmail.sqlite` in the working directory.
pub fn default_path() -> PathBuf {
  std::env::var("COLDMAIL_DB")
    .ok()
    .filter(|p| !p.trim().is_empty())
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

pub fn connect(path: &Path) -> Result<Connection, DbError> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)?;
  }
  let conn = Connection::open(path)?;
  Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<(), DbError> {
  // Apply migrations in order. Each uses IF NOT EXISTS for idempotency.
  let init_sql = include_str!("../migrations/001_init.sql");
  conn.execute_batch(init_sql)?;
  let settings_sql = include_str!("../migrations/002_settings.sql");
  conn.execute_batch(settings_sql)?;
  Ok(())
}

pub fn open(path: &Path) -> Result<Connection, DbError> {
  let conn = connect(path)?;
  init_db(&conn)?;
  Ok(conn)
}

pub fn open_in_memory() -> Result<Connection, DbError> {
  let conn = Connection::open_in_memory()?;
  init_db(&conn)?;
  Ok(conn)
}

// needed for .optional()
pub trait OptionalRow<T> {
  fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalRow<T> for Result<T, rusqlite::Error> {
  fn optional(self) -> Result<Option<T>, rusqlite::Error> {
    match self {
      Ok(v) => Ok(Some(v)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(e),
    }
  }
}
