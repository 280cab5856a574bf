use rusqlite::Connection;
use std::collections::HashMap;

use crate::db::{DbError, OptionalRow};
use crate::llm::types::{LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::models::{now_iso, SettingsKV};

pub const API_KEY_ENV: &str = "COLDMAIL_API_KEY";
pub const MODEL_ENV: &str = "COLDMAIL_MODEL";
pub const BASE_URL_ENV: &str = "COLDMAIL_BASE_URL";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub llm: LlmConfig,
    /// Empty when unset. The remote call then fails fast and templates are used.
    pub api_key: String,
}

impl AppConfig {
    pub fn load(conn: &Connection) -> Result<Self, DbError> {
        let settings = get_all_settings(conn)?;
        Ok(Self::resolve(&settings, |name| std::env::var(name).ok()))
    }

    /// Settings win over environment, environment wins over defaults.
    pub fn resolve(settings: &HashMap<String, String>, env: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str, env_name: &str| -> Option<String> {
            settings
                .get(key)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| env(env_name).filter(|v| !v.trim().is_empty()))
        };

        let llm = LlmConfig {
            base_url: lookup("base_url", BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup("model", MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_secs: settings
                .get("timeout_secs")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Self {
            llm,
            api_key: lookup("api_key", API_KEY_ENV).unwrap_or_default(),
        }
    }
}

pub fn get_all_settings(conn: &Connection) -> Result<HashMap<String, String>, DbError> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
    let rows = stmt.query_map([], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;

    let mut settings = HashMap::new();
    for row in rows {
        let (k, v) = row?;
        settings.insert(k, v);
    }
    Ok(settings)
}

pub fn get_settings(conn: &Connection) -> Result<Vec<SettingsKV>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT key, value, updated_at FROM settings ORDER BY key"
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(SettingsKV {
            key: r.get(0)?,
            value: r.get(1)?,
            updated_at: r.get(2)?,
        })
    })?;

    let mut out = vec![];
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>, DbError> {
    let result: Option<String> = conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        [key],
        |r| r.get(0)
    ).optional()?;
    Ok(result)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<(), DbError> {
    let updated_at = now_iso();
    conn.execute(
        "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
        (key, value, &updated_at)
    )?;
    Ok(())
}
