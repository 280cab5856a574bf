use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::{self, AppConfig};
use crate::db;
use crate::history::{HistoryStore, SqliteBackend};
use crate::llm::GeminiClient;
use crate::models::*;
use crate::workflows::MessageGenerator;

/// Entry points for the presentation layer.
pub struct Commands {
  generator: MessageGenerator,
  history: HistoryStore,
  settings: Mutex<Connection>,
}

impl Commands {
  pub fn new(generator: MessageGenerator, history: HistoryStore, settings: Connection) -> Self {
    Self { generator, history, settings: Mutex::new(settings) }
  }

  /// Wires the Gemini client and SQLite-backed history from one database file.
  pub fn open(db_path: &Path) -> Result<Self, String> {
    let settings = db::open(db_path).map_err(|e| e.to_string())?;
    let app_config = AppConfig::load(&settings).map_err(|e| e.to_string())?;
    let client = GeminiClient::new(app_config.llm, app_config.api_key).map_err(|e| e.to_string())?;
    let backend = SqliteBackend::open(db_path).map_err(|e| e.to_string())?;

    Ok(Self::new(
      MessageGenerator::new(Arc::new(client)),
      HistoryStore::new(Arc::new(backend)),
      settings,
    ))
  }

  pub async fn generate(
    &self,
    niche: &str,
    platform: &str,
    offer: &str,
    client_name: Option<&str>,
  ) -> Result<(GenerationRequest, Vec<GeneratedMessage>), String> {
    let request = GenerationRequest::parse(niche, platform, offer, client_name).map_err(|e| e.to_string())?;
    let messages = self.generate_request(&request).await?;
    Ok((request, messages))
  }

  pub async fn generate_request(&self, request: &GenerationRequest) -> Result<Vec<GeneratedMessage>, String> {
    self.generator.generate(request).await.map_err(|e| e.to_string())
  }

  /// Saves one of the generated messages along with the form it came from.
  pub fn save(&self, request: &GenerationRequest, message: &GeneratedMessage) -> Option<HistoryRecord> {
    self.history.save(NewHistoryRecord::from_selection(request, message))
  }

  pub fn history(&self) -> Vec<HistoryRecord> {
    self.history.load()
  }

  pub fn delete_from_history(&self, id: &str) {
    self.history.delete(id)
  }

  pub fn clear_history(&self) {
    self.history.clear()
  }

  pub fn search_and_filter(&self, term: &str, platform_filter: &str) -> Vec<HistoryRecord> {
    self.history.search_and_filter(term, platform_filter)
  }

  pub fn export_history(&self) -> String {
    self.history.export()
  }

  pub fn history_stats(&self) -> HistoryStats {
    self.history.stats()
  }

  // Settings commands
  pub fn get_settings(&self) -> Result<Vec<SettingsKV>, String> {
    let conn = self.settings.lock().map_err(|e| e.to_string())?;
    config::get_settings(&conn).map_err(|e| e.to_string())
  }

  pub fn get_setting(&self, key: &str) -> Result<Option<String>, String> {
    let conn = self.settings.lock().map_err(|e| e.to_string())?;
    config::get_setting(&conn, key).map_err(|e| e.to_string())
  }

  pub fn set_setting(&self, key: &str, value: &str) -> Result<(), String> {
    let conn = self.settings.lock().map_err(|e| e.to_string())?;
    config::set_setting(&conn, key, value).map_err(|e| e.to_string())
  }
}
