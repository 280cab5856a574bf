use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type ID = String;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("{0} must not be empty")]
  EmptyField(&'static str),
  #[error("Unknown platform '{0}'. Expected one of: linkedin, email, upwork, instagram")]
  UnknownPlatform(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Linkedin,
  Email,
  Upwork,
  Instagram,
}

impl Platform {
  pub const ALL: [Platform; 4] = [Platform::Linkedin, Platform::Email, Platform::Upwork, Platform::Instagram];

  pub fn as_str(&self) -> &'static str {
    match self {
      Platform::Linkedin => "linkedin",
      Platform::Email => "email",
      Platform::Upwork => "upwork",
      Platform::Instagram => "instagram",
    }
  }

  /// Register used in tone labels and in the prompt.
  pub fn tone_base(&self) -> &'static str {
    match self {
      Platform::Linkedin | Platform::Upwork => "Professional",
      Platform::Email => "Formal",
      Platform::Instagram => "Casual",
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Platform {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "linkedin" => Ok(Platform::Linkedin),
      "email" => Ok(Platform::Email),
      "upwork" => Ok(Platform::Upwork),
      "instagram" => Ok(Platform::Instagram),
      _ => Err(ValidationError::UnknownPlatform(s.to_string())),
    }
  }
}

/// Rhetorical framing. Messages always come as a triple in `Strategy::ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  Direct,
  ValueFirst,
  QuestionBased,
}

impl Strategy {
  pub const ORDER: [Strategy; 3] = [Strategy::Direct, Strategy::ValueFirst, Strategy::QuestionBased];

  pub fn label(&self) -> &'static str {
    match self {
      Strategy::Direct => "Direct",
      Strategy::ValueFirst => "Value-First",
      Strategy::QuestionBased => "Question-Based",
    }
  }

  pub fn tone_for(&self, platform: Platform) -> String {
    format!("{} - {}", platform.tone_base(), self.label())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
  pub niche: String,
  pub platform: Platform,
  pub offer: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_name: Option<String>,
}

impl GenerationRequest {
  /// Builds a request from raw form input. Empty client names count as absent.
  pub fn parse(niche: &str, platform: &str, offer: &str, client_name: Option<&str>) -> Result<Self, ValidationError> {
    let request = GenerationRequest {
      niche: niche.trim().to_string(),
      platform: platform.parse()?,
      offer: offer.trim().to_string(),
      client_name: client_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string),
    };
    request.validate()?;
    Ok(request)
  }

  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.niche.trim().is_empty() {
      return Err(ValidationError::EmptyField("niche"));
    }
    if self.offer.trim().is_empty() {
      return Err(ValidationError::EmptyField("offer"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMessage {
  pub content: String,
  pub tone: String,
}

/// A history entry before the store assigns `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryRecord {
  pub content: String,
  pub platform: String,
  pub tone: String,
  pub niche: String,
  pub client_name: Option<String>,
}

impl NewHistoryRecord {
  pub fn from_selection(request: &GenerationRequest, message: &GeneratedMessage) -> Self {
    NewHistoryRecord {
      content: message.content.clone(),
      platform: request.platform.as_str().to_string(),
      tone: message.tone.clone(),
      niche: request.niche.clone(),
      client_name: request.client_name.clone(),
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
  pub id: ID,
  pub content: String,
  pub platform: String,
  pub tone: String,
  pub timestamp: i64,
  pub niche: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
  pub total: usize,
  pub by_platform: std::collections::BTreeMap<String, usize>,
  pub by_niche: std::collections::BTreeMap<String, usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SettingsKV {
  pub key: String,
  pub value: String,
  pub updated_at: String,
}

/// Creation-time id: base-36 millis followed by 9 random base-36 chars.
pub fn new_id() -> ID {
  let millis = now_millis().max(0) as u128;
  let random = Uuid::new_v4().as_u128();
  let mut suffix = to_base36(random);
  suffix.truncate(9);
  format!("{}{}", to_base36(millis), suffix)
}

pub fn now_millis() -> i64 {
  (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn now_iso() -> String {
  let t = time::OffsetDateTime::now_utc();
  t.format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn to_base36(mut n: u128) -> String {
  const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
  if n == 0 {
    return "0".to_string();
  }
  let mut out = Vec::new();
  while n > 0 {
    out.push(DIGITS[(n % 36) as usize]);
    n /= 36;
  }
  out.reverse();
  String::from_utf8(out).unwrap_or_default()
}
