//! Domain DTOs for the bin API.
//!
//! # Design
//! Response types are lenient where the service is: titles may be missing or
//! `null`, and `settings` may arrive as an object or as the JSON string the
//! service stores. Both normalise on the way in so callers only ever see the
//! shaped form.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One saved revision of a bin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinSnapshot {
    /// Bin identifier. Removed bins carry a `deleted/` prefix.
    pub url: String,
    pub snapshot: u32,
    #[serde(default, deserialize_with = "falsy_as_empty")]
    pub title: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub pretty_last_updated: String,
}

/// A bin as shown in the list view: its latest snapshot plus every earlier
/// one, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinRecord {
    #[serde(flatten)]
    pub latest: BinSnapshot,
    #[serde(default)]
    pub history: Vec<BinSnapshot>,
}

impl std::ops::Deref for BinRecord {
    type Target = BinSnapshot;

    fn deref(&self) -> &BinSnapshot {
        &self.latest
    }
}

/// Bin settings. `title` is the only field the client interprets; the rest
/// round-trips untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinSettings {
    #[serde(default, deserialize_with = "falsy_as_empty")]
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full content of one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinContent {
    #[serde(default)]
    pub javascript: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default, deserialize_with = "object_or_encoded")]
    pub settings: BinSettings,
    pub last_updated: DateTime<Utc>,
    pub url: String,
    pub snapshot: u32,
}

/// Caller payload for create, save and update.
///
/// `title` is merged into `settings.title`. `url` is only consulted by
/// `save`, which uses it to pick the target bin.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SaveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub javascript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Result of a create, save or update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveResult {
    pub url: String,
    pub snapshot: u32,
    #[serde(default)]
    pub summary: String,
}

/// Result of a remove.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoveResult {
    pub url: String,
    pub snapshot: u32,
    #[serde(default = "deleted_default")]
    pub deleted: bool,
}

fn deleted_default() -> bool {
    true
}

/// Wire body of `POST .../save`. `settings` travels as a JSON string.
#[derive(Debug, Serialize)]
pub(crate) struct SaveBody {
    pub settings: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javascript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// Falsy values (`null`, `false`, `0`, missing) become `""`; other
/// non-strings keep their JSON text.
fn falsy_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        other => other.to_string(),
    })
}

fn object_or_encoded<'de, D>(deserializer: D) -> Result<BinSettings, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(BinSettings::default()),
        Value::String(text) if text.trim().is_empty() => Ok(BinSettings::default()),
        Value::String(text) => serde_json::from_str(&text).map_err(D::Error::custom),
        value => serde_json::from_value(value).map_err(D::Error::custom),
    }
}
