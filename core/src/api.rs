//! Stateless HTTP request builder and response parser for the bin API.
//!
//! # Design
//! `BinApi` holds only an immutable `ClientConfig` and carries no mutable
//! state between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The round-trip itself happens elsewhere (`BinClient`, or
//! the host), so everything here is deterministic.
//!
//! Every response goes through one validation step before any shaping: an
//! embedded truthy `error` field becomes `BinError::Service`, whatever the
//! HTTP status.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{BinError, TransportError};
use crate::http::{find_header, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{BinContent, BinRecord, BinSnapshot, RemoveResult, SaveBody, SaveRequest, SaveResult};

/// URL prefix the service gives bins that have been removed.
pub const TOMBSTONE_PREFIX: &str = "deleted/";

const CONTENT_TYPE: &str = "content-type";
const AUTHORIZATION: &str = "authorization";

/// Synchronous, stateless request builder and response parser.
#[derive(Debug, Clone)]
pub struct BinApi {
    config: ClientConfig,
    base_url: String,
}

impl Default for BinApi {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl BinApi {
    pub fn new(config: ClientConfig) -> Self {
        let base_url = config.endpoint.trim_end_matches('/').to_string();
        Self { config, base_url }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Headers sent with every request.
    ///
    /// Caller headers from the config come first and win over the default
    /// `content-type`. A configured token always replaces any caller-supplied
    /// `authorization`.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .config
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();

        if find_header(&headers, CONTENT_TYPE).is_none() {
            headers.push((CONTENT_TYPE.to_string(), "application/json".to_string()));
        }

        if let Some(token) = self.config.token.as_deref().filter(|t| !t.is_empty()) {
            headers.retain(|(name, _)| name != AUTHORIZATION);
            headers.push((AUTHORIZATION.to_string(), format!("token {token}")));
        }

        headers
    }

    pub fn build_list(&self) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/", self.base_url), None)
    }

    pub fn build_read(&self, bin_id: &str, snapshot: Option<u32>) -> Result<HttpRequest, BinError> {
        let url = self.bin_url(bin_id, snapshot)?;
        Ok(self.request(HttpMethod::Get, url, None))
    }

    /// Always creates a new bin; `data.url` is ignored.
    pub fn build_create(&self, data: &SaveRequest) -> Result<HttpRequest, BinError> {
        self.build_save_to(None, data)
    }

    /// Saves a new snapshot of `data.url` when set, otherwise creates a bin.
    pub fn build_save(&self, data: &SaveRequest) -> Result<HttpRequest, BinError> {
        let target = data.url.as_deref().filter(|url| !url.is_empty());
        self.build_save_to(target, data)
    }

    /// Saves a new snapshot of `bin_id`; `data.url` is ignored.
    pub fn build_update(&self, bin_id: &str, data: &SaveRequest) -> Result<HttpRequest, BinError> {
        self.build_save_to(Some(bin_id), data)
    }

    pub fn build_remove(&self, bin_id: &str, snapshot: Option<u32>) -> Result<HttpRequest, BinError> {
        let url = self.bin_url(bin_id, snapshot)?;
        Ok(self.request(HttpMethod::Delete, url, None))
    }

    /// Drops tombstoned bins and folds each entry's older snapshots into
    /// `history`. Order of surviving entries is preserved.
    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<BinRecord>, BinError> {
        let status = response.status;
        let entries: Vec<Vec<Value>> = decode(response)?;
        shape_list(entries).map_err(|e| {
            TransportError::Decode {
                status,
                message: e.to_string(),
            }
            .into()
        })
    }

    pub fn parse_read(&self, response: HttpResponse) -> Result<BinContent, BinError> {
        decode(response)
    }

    pub fn parse_save(&self, response: HttpResponse) -> Result<SaveResult, BinError> {
        decode(response)
    }

    pub fn parse_remove(&self, response: HttpResponse) -> Result<RemoveResult, BinError> {
        decode(response)
    }

    fn build_save_to(&self, target: Option<&str>, data: &SaveRequest) -> Result<HttpRequest, BinError> {
        let url = match target {
            Some(bin_id) => format!("{}/{}/save", self.base_url, checked_bin_id(bin_id)?),
            None => format!("{}/save", self.base_url),
        };

        let mut settings = data.settings.clone().unwrap_or_default();
        if let Some(title) = data.title.as_deref().filter(|t| !t.is_empty()) {
            settings.insert("title".to_string(), Value::String(title.to_string()));
        }

        let body = SaveBody {
            settings: serde_json::to_string(&settings).map_err(|e| TransportError::Encode(e.to_string()))?,
            javascript: non_empty(&data.javascript),
            css: non_empty(&data.css),
            html: non_empty(&data.html),
        };
        let body = serde_json::to_string(&body).map_err(|e| TransportError::Encode(e.to_string()))?;

        Ok(self.request(HttpMethod::Post, url, Some(body)))
    }

    fn bin_url(&self, bin_id: &str, snapshot: Option<u32>) -> Result<String, BinError> {
        let bin_id = checked_bin_id(bin_id)?;
        Ok(match snapshot {
            Some(snapshot) => format!("{}/{bin_id}/{snapshot}", self.base_url),
            None => format!("{}/{bin_id}", self.base_url),
        })
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: self.headers(),
            body,
        }
    }
}

/// Collapse raw list entries into records.
///
/// Tombstoned and empty entries are dropped on the raw JSON, looking only at
/// the latest snapshot's `url`, so their other fields are never decoded.
pub fn shape_list(entries: Vec<Vec<Value>>) -> Result<Vec<BinRecord>, serde_json::Error> {
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(latest) = entry.first() else {
            debug!("skipping list entry with no snapshots");
            continue;
        };
        let url = latest.get("url").and_then(Value::as_str).unwrap_or_default();
        if url.starts_with(TOMBSTONE_PREFIX) {
            debug!(%url, "skipping removed bin");
            continue;
        }

        let mut snapshots = entry.into_iter().map(serde_json::from_value::<BinSnapshot>);
        let Some(latest) = snapshots.next() else {
            continue;
        };
        records.push(BinRecord {
            latest: latest?,
            history: snapshots.collect::<Result<_, _>>()?,
        });
    }
    Ok(records)
}

fn checked_bin_id(bin_id: &str) -> Result<&str, BinError> {
    if bin_id.is_empty() || bin_id.contains('/') {
        return Err(BinError::InvalidBinId(bin_id.to_string()));
    }
    Ok(bin_id)
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field.clone().filter(|value| !value.is_empty())
}

/// Validate the envelope, then deserialize into the operation's type.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, BinError> {
    let status = response.status;
    let value = match serde_json::from_str::<Value>(&response.body) {
        Ok(value) => value,
        Err(_) if !response.is_success() => {
            return Err(TransportError::Status {
                status,
                body: response.body,
            }
            .into())
        }
        Err(e) => {
            return Err(TransportError::Decode {
                status,
                message: e.to_string(),
            }
            .into())
        }
    };

    check_service_error(&value)?;

    if !response.is_success() {
        return Err(TransportError::Status {
            status,
            body: response.body,
        }
        .into());
    }

    serde_json::from_value(value).map_err(|e| {
        TransportError::Decode {
            status,
            message: e.to_string(),
        }
        .into()
    })
}

fn check_service_error(value: &Value) -> Result<(), BinError> {
    let Some(error) = value.get("error").filter(|e| is_truthy(e)) else {
        return Ok(());
    };
    let message = match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    };
    warn!(%message, "service returned an error");
    Err(BinError::Service(message))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
