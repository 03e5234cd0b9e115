use crate::bundled;
use crate::error::{ConfradarError, Result};
use crate::storage::{Library, Storage, BUNDLED_CONFERENCES};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A configured origin of raw conference rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SourceDescriptor {
    #[serde(rename = "json")]
    RemoteJson { url: String },
    #[serde(rename = "file-json")]
    LocalJson { path: PathBuf },
}

impl SourceDescriptor {
    /// `http://` and `https://` values are remote, anything else is a path.
    pub fn classify(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            SourceDescriptor::RemoteJson { url: value.to_string() }
        } else {
            SourceDescriptor::LocalJson { path: PathBuf::from(value) }
        }
    }

    /// Last path segment of the URL or file path, lowercased.
    pub fn basename(&self) -> String {
        let location = match self {
            SourceDescriptor::RemoteJson { url } => url.as_str().to_string(),
            SourceDescriptor::LocalJson { path } => path.to_string_lossy().into_owned(),
        };
        location
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::RemoteJson { url } => write!(f, "json {url}"),
            SourceDescriptor::LocalJson { path } => write!(f, "file-json {}", path.display()),
        }
    }
}

/// Retrieves the raw JSON document behind a source.
pub trait SourceFetcher {
    fn fetch(&self, source: &SourceDescriptor) -> Result<Value>;
}

/// Blocking HTTP for remote sources, plain file reads for local ones.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl SourceFetcher for HttpFetcher {
    #[instrument(skip(self), fields(source = %source))]
    fn fetch(&self, source: &SourceDescriptor) -> Result<Value> {
        match source {
            SourceDescriptor::RemoteJson { url } => {
                let resp = self.client.get(url).send()?.error_for_status()?;
                let bytes = resp.bytes()?;
                debug!("Fetched {} bytes", bytes.len());
                Ok(serde_json::from_slice(&bytes)?)
            }
            SourceDescriptor::LocalJson { path } => {
                let bytes = fs::read(path)?;
                Ok(serde_json::from_slice(&bytes)?)
            }
        }
    }
}

/// Accepts a bare array of rows or an object wrapping one under
/// `conferences`.
pub fn extract_rows(document: Value) -> Result<Vec<Value>> {
    match document {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut map) => match map.remove("conferences") {
            Some(Value::Array(rows)) => Ok(rows),
            Some(_) => Err(ConfradarError::Source {
                message: "`conferences` is not an array".to_string(),
            }),
            None => Ok(Vec::new()),
        },
        other => Err(ConfradarError::Source {
            message: format!("expected an array or object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One row of `sources.json`. Rows whose `type` this build cannot fetch are
/// kept verbatim so they survive later writes of the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceEntry {
    Supported(SourceDescriptor),
    Unsupported(Value),
}

impl SourceEntry {
    pub fn descriptor(&self) -> Option<&SourceDescriptor> {
        match self {
            SourceEntry::Supported(source) => Some(source),
            SourceEntry::Unsupported(_) => None,
        }
    }
}

impl From<SourceDescriptor> for SourceEntry {
    fn from(source: SourceDescriptor) -> Self {
        SourceEntry::Supported(source)
    }
}

impl fmt::Display for SourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEntry::Supported(source) => write!(f, "{source}"),
            SourceEntry::Unsupported(row) => {
                let kind = row.get("type").and_then(Value::as_str).unwrap_or("unknown");
                write!(f, "{kind} (unsupported)")
            }
        }
    }
}

/// User-managed, ordered list of sources persisted in `sources.json`.
///
/// Removal is by position, so indices shift after every add or remove;
/// callers should `list` again before removing.
pub struct SourceRegistry<'a, S: Storage> {
    library: &'a Library<S>,
}

impl<'a, S: Storage> SourceRegistry<'a, S> {
    pub fn new(library: &'a Library<S>) -> Self {
        Self { library }
    }

    pub fn list(&self) -> Vec<SourceEntry> {
        self.library.load_source_entries()
    }

    pub fn add(&self, value: &str) -> Result<SourceDescriptor> {
        let source = SourceDescriptor::classify(value);
        let mut entries = self.library.load_source_entries();
        entries.push(source.clone().into());
        self.library.save_source_entries(&entries)?;
        info!("Added source {}", source);
        Ok(source)
    }

    pub fn remove(&self, index: usize) -> Result<SourceEntry> {
        let mut entries = self.library.load_source_entries();
        if index >= entries.len() {
            return Err(ConfradarError::InvalidSourceIndex {
                index,
                len: entries.len(),
            });
        }
        let removed = entries.remove(index);
        self.library.save_source_entries(&entries)?;
        info!("Removed source {}", removed);
        Ok(removed)
    }

    /// Replace the configured list with the curated defaults.
    pub fn reset(&self) -> Result<Vec<SourceDescriptor>> {
        let defaults = bundled::default_sources()?;
        self.library.save_sources(&defaults)?;
        Ok(defaults)
    }

    /// The configured entries, seeding the curated defaults first when the
    /// list is empty.
    pub fn ensure_seeded(&self) -> Vec<SourceEntry> {
        self.ensure_seeded_with(bundled::default_sources())
    }

    /// Seed an empty list with `defaults`; when those are unavailable or
    /// cannot be saved, register the bundled dataset as a single local file.
    pub fn ensure_seeded_with(&self, defaults: Result<Vec<SourceDescriptor>>) -> Vec<SourceEntry> {
        let entries = self.list();
        if !entries.is_empty() {
            return entries;
        }

        let seeded = defaults.and_then(|defaults| {
            self.library.save_sources(&defaults)?;
            Ok(defaults)
        });
        let sources = match seeded {
            Ok(defaults) => defaults,
            Err(e) => {
                warn!("Falling back to bundled dataset as source: {}", e);
                self.bundled_fallback().unwrap_or_else(|e| {
                    warn!("No sources available: {}", e);
                    Vec::new()
                })
            }
        };
        sources.into_iter().map(SourceEntry::from).collect()
    }

    fn bundled_fallback(&self) -> Result<Vec<SourceDescriptor>> {
        let storage = self.library.storage();
        storage.write(BUNDLED_CONFERENCES, bundled::CONFERENCES_JSON.as_bytes())?;
        let path = storage.locate(BUNDLED_CONFERENCES).ok_or_else(|| ConfradarError::Source {
            message: "storage has no filesystem location for the bundled dataset".to_string(),
        })?;
        let sources = vec![SourceDescriptor::LocalJson { path }];
        self.library.save_sources(&sources)?;
        Ok(sources)
    }
}
