use crate::error::{ConfradarError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Canonical conference record shared by every data source.
///
/// Dates are kept as the ISO-8601 strings they arrived with so that
/// persisted documents round-trip byte-for-byte; use [`Conference::start_dt`]
/// and [`Conference::end_dt`] for calendar comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub url: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Deduplication key: lowercase name plus the exact date strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

impl Conference {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            name: self.name.to_lowercase(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }

    pub fn start_dt(&self) -> Result<NaiveDate> {
        parse_iso_date(&self.start_date)
    }

    pub fn end_dt(&self) -> Result<NaiveDate> {
        parse_iso_date(&self.end_date)
    }

    /// `YYYY-MM-DD → YYYY-MM-DD`, falling back to the raw strings when a
    /// date does not parse.
    pub fn date_range(&self) -> String {
        let start = self
            .start_dt()
            .map(|d| d.to_string())
            .unwrap_or_else(|_| self.start_date.clone());
        let end = self
            .end_dt()
            .map(|d| d.to_string())
            .unwrap_or_else(|_| self.end_date.clone());
        format!("{start} → {end}")
    }

    pub fn location(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }

    pub fn topics_label(&self) -> String {
        self.topics.join(", ")
    }
}

/// Parse an ISO-8601 calendar date. Full timestamps are accepted and
/// truncated to their date component.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|err| {
            DateTime::parse_from_rfc3339(trimmed)
                .map(|dt| dt.date_naive())
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date())
                })
                .map_err(|_| err)
        })
        .map_err(|source| ConfradarError::InvalidDate {
            value: value.to_string(),
            source,
        })
}

/// Favourite conferences, tracked by exact name.
///
/// Two conferences that share a name but not their dates cannot be told
/// apart once starred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StarSet(BTreeSet<String>);

impl StarSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns `true` if the name was not already starred.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    /// Returns `true` if the name was starred.
    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name)
    }

    /// Flip the star on `name`; returns whether it is starred afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.0.remove(name) {
            false
        } else {
            self.0.insert(name.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for StarSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.date_range())
    }
}
