//! Persisted baseline of tracked files.
//!
//! The baseline is a single JSON object mapping canonical path to
//! [`FileRecord`]. It is always read and written whole: every mutation is a
//! load-modify-save of the full document, and saves go through a temporary
//! file in the same directory followed by a rename.
//!
//! No locking is performed. Two processes saving the same document race and
//! the last rename wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{GuardError, Result};

/// Where the baseline lives. Callers decide the location; the core never
/// assumes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    pub baseline_path: PathBuf,
}

impl GuardConfig {
    pub fn new(baseline_path: impl Into<PathBuf>) -> Self {
        Self {
            baseline_path: baseline_path.into(),
        }
    }
}

/// Tracking metadata for one file.
///
/// Fields are declared in the order they appear on disk (sorted keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(rename = "SHA256")]
    pub digest: String,
    /// Set on first add, never rewritten
    #[serde(with = "timestamp")]
    pub added_at: DateTime<Utc>,
    /// Set by scans only
    #[serde(default, with = "timestamp::optional")]
    pub last_verified_at: Option<DateTime<Utc>>,
    /// Refreshed on every add
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Canonical path -> record. Iteration is in ascending path order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Baseline {
    records: BTreeMap<String, FileRecord>,
}

impl Baseline {
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn insert(&mut self, path: String, record: FileRecord) -> Option<FileRecord> {
        self.records.insert(path, record)
    }

    pub fn remove(&mut self, path: &str) -> Option<FileRecord> {
        self.records.remove(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRecord)> {
        self.records.iter().map(|(path, record)| (path.as_str(), record))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FileRecord)> {
        self.records
            .iter_mut()
            .map(|(path, record)| (path.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads and writes the baseline document at a fixed path.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            path: config.baseline_path.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the baseline, or an empty one if the document does not exist yet.
    pub fn load(&self) -> Result<Baseline> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no baseline yet, starting empty");
                return Ok(Baseline::default());
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(GuardError::corrupt(&self.path, "not valid UTF-8"));
            }
            Err(e) => return Err(GuardError::read(&self.path, e)),
        };

        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| GuardError::corrupt(&self.path, format!("invalid JSON: {e}")))?;
        if !value.is_object() {
            return Err(GuardError::corrupt(
                &self.path,
                format!("top level is {}, expected an object", json_kind(&value)),
            ));
        }
        let baseline: Baseline = serde_json::from_value(value)
            .map_err(|e| GuardError::corrupt(&self.path, e.to_string()))?;

        debug!(path = %self.path.display(), entries = baseline.len(), "baseline loaded");
        Ok(baseline)
    }

    /// Replace the persisted document with `baseline`.
    pub fn save(&self, baseline: &Baseline) -> Result<()> {
        let mut json = serde_json::to_string_pretty(baseline)?;
        json.push('\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| GuardError::write(dir, e))?;

        let mut staging = NamedTempFile::new_in(dir).map_err(|e| GuardError::write(dir, e))?;
        staging
            .write_all(json.as_bytes())
            .and_then(|_| staging.as_file().sync_all())
            .map_err(|e| GuardError::write(staging.path(), e))?;
        staging
            .persist(&self.path)
            .map_err(|e| GuardError::write(&self.path, e.error))?;

        debug!(path = %self.path.display(), entries = baseline.len(), "baseline saved");
        Ok(())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// RFC 3339 with whole seconds and an explicit `+00:00` offset.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    pub fn parse<E: de::Error>(raw: &str) -> Result<DateTime<Utc>, E> {
        DateTime::parse_from_rfc3339(raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|e| E::custom(format!("bad timestamp {raw:?}: {e}")))
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
    }

    pub mod optional {
        use super::*;

        pub fn serialize<S: Serializer>(
            at: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match at {
                Some(at) => serializer.serialize_str(&format(at)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw).map(Some),
                None => Ok(None),
            }
        }
    }
}
