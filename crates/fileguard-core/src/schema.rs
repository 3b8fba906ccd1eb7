//! Response shapes shared by every outer surface (CLI `--json`, upload
//! handlers).

use serde::{Deserialize, Serialize};

use crate::digest::Verification;
use crate::tracking::{ScanResult, ScanStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashResponse {
    pub filename: String,
    pub sha256: String,
}

impl HashResponse {
    pub fn new(filename: impl Into<String>, sha256: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            sha256: sha256.into(),
        }
    }

    /// Digest an uploaded buffer.
    pub fn from_upload(filename: impl Into<String>, contents: &[u8]) -> Self {
        Self::new(filename, crate::digest::digest_bytes(contents))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(rename = "match")]
    pub matches: bool,
    pub expected: String,
    pub actual: String,
}

impl From<Verification> for VerifyResponse {
    fn from(v: Verification) -> Self {
        Self {
            matches: v.matches,
            expected: v.expected,
            actual: v.actual,
        }
    }
}

/// Body of a track or untrack request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRequest {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackResponse {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub path: String,
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanItem {
    pub path: String,
    pub status: ScanStatus,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub message: Option<String>,
}

impl From<ScanResult> for ScanItem {
    fn from(r: ScanResult) -> Self {
        Self {
            path: r.path,
            status: r.status,
            expected: Some(r.expected),
            actual: r.actual,
            message: r.message,
        }
    }
}
