//! Add / remove / list / scan over the baseline.
//!
//! Each operation is one load-modify-save cycle against the
//! [`BaselineStore`]. Nothing is cached between calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use tracing::{info, warn};

use crate::baseline::{Baseline, BaselineStore, FileRecord, GuardConfig};
use crate::clock::{Clock, SystemClock};
use crate::digest::digest;
use crate::error::{GuardError, Result};
use crate::paths::canonicalize;

/// Classification of one tracked file during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanStatus {
    #[serde(rename = "OK")]
    Ok,
    Changed,
    Missing,
    Error,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Changed => "Changed",
            Self::Missing => "Missing",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub path: String,
    pub status: ScanStatus,
    pub expected: String,
    /// Absent for Missing and Error
    pub actual: Option<String>,
    /// Present only for Error
    pub message: Option<String>,
}

impl ScanResult {
    fn compared(path: &str, expected: &str, actual: String) -> Self {
        let status = if actual == expected {
            ScanStatus::Ok
        } else {
            ScanStatus::Changed
        };
        Self {
            path: path.to_string(),
            status,
            expected: expected.to_string(),
            actual: Some(actual),
            message: None,
        }
    }

    fn missing(path: &str, expected: &str) -> Self {
        Self {
            path: path.to_string(),
            status: ScanStatus::Missing,
            expected: expected.to_string(),
            actual: None,
            message: None,
        }
    }

    fn error(path: &str, expected: &str, message: String) -> Self {
        Self {
            path: path.to_string(),
            status: ScanStatus::Error,
            expected: expected.to_string(),
            actual: None,
            message: Some(message),
        }
    }
}

/// Per-status counts for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub ok: usize,
    pub changed: usize,
    pub missing: usize,
    pub error: usize,
}

impl ScanSummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.status {
                ScanStatus::Ok => summary.ok += 1,
                ScanStatus::Changed => summary.changed += 1,
                ScanStatus::Missing => summary.missing += 1,
                ScanStatus::Error => summary.error += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.ok + self.changed + self.missing + self.error
    }

    /// True when every scanned file was OK (or nothing was tracked).
    pub fn is_clean(&self) -> bool {
        self.total() == self.ok
    }
}

/// Tracking service over one baseline document.
pub struct Tracker<C: Clock = SystemClock> {
    store: BaselineStore,
    clock: C,
}

impl Tracker<SystemClock> {
    pub fn new(config: &GuardConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Tracker<C> {
    pub fn with_clock(config: &GuardConfig, clock: C) -> Self {
        Self {
            store: BaselineStore::new(config),
            clock,
        }
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Start tracking `path`, or re-baseline it if already tracked.
    ///
    /// Returns the recorded digest. On `NotFound` the baseline is untouched.
    pub fn add(&self, path: impl AsRef<Path>) -> Result<String> {
        let canonical = canonicalize(path)?;
        let key = key_of(&canonical)?;
        let digest = digest(&canonical)?;

        let mut baseline = self.store.load()?;
        let now = self.clock.now();
        let prior = baseline.get(&key);
        let record = FileRecord {
            digest: digest.clone(),
            added_at: prior.map(|r| r.added_at).unwrap_or(now),
            last_verified_at: prior.and_then(|r| r.last_verified_at),
            updated_at: now,
        };
        let replaced = baseline.insert(key.clone(), record).is_some();
        self.store.save(&baseline)?;

        if replaced {
            info!(path = %key, sha256 = %digest, "baseline refreshed");
        } else {
            info!(path = %key, sha256 = %digest, "now tracking");
        }
        Ok(digest)
    }

    /// Stop tracking `path`. Returns false if it was not tracked.
    pub fn remove(&self, path: impl AsRef<Path>) -> Result<bool> {
        let key = key_of(&canonicalize(path)?)?;
        let mut baseline = self.store.load()?;
        if baseline.remove(&key).is_none() {
            info!(path = %key, "not tracked, nothing to remove");
            return Ok(false);
        }
        self.store.save(&baseline)?;
        info!(path = %key, "no longer tracking");
        Ok(true)
    }

    /// Tracked canonical paths in ascending order.
    pub fn list(&self) -> Result<Vec<String>> {
        let baseline = self.store.load()?;
        Ok(baseline.paths().map(str::to_string).collect())
    }

    /// Record for `path`, if tracked.
    pub fn get(&self, path: impl AsRef<Path>) -> Result<Option<FileRecord>> {
        let key = key_of(&canonicalize(path)?)?;
        let baseline = self.store.load()?;
        Ok(baseline.get(&key).cloned())
    }

    /// Every record keyed by its stored path, from a single load.
    pub fn records(&self) -> Result<Baseline> {
        self.store.load()
    }

    /// Re-hash every tracked file and compare against the baseline.
    ///
    /// Every record gets the same `last_verified_at`, taken once before the
    /// first file is read. Recorded digests are never changed here; the
    /// baseline is saved once at the end.
    pub fn scan(&self) -> Result<Vec<ScanResult>> {
        let mut baseline = self.store.load()?;
        let verified_at = self.clock.now();

        let mut results = Vec::with_capacity(baseline.len());
        for (path, record) in baseline.iter_mut() {
            let result = classify(path, &record.digest);
            match result.status {
                ScanStatus::Ok => {}
                ScanStatus::Changed => warn!(
                    path,
                    expected = %result.expected,
                    actual = result.actual.as_deref().unwrap_or_default(),
                    "content changed"
                ),
                ScanStatus::Missing => warn!(path, "tracked file is missing"),
                ScanStatus::Error => warn!(
                    path,
                    error = result.message.as_deref().unwrap_or_default(),
                    "could not verify"
                ),
            }
            record.last_verified_at = Some(verified_at);
            results.push(result);
        }
        self.store.save(&baseline)?;

        let summary = ScanSummary::from_results(&results);
        info!(
            total = summary.total(),
            ok = summary.ok,
            changed = summary.changed,
            missing = summary.missing,
            error = summary.error,
            "scan complete"
        );
        Ok(results)
    }
}

/// Baseline key for a canonical path. Only UTF-8 paths round-trip.
fn key_of(canonical: &Path) -> Result<String> {
    canonical
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| GuardError::non_utf8(canonical))
}

fn classify(path: &str, expected: &str) -> ScanResult {
    let file = Path::new(path);
    match file.try_exists() {
        Ok(true) => {}
        Ok(false) => return ScanResult::missing(path, expected),
        // A path component that became a regular file
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return ScanResult::missing(path, expected)
        }
        Err(e) => return ScanResult::error(path, expected, GuardError::read(file, e).to_string()),
    }

    match digest(file) {
        Ok(actual) => ScanResult::compared(path, expected, actual),
        // Deleted between the existence check and the read
        Err(e) if e.is_not_found() && !file.exists() => ScanResult::missing(path, expected),
        Err(e) if e.is_not_found() => {
            ScanResult::error(path, expected, format!("not a regular file: {path}"))
        }
        Err(e) => ScanResult::error(path, expected, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::digest::digest_bytes;
    use chrono::{Duration, TimeZone, Utc};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, Tracker<ManualClock>) {
        let dir = tempdir().unwrap();
        let config = GuardConfig::new(dir.path().join("baseline.json"));
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
        (dir, Tracker::with_clock(&config, clock))
    }

    fn key(path: &Path) -> String {
        canonicalize(path).unwrap().display().to_string()
    }

    #[test]
    fn add_records_digest_and_timestamps() {
        let (dir, tracker) = setup();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"abc").unwrap();

        let digest = tracker.add(&file).unwrap();
        assert_eq!(digest, digest_bytes(b"abc"));

        let record = tracker.get(&file).unwrap().unwrap();
        assert_eq!(record.digest, digest);
        assert_eq!(record.added_at, record.updated_at);
        assert_eq!(record.last_verified_at, None);
    }

    #[test]
    fn re_adding_keeps_added_at_and_advances_updated_at() {
        let (dir, tracker) = setup();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"same").unwrap();

        let first = tracker.add(&file).unwrap();
        let before = tracker.get(&file).unwrap().unwrap();

        tracker.clock.advance(Duration::seconds(30));
        let second = tracker.add(&file).unwrap();
        let after = tracker.get(&file).unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(after.added_at, before.added_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[test]
    fn re_adding_keeps_last_verified_at() {
        let (dir, tracker) = setup();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"v1").unwrap();
        tracker.add(&file).unwrap();
        tracker.scan().unwrap();
        let verified = tracker.get(&file).unwrap().unwrap().last_verified_at;
        assert!(verified.is_some());

        tracker.clock.advance(Duration::minutes(5));
        fs::write(&file, b"v2").unwrap();
        tracker.add(&file).unwrap();
        assert_eq!(tracker.get(&file).unwrap().unwrap().last_verified_at, verified);
    }

    #[test]
    fn add_missing_file_leaves_baseline_alone() {
        let (dir, tracker) = setup();
        let err = tracker.add(dir.path().join("nope.txt")).unwrap_err();
        assert!(err.is_not_found());
        assert!(!tracker.store().path().exists());
    }

    #[test]
    fn remove_reports_whether_tracked() {
        let (dir, tracker) = setup();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"x").unwrap();
        tracker.add(&file).unwrap();

        assert!(tracker.remove(&file).unwrap());
        assert!(tracker.list().unwrap().is_empty());
        assert!(!tracker.remove(&file).unwrap());
    }

    #[test]
    fn remove_works_after_file_is_deleted() {
        let (dir, tracker) = setup();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"x").unwrap();
        tracker.add(&file).unwrap();
        fs::remove_file(&file).unwrap();

        assert!(tracker.remove(&file).unwrap());
    }

    #[test]
    fn list_is_sorted() {
        let (dir, tracker) = setup();
        for name in ["c.txt", "a.txt", "b.txt"] {
            let file = dir.path().join(name);
            fs::write(&file, name).unwrap();
            tracker.add(&file).unwrap();
        }

        let listed = tracker.list().unwrap();
        let mut sorted = listed.clone();
        sorted.sort();
        assert_eq!(listed, sorted);
        assert_eq!(listed.len(), 3);
    }

    #[test]
    fn scan_classifies_each_file() {
        let (dir, tracker) = setup();
        let same = dir.path().join("same.txt");
        let edited = dir.path().join("edited.txt");
        let deleted = dir.path().join("deleted.txt");
        for file in [&same, &edited, &deleted] {
            fs::write(file, b"original").unwrap();
            tracker.add(file).unwrap();
        }
        fs::write(&edited, b"altered").unwrap();
        fs::remove_file(&deleted).unwrap();

        let results = tracker.scan().unwrap();
        let status_of = |path: &Path| {
            let key = key(path);
            results.iter().find(|r| r.path == key).unwrap().clone()
        };

        let ok = status_of(&same);
        assert_eq!(ok.status, ScanStatus::Ok);
        assert_eq!(ok.actual.as_deref(), Some(ok.expected.as_str()));

        let changed = status_of(&edited);
        assert_eq!(changed.status, ScanStatus::Changed);
        assert_eq!(changed.actual.as_deref(), Some(digest_bytes(b"altered").as_str()));
        assert_eq!(changed.expected, digest_bytes(b"original"));

        let missing = status_of(&deleted);
        assert_eq!(missing.status, ScanStatus::Missing);
        assert_eq!(missing.actual, None);
        assert_eq!(missing.message, None);
    }

    #[test]
    fn scan_reports_unreadable_entries_and_continues() {
        let (dir, tracker) = setup();
        let file = dir.path().join("a.txt");
        let other = dir.path().join("b.txt");
        fs::write(&file, b"x").unwrap();
        fs::write(&other, b"y").unwrap();
        tracker.add(&file).unwrap();
        tracker.add(&other).unwrap();

        fs::remove_file(&file).unwrap();
        fs::create_dir(&file).unwrap();

        let results = tracker.scan().unwrap();
        assert_eq!(results.len(), 2);
        let broken = results.iter().find(|r| r.path == key(&file)).unwrap();
        assert_eq!(broken.status, ScanStatus::Error);
        assert!(broken.message.as_deref().unwrap().contains("not a regular file"));
        assert_eq!(broken.actual, None);

        let fine = results.iter().find(|r| r.path == key(&other)).unwrap();
        assert_eq!(fine.status, ScanStatus::Ok);
    }

    #[test]
    fn scan_treats_replaced_parent_directory_as_missing() {
        let (dir, tracker) = setup();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let file = sub.join("a.txt");
        fs::write(&file, b"x").unwrap();
        tracker.add(&file).unwrap();
        let tracked_key = key(&file);

        fs::remove_dir_all(&sub).unwrap();
        fs::write(&sub, b"now a file").unwrap();

        let results = tracker.scan().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, tracked_key);
        assert_eq!(results[0].status, ScanStatus::Missing);
        assert_eq!(results[0].message, None);
    }

    #[cfg(unix)]
    #[test]
    fn scan_reports_permission_denied_and_continues() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, tracker) = setup();
        let locked = dir.path().join("locked.txt");
        let open = dir.path().join("open.txt");
        fs::write(&locked, b"secret").unwrap();
        fs::write(&open, b"public").unwrap();
        tracker.add(&locked).unwrap();
        tracker.add(&open).unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::File::open(&locked).is_ok() {
            // Running as root: mode bits do not block reads.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
            return;
        }

        tracker.clock.advance(Duration::minutes(1));
        let scan_time = tracker.clock.now();
        let results = tracker.scan().unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(results.len(), 2);
        let denied = results.iter().find(|r| r.path == key(&locked)).unwrap();
        assert_eq!(denied.status, ScanStatus::Error);
        assert_eq!(denied.actual, None);
        assert_eq!(denied.expected, digest_bytes(b"secret"));
        assert!(denied.message.as_deref().unwrap().contains("Permission denied"));

        let readable = results.iter().find(|r| r.path == key(&open)).unwrap();
        assert_eq!(readable.status, ScanStatus::Ok);

        let stamped = tracker.get(&locked).unwrap().unwrap();
        assert_eq!(stamped.last_verified_at, Some(scan_time));
        assert_eq!(stamped.digest, digest_bytes(b"secret"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_are_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (dir, tracker) = setup();
        let file = dir.path().join(OsStr::from_bytes(b"caf\xe9.txt"));
        if fs::write(&file, b"x").is_err() {
            // Filesystem refuses non-UTF-8 names.
            return;
        }

        let err = tracker.add(&file).unwrap_err();
        assert!(matches!(err, GuardError::NonUtf8Path { .. }));
        assert!(!tracker.store().path().exists());
        assert!(matches!(
            tracker.get(&file).unwrap_err(),
            GuardError::NonUtf8Path { .. }
        ));
        assert!(matches!(
            tracker.remove(&file).unwrap_err(),
            GuardError::NonUtf8Path { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn records_keep_entries_whose_path_became_a_symlink() {
        let (dir, tracker) = setup();
        let file = dir.path().join("a.txt");
        let target = dir.path().join("b.txt");
        fs::write(&file, b"a").unwrap();
        fs::write(&target, b"b").unwrap();
        tracker.add(&file).unwrap();
        let tracked_key = key(&file);

        fs::remove_file(&file).unwrap();
        std::os::unix::fs::symlink(&target, &file).unwrap();

        let records = tracker.records().unwrap();
        assert_eq!(records.len(), 1);
        let record = records.get(&tracked_key).unwrap();
        assert_eq!(record.digest, digest_bytes(b"a"));
    }

    #[test]
    fn scan_stamps_every_record_with_one_time_and_keeps_digests() {
        let (dir, tracker) = setup();
        let kept = dir.path().join("kept.txt");
        let edited = dir.path().join("edited.txt");
        let deleted = dir.path().join("deleted.txt");
        for file in [&kept, &edited, &deleted] {
            fs::write(file, b"original").unwrap();
            tracker.add(file).unwrap();
        }
        fs::write(&edited, b"altered").unwrap();
        fs::remove_file(&deleted).unwrap();

        tracker.clock.advance(Duration::hours(1));
        let scan_time = tracker.clock.now();
        tracker.scan().unwrap();

        let baseline = tracker.store().load().unwrap();
        assert_eq!(baseline.len(), 3);
        for (_, record) in baseline.iter() {
            assert_eq!(record.last_verified_at, Some(scan_time));
            assert_eq!(record.digest, digest_bytes(b"original"));
        }
    }

    #[test]
    fn empty_baseline_scans_to_nothing() {
        let (_dir, tracker) = setup();
        assert!(tracker.scan().unwrap().is_empty());
        assert!(tracker.list().unwrap().is_empty());
    }

    #[test]
    fn summary_counts_statuses() {
        let result = |status| ScanResult {
            path: "/x".into(),
            status,
            expected: "e".into(),
            actual: None,
            message: None,
        };
        let results = vec![
            result(ScanStatus::Ok),
            result(ScanStatus::Ok),
            result(ScanStatus::Changed),
            result(ScanStatus::Error),
        ];
        let summary = ScanSummary::from_results(&results);
        assert_eq!(summary.ok, 2);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.error, 1);
        assert_eq!(summary.total(), 4);
        assert!(!summary.is_clean());
        assert!(ScanSummary::default().is_clean());
    }

    #[test]
    fn status_serializes_with_display_names() {
        assert_eq!(serde_json::to_string(&ScanStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(serde_json::to_string(&ScanStatus::Missing).unwrap(), "\"Missing\"");
        assert_eq!(ScanStatus::Changed.to_string(), "Changed");
        assert_eq!(format!("{:<8}|", ScanStatus::Ok), "OK      |");
    }
}
