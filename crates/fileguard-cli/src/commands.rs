use anyhow::{Context, Result};
use fileguard_core::schema::{HashResponse, RemoveResponse, TrackResponse, VerifyResponse};
use fileguard_core::{canonicalize, GuardConfig, ScanSummary, Tracker};
use std::path::Path;
use std::process::ExitCode;

use crate::output::Printer;

/// Exit status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 0: done, hash matched, scan clean
    Success,
    /// 1: target file does not exist
    NotFound,
    /// 2: verify mismatch or a scan with any non-OK entry
    Mismatch,
    /// 1: anything else (corrupt baseline, I/O failure)
    Failed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::NotFound | Outcome::Failed => ExitCode::from(1),
            Outcome::Mismatch => ExitCode::from(2),
        }
    }
}

pub fn hash(printer: &Printer, file: &Path) -> Result<Outcome> {
    match fileguard_core::digest(file) {
        Ok(sha256) => {
            printer.hash(&HashResponse::new(file.display().to_string(), sha256))?;
            Ok(Outcome::Success)
        }
        Err(e) if e.is_not_found() => {
            printer.not_found(&e);
            Ok(Outcome::NotFound)
        }
        Err(e) => Err(e).with_context(|| format!("cannot hash {}", file.display())),
    }
}

pub fn verify(printer: &Printer, file: &Path, expected: &str) -> Result<Outcome> {
    match fileguard_core::verify(file, expected) {
        Ok(verification) => {
            let matches = verification.matches;
            printer.verify(file, &VerifyResponse::from(verification))?;
            Ok(if matches {
                Outcome::Success
            } else {
                Outcome::Mismatch
            })
        }
        Err(e) if e.is_not_found() => {
            printer.not_found(&e);
            Ok(Outcome::NotFound)
        }
        Err(e) => Err(e).with_context(|| format!("cannot verify {}", file.display())),
    }
}

pub fn track_add(printer: &Printer, config: &GuardConfig, file: &Path) -> Result<Outcome> {
    let tracker = Tracker::new(config);
    match tracker.add(file) {
        Ok(sha256) => {
            let path = canonicalize(file)?.display().to_string();
            printer.tracked(&TrackResponse { path, sha256 })?;
            Ok(Outcome::Success)
        }
        Err(e) if e.is_not_found() => {
            printer.not_found(&e);
            Ok(Outcome::NotFound)
        }
        Err(e) => Err(e).with_context(|| format!("cannot track {}", file.display())),
    }
}

pub fn track_list(printer: &Printer, config: &GuardConfig, long: bool) -> Result<Outcome> {
    let tracker = Tracker::new(config);
    if long {
        let records = tracker.records().context("cannot read baseline")?;
        printer.list_long(&records)?;
    } else {
        let paths = tracker.list().context("cannot read baseline")?;
        printer.list(&paths)?;
    }
    Ok(Outcome::Success)
}

pub fn track_remove(printer: &Printer, config: &GuardConfig, file: &Path) -> Result<Outcome> {
    let tracker = Tracker::new(config);
    let removed = tracker
        .remove(file)
        .with_context(|| format!("cannot untrack {}", file.display()))?;
    let path = canonicalize(file)?.display().to_string();
    printer.removed(&RemoveResponse { path, removed })?;
    Ok(Outcome::Success)
}

pub fn track_scan(printer: &Printer, config: &GuardConfig) -> Result<Outcome> {
    let tracker = Tracker::new(config);
    let results = tracker.scan().context("scan failed")?;
    let summary = ScanSummary::from_results(&results);
    printer.scan(results, &summary)?;
    Ok(if summary.is_clean() {
        Outcome::Success
    } else {
        Outcome::Mismatch
    })
}

