use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use fileguard_core::schema::{
    HashResponse, RemoveResponse, ScanItem, TrackResponse, VerifyResponse,
};
use fileguard_core::{Baseline, GuardError, ScanResult, ScanStatus, ScanSummary};
use serde::Serialize;
use std::path::Path;

/// Renders command results as text or JSON on stdout.
pub struct Printer {
    json: bool,
}

#[derive(Serialize)]
struct ScanReport {
    results: Vec<ScanItem>,
    summary: ScanSummary,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn not_found(&self, err: &GuardError) {
        eprintln!("error: {err}");
    }

    pub fn hash(&self, response: &HashResponse) -> Result<()> {
        if self.json {
            return self.emit(response);
        }
        println!("File: {}", response.filename);
        println!("SHA-256: {}", response.sha256);
        Ok(())
    }

    pub fn verify(&self, file: &Path, response: &VerifyResponse) -> Result<()> {
        if self.json {
            return self.emit(response);
        }
        if response.matches {
            println!("OK: {} matches", file.display());
        } else {
            println!("MISMATCH: {}", file.display());
            println!("  expected: {}", response.expected);
            println!("  actual:   {}", response.actual);
        }
        Ok(())
    }

    pub fn tracked(&self, response: &TrackResponse) -> Result<()> {
        if self.json {
            return self.emit(response);
        }
        println!("Tracking: {}", response.path);
        println!("SHA-256: {}", response.sha256);
        Ok(())
    }

    pub fn removed(&self, response: &RemoveResponse) -> Result<()> {
        if self.json {
            return self.emit(response);
        }
        if response.removed {
            println!("Removed: {}", response.path);
        } else {
            println!("Not tracked: {}", response.path);
        }
        Ok(())
    }

    pub fn list(&self, paths: &[String]) -> Result<()> {
        if self.json {
            return self.emit(&paths);
        }
        if paths.is_empty() {
            println!("No files tracked.");
        }
        for path in paths {
            println!("{path}");
        }
        Ok(())
    }

    pub fn list_long(&self, records: &Baseline) -> Result<()> {
        if self.json {
            return self.emit(records);
        }
        if records.is_empty() {
            println!("No files tracked.");
        }
        for (path, record) in records.iter() {
            println!("{path}");
            println!("  sha256:        {}", record.digest);
            println!("  added:         {}", timestamp(&record.added_at));
            println!("  updated:       {}", timestamp(&record.updated_at));
            println!(
                "  last verified: {}",
                record
                    .last_verified_at
                    .as_ref()
                    .map(timestamp)
                    .unwrap_or_else(|| "never".to_string())
            );
        }
        Ok(())
    }

    pub fn scan(&self, results: Vec<ScanResult>, summary: &ScanSummary) -> Result<()> {
        if self.json {
            return self.emit(&ScanReport {
                results: results.into_iter().map(ScanItem::from).collect(),
                summary: *summary,
            });
        }
        if results.is_empty() {
            println!("No files tracked.");
            return Ok(());
        }
        for result in &results {
            println!("{:<8} {}", result.status, result.path);
            match result.status {
                ScanStatus::Ok | ScanStatus::Missing => {}
                ScanStatus::Changed => {
                    println!("  expected: {}", result.expected);
                    println!("  actual:   {}", result.actual.as_deref().unwrap_or("-"));
                }
                ScanStatus::Error => {
                    println!("  error: {}", result.message.as_deref().unwrap_or("unknown"));
                }
            }
        }
        println!(
            "{} checked: {} OK, {} changed, {} missing, {} error",
            summary.total(),
            summary.ok,
            summary.changed,
            summary.missing,
            summary.error
        );
        Ok(())
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}
