use fileguard_core::GuardConfig;
use std::ffi::OsString;
use std::path::PathBuf;

pub const DEFAULT_BASELINE_FILE: &str = "baseline.json";
pub const BASELINE_ENV: &str = "FILEGUARD_BASELINE";

/// `--baseline`, then `$FILEGUARD_BASELINE`, then `./baseline.json`.
pub fn resolve(flag: Option<PathBuf>) -> GuardConfig {
    resolve_with(flag, std::env::var_os(BASELINE_ENV))
}

fn resolve_with(flag: Option<PathBuf>, env: Option<OsString>) -> GuardConfig {
    let path = flag
        .or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BASELINE_FILE));
    GuardConfig::new(path)
}
