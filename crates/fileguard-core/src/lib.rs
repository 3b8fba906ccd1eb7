//! File integrity tracking for fileguard.
//!
//! A tracked file is fingerprinted with SHA-256 and recorded in a JSON
//! baseline keyed by its canonical path. Later scans re-hash every tracked
//! file and classify it as OK, Changed, Missing or Error against the
//! recorded fingerprint.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │           CLI / upload boundary              │
//! ├──────────────────────────────────────────────┤
//! │  Tracker (add / remove / list / scan)        │
//! │  ├── BaselineStore (baseline.json)           │
//! │  ├── digest (streaming SHA-256)              │
//! │  └── Clock (wall clock or manual)            │
//! └──────────────────────────────────────────────┘
//! ```

pub mod baseline;
pub mod clock;
pub mod digest;
pub mod error;
pub mod paths;
pub mod schema;
pub mod tracking;

pub use baseline::{Baseline, BaselineStore, FileRecord, GuardConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::{digest, digest_bytes, digest_reader, normalize_hex, verify, Verification};
pub use error::{GuardError, Result};
pub use paths::canonicalize;
pub use tracking::{ScanResult, ScanStatus, ScanSummary, Tracker};
