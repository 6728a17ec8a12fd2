//! Flat-JSON persistence for ledger snapshots.
//!
//! The on-disk shape is the minimal one: a JSON object mapping user
//! identifier to an array of course identifiers. Writes go through a temp
//! file + rename so a crash mid-save never leaves a torn snapshot; reads
//! treat a missing file as an empty ledger so first boot needs no setup step.

mod atomic_write;

use std::path::{Path, PathBuf};

use anyhow::Context;
use rollcall_core::{Ledger, LedgerSnapshot};
use tracing::{debug, warn};

pub use atomic_write::WriteOptions;

/// Persists ledger snapshots to a single JSON file.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    options: WriteOptions,
}

impl LedgerStore {
    /// A store backed by `path` with default durability options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: WriteOptions::default(),
        }
    }

    /// Override the write durability knobs.
    #[must_use]
    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize the ledger's snapshot and write it atomically.
    ///
    /// The snapshot is taken under the ledger's read lock; serialization and
    /// IO happen outside it, so a slow disk never blocks enrollments.
    pub fn save(&self, ledger: &Ledger) -> anyhow::Result<()> {
        let snapshot = ledger.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)?;
        atomic_write::atomic_write(&self.path, json.as_bytes(), self.options)
            .with_context(|| format!("Failed to write ledger to {}", self.path.display()))?;
        debug!(path = %self.path.display(), users = snapshot.0.len(), "ledger saved");
        Ok(())
    }

    /// Load a ledger, tolerating absent or unreadable state.
    ///
    /// A missing file is a fresh install and loads empty. A file that exists
    /// but fails to read or parse also loads empty, with a warning; callers
    /// that would rather fail than drop enrollments use [`Self::load_strict`].
    #[must_use]
    pub fn load(&self) -> Ledger {
        if !self.path.exists() {
            return Ledger::new();
        }
        match self.load_strict() {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to load ledger, starting empty: {e:#}");
                Ledger::new()
            }
        }
    }

    /// Load a ledger, propagating read and parse errors. A missing file still
    /// loads empty.
    pub fn load_strict(&self) -> anyhow::Result<Ledger> {
        if !self.path.exists() {
            return Ok(Ledger::new());
        }
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read ledger from {}", self.path.display()))?;
        let snapshot: LedgerSnapshot = serde_json::from_str(&json)
            .with_context(|| format!("Malformed ledger snapshot at {}", self.path.display()))?;
        Ok(Ledger::from_snapshot(snapshot))
    }

    /// Delete the backing file. Used by the application's system-reset path;
    /// a missing file is already reset.
    pub fn reset(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "ledger file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove ledger file {}", self.path.display())
            }),
        }
    }
}
