//! Durable snapshot of the last committed state.
//!
//! One JSON document at a configured path. Reads happen once at startup;
//! writes replace the whole document via a sibling temp file and a rename so
//! a crash mid-write leaves either the old or the new record, never a torn
//! one.

use anyhow::{Context, Result};
use gsw_schemas::PersistedState;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read the persisted record. A missing file is `Ok(None)`, not an error.
    pub fn load(&self) -> Result<Option<PersistedState>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read state failed: {}", self.path.display()))
            }
        };

        let state: PersistedState = serde_json::from_str(&raw)
            .with_context(|| format!("parse state failed: {}", self.path.display()))?;
        Ok(Some(state))
    }

    /// Startup read: absent or unreadable state is a fresh empty start.
    pub fn load_or_default(&self) -> PersistedState {
        match self.load() {
            Ok(Some(state)) => {
                debug!(path = %self.path.display(), "state loaded");
                state
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "no state file; fresh start");
                PersistedState::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %format!("{e:#}"), "state unreadable; fresh start");
                PersistedState::default()
            }
        }
    }

    /// Overwrite the record atomically.
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create state dir failed: {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(state).context("serialize state failed")?;
        let tmp = self.tmp_path();
        fs::write(&tmp, format!("{json}\n"))
            .with_context(|| format!("write state failed: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace state failed: {}", self.path.display()))?;
        Ok(())
    }
}
