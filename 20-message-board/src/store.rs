//! JSON-file store mapping receipt timestamps to entries.
//!
//! Every upsert reads the whole file, inserts one entry and rewrites the
//! whole file, so each write costs O(store size). That is fine for a
//! message board; it is the first thing to change if volume grows.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::PathBuf,
};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::warn;

use crate::entry::EntryBody;

pub type Entries = BTreeMap<String, EntryBody>;

/// Owns the backing file. Not `Clone`: whoever holds it is the single writer.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the full mapping.
    ///
    /// A missing file is an empty store. So is a file that does not parse:
    /// the corrupt contents are discarded and overwritten by the next save.
    pub async fn load(&self) -> Result<Entries> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read store {}", self.path.display()));
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(entries) => Ok(entries),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "store is not valid JSON, treating as empty");
                Ok(Entries::new())
            }
        }
    }

    /// Replaces the file contents with `entries`.
    pub async fn save(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let encoded = serde_json::to_vec_pretty(entries).context("failed to encode store")?;
        // Write beside the target and rename so a crash never leaves a half-written store.
        let staging = self.staging_path();
        fs::write(&staging, encoded)
            .await
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// Inserts or overwrites the entry at `timestamp`, then persists everything.
    pub async fn upsert(&self, timestamp: String, body: EntryBody) -> Result<()> {
        let mut entries = self.load().await?;
        entries.insert(timestamp, body);
        self.save(&entries).await
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
