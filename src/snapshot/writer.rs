//! Atomic snapshot persistence

use super::Snapshot;
use std::path::PathBuf;
use thiserror::Error;

pub const CALENDAR_FILE: &str = "calendar_7d.json";
pub const DAILY_FILE: &str = "radar_day.json";
pub const WEEKLY_FILE: &str = "radar_week.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("snapshot I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the three documents into one directory
///
/// All documents are serialized and staged as temp files before any of them
/// replaces a previous output, so a failure while staging leaves the last
/// complete snapshot in place.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Serialized documents with their target file names
    pub fn render(snapshot: &Snapshot) -> Result<Vec<(&'static str, String)>, SnapshotError> {
        Ok(vec![
            (CALENDAR_FILE, serde_json::to_string_pretty(&snapshot.calendar)?),
            (DAILY_FILE, serde_json::to_string_pretty(&snapshot.daily)?),
            (WEEKLY_FILE, serde_json::to_string_pretty(&snapshot.weekly)?),
        ])
    }

    /// Write all documents; returns the final paths
    pub fn write(&self, snapshot: &Snapshot) -> Result<Vec<PathBuf>, SnapshotError> {
        let rendered = Self::render(snapshot)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut staged = Vec::with_capacity(rendered.len());
        for (name, json) in rendered {
            let target = self.dir.join(name);
            let tmp = target.with_extension("json.tmp");
            if let Err(source) = std::fs::write(&tmp, json) {
                discard(&staged);
                let _ = std::fs::remove_file(&tmp);
                return Err(SnapshotError::Io { path: tmp, source });
            }
            staged.push((tmp, target));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (tmp, target) in staged {
            std::fs::rename(&tmp, &target).map_err(|source| SnapshotError::Io {
                path: target.clone(),
                source,
            })?;
            tracing::debug!(path = %target.display(), "Wrote snapshot document");
            written.push(target);
        }

        tracing::info!(dir = %self.dir.display(), files = written.len(), "Snapshot written");
        Ok(written)
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = std::fs::remove_file(tmp);
    }
}
