//! Team form cache with TTL, file persistence and single-flight refresh

use super::TeamFormRecord;
use crate::telemetry::{increment, set_gauge, CounterMetric, GaugeMetric};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cache file {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// A cached record and when it was fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedForm {
    #[serde(flatten)]
    pub record: TeamFormRecord,
    pub updated_at: DateTime<Utc>,
}

impl CachedForm {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.updated_at < ttl
    }
}

/// Team form records keyed by team id
///
/// Within one run, concurrent lookups of the same team share a single
/// refresh. Fallback records are handed out but never stored.
pub struct FormCache {
    path: Option<PathBuf>,
    ttl: Duration,
    entries: Mutex<HashMap<u32, CachedForm>>,
    inflight: Mutex<HashMap<u32, Arc<OnceCell<TeamFormRecord>>>>,
}

impl FormCache {
    /// Empty cache that is never persisted
    pub fn in_memory(ttl: Duration) -> Self {
        Self::with_entries(None, ttl, HashMap::new())
    }

    /// Cache backed by `path`
    ///
    /// A missing file gives an empty cache. An unreadable or unparsable file
    /// is logged and also gives an empty cache; entries that do not parse
    /// are dropped one by one.
    pub fn load(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => {
                tracing::info!(path = %path.display(), entries = entries.len(), "Loaded form cache");
                entries
            }
            Err(CacheError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No form cache file yet");
                HashMap::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring form cache");
                HashMap::new()
            }
        };
        Self::with_entries(Some(path), ttl, entries)
    }

    fn with_entries(path: Option<PathBuf>, ttl: Duration, entries: HashMap<u32, CachedForm>) -> Self {
        Self {
            path,
            ttl,
            entries: Mutex::new(entries),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Entry regardless of age
    pub async fn get(&self, team_id: u32) -> Option<CachedForm> {
        self.entries.lock().await.get(&team_id).cloned()
    }

    /// Record if present and younger than the TTL
    pub async fn get_fresh(&self, team_id: u32, now: DateTime<Utc>) -> Option<TeamFormRecord> {
        self.entries
            .lock()
            .await
            .get(&team_id)
            .filter(|c| c.is_fresh(now, self.ttl))
            .map(|c| c.record.clone())
    }

    /// Store a freshly fetched record; fallback records are ignored
    pub async fn insert(&self, record: TeamFormRecord, now: DateTime<Utc>) {
        if record.fallback {
            return;
        }
        self.entries.lock().await.insert(
            record.team_id,
            CachedForm {
                record,
                updated_at: now,
            },
        );
    }

    /// Fresh entry, or the result of one shared refresh
    ///
    /// When `refresh` fails the stale entry is returned if there is one,
    /// otherwise the record built by `fallback`. Either way the cache keeps
    /// whatever it had.
    pub async fn get_or_refresh<F, Fut, E, B>(
        &self,
        team_id: u32,
        now: DateTime<Utc>,
        refresh: F,
        fallback: B,
    ) -> TeamFormRecord
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TeamFormRecord, E>>,
        E: std::fmt::Display,
        B: FnOnce() -> TeamFormRecord,
    {
        if let Some(record) = self.get_fresh(team_id, now).await {
            increment(CounterMetric::FormCacheHits);
            return record;
        }

        let cell = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(team_id)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_init(|| async move {
            match refresh().await {
                Ok(record) => {
                    increment(CounterMetric::FormRefreshes);
                    self.insert(record.clone(), now).await;
                    record
                }
                Err(e) => {
                    increment(CounterMetric::FormFallbacks);
                    match self.get(team_id).await {
                        Some(stale) => {
                            tracing::warn!(
                                team_id,
                                updated_at = %stale.updated_at,
                                error = %e,
                                "Form refresh failed, using stale entry"
                            );
                            stale.record
                        }
                        None => {
                            tracing::warn!(team_id, error = %e, "Form refresh failed, using neutral form");
                            fallback()
                        }
                    }
                }
            }
        })
        .await
        .clone()
    }

    /// Persist to the backing file, if any
    pub async fn save(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        self.save_to(path).await
    }

    /// Write all entries to `path` atomically, sorted by team id
    pub async fn save_to(&self, path: &Path) -> Result<(), CacheError> {
        let json = {
            let entries = self.entries.lock().await;
            set_gauge(GaugeMetric::FormCacheEntries, entries.len() as f64);
            let sorted: BTreeMap<u32, &CachedForm> = entries.iter().map(|(k, v)| (*k, v)).collect();
            serde_json::to_string_pretty(&sorted)?
        };

        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;

        tracing::info!(path = %path.display(), "Saved form cache");
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<HashMap<u32, CachedForm>, CacheError> {
    let content = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&content).map_err(|e| CacheError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut entries = HashMap::new();
    for (key, value) in raw {
        let parsed = key
            .parse::<u32>()
            .ok()
            .zip(serde_json::from_value::<CachedForm>(value).ok());
        match parsed {
            Some((team_id, cached)) if !cached.record.fallback => {
                entries.insert(team_id, cached);
            }
            _ => tracing::warn!(key = %key, "Dropping corrupt form cache entry"),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::sample::record;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, 6, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_and_stale_entries() {
        let cache = FormCache::in_memory(Duration::hours(20));
        cache.insert(record(33, "WWDLW", 8, 4), now()).await;

        assert!(cache.get_fresh(33, now() + Duration::hours(19)).await.is_some());
        assert!(cache.get_fresh(33, now() + Duration::hours(20)).await.is_none());
        assert!(cache.get(33).await.is_some());
        assert!(cache.get_fresh(34, now()).await.is_none());
    }

    #[tokio::test]
    async fn test_fallback_records_are_not_stored() {
        let cache = FormCache::in_memory(Duration::hours(20));
        cache
            .insert(TeamFormRecord::fallback(33, None, 39, 2025), now())
            .await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_refresh() {
        let cache = FormCache::in_memory(Duration::hours(20));
        cache.insert(record(33, "WWW", 6, 1), now()).await;
        let got = cache
            .get_or_refresh(
                33,
                now(),
                || async { Err::<TeamFormRecord, String>("should not run".to_string()) },
                || unreachable!(),
            )
            .await;
        assert_eq!(got.form_string(), "WWW");
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_refresh() {
        let cache = FormCache::in_memory(Duration::hours(20));
        let calls = AtomicUsize::new(0);

        let lookup = || {
            cache.get_or_refresh(
                50,
                now(),
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    Ok::<_, String>(record(50, "DDL", 1, 2))
                },
                || TeamFormRecord::fallback(50, None, 39, 2025),
            )
        };
        let (a, b, c) = tokio::join!(lookup(), lookup(), lookup());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_entry() {
        let cache = FormCache::in_memory(Duration::hours(20));
        let fetched_at = now() - Duration::days(3);
        cache.insert(record(33, "LLL", 0, 6), fetched_at).await;

        let got = cache
            .get_or_refresh(
                33,
                now(),
                || async { Err::<TeamFormRecord, String>("HTTP 500".to_string()) },
                || TeamFormRecord::fallback(33, None, 39, 2025),
            )
            .await;
        assert_eq!(got.form_string(), "LLL");
        assert!(!got.fallback);
        assert_eq!(cache.get(33).await.unwrap().updated_at, fetched_at);
    }

    #[tokio::test]
    async fn test_failed_refresh_without_entry_uses_fallback() {
        let cache = FormCache::in_memory(Duration::hours(20));
        let got = cache
            .get_or_refresh(
                77,
                now(),
                || async { Err::<TeamFormRecord, String>("timeout".to_string()) },
                || TeamFormRecord::fallback(77, Some("Wrexham".to_string()), 40, 2025),
            )
            .await;
        assert!(got.fallback);
        assert_eq!(got.window, 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("team_form.json");

        let cache = FormCache::load(&path, Duration::hours(20));
        assert!(cache.is_empty().await);
        cache.insert(record(50, "WDL", 2, 2), now()).await;
        cache.insert(record(33, "WWDLW", 8, 4), now()).await;
        cache.save().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.find("\"33\"").unwrap() < content.find("\"50\"").unwrap());
        assert!(!path.with_extension("json.tmp").exists());

        let reloaded = FormCache::load(&path, Duration::hours(20));
        assert_eq!(reloaded.len().await, 2);
        assert_eq!(
            reloaded.get(33).await.unwrap().record,
            cache.get(33).await.unwrap().record
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_gives_empty_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("team_form.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cache = FormCache::load(&path, Duration::hours(20));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_corrupt_entries_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("team_form.json");

        let good = CachedForm {
            record: record(33, "WD", 3, 1),
            updated_at: now(),
        };
        let content = serde_json::json!({
            "33": good,
            "34": { "team_id": "not a number" },
            "abc": good,
        });
        std::fs::write(&path, content.to_string()).unwrap();

        let cache = FormCache::load(&path, Duration::hours(20));
        assert_eq!(cache.len().await, 1);
        assert!(cache.get_fresh(33, now()).await.is_some());
    }
}
