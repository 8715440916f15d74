use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<u64>,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by.as_secs();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedResponse {
    url: String,
    body: String,
    expires_at: u64,
}

/// Response cache keyed by the full request URL.
///
/// Entries live in memory and, when a directory is configured, in one JSON
/// file per URL so the cache survives process restarts.
pub struct ResponseCache {
    ttl: Duration,
    directory: Option<PathBuf>,
    memory: Mutex<HashMap<String, CachedResponse>>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, directory: Option<PathBuf>) -> Self {
        Self::with_clock(ttl, directory, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, directory: Option<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            directory,
            memory: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub async fn get(&self, url: &str) -> Option<String> {
        let now = self.clock.now();

        if let Some(entry) = self.memory_get(url) {
            if now < entry.expires_at {
                debug!("Cache hit (memory) for {}", url);
                return Some(entry.body);
            }
            debug!("Cache entry expired for {}", url);
            self.memory_remove(url);
        }

        let path = self.entry_path(url)?;
        let entry = match read_entry(&path).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        if entry.url != url || now >= entry.expires_at {
            debug!("Cache entry on disk is stale for {}", url);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                debug!("Failed to remove stale cache entry {}: {}", path.display(), e);
            }
            return None;
        }

        debug!("Cache hit (disk) for {}", url);
        let body = entry.body.clone();
        self.memory_insert(entry);
        Some(body)
    }

    pub async fn put(&self, url: &str, body: &str) -> Result<()> {
        let entry = CachedResponse {
            url: url.to_string(),
            body: body.to_string(),
            expires_at: self.clock.now().saturating_add(self.ttl.as_secs()),
        };

        let bytes = serde_json::to_vec(&entry)?;
        self.memory_insert(entry);

        if let Some(path) = self.entry_path(url) {
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir).await?;
                self.sweep_expired(dir).await;
            }
            tokio::fs::write(&path, bytes).await?;
        }
        Ok(())
    }

    fn entry_path(&self, url: &str) -> Option<PathBuf> {
        self.directory
            .as_ref()
            .map(|dir| dir.join(format!("{:x}.json", Sha256::digest(url.as_bytes()))))
    }

    /// Remove expired entries left behind by URLs that are no longer requested.
    async fn sweep_expired(&self, dir: &Path) {
        let now = self.clock.now();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping cache sweep of {}: {}", dir.display(), e);
                return;
            }
        };

        while let Ok(Some(dir_entry)) = entries.next_entry().await {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let expired = match read_entry(&path).await {
                Ok(Some(entry)) => now >= entry.expires_at,
                Ok(None) => false,
                // Unreadable entries can never be served
                Err(_) => true,
            };
            if expired {
                debug!("Sweeping expired cache entry {}", path.display());
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    debug!("Failed to remove cache entry {}: {}", path.display(), e);
                }
            }
        }
    }

    fn memory_get(&self, url: &str) -> Option<CachedResponse> {
        self.memory
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
    }

    fn memory_insert(&self, entry: CachedResponse) {
        self.memory
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entry.url.clone(), entry);
    }

    fn memory_remove(&self, url: &str) {
        self.memory
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(url);
    }
}

async fn read_entry(path: &Path) -> Result<Option<CachedResponse>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
