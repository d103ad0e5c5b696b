use crate::errors::AppResult;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

/// A stored response. The body is kept base64 encoded so binary payloads
/// survive the JSON round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub stored_at: i64,
    pub body: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl CachedResponse {
    pub fn new(body: &[u8], location: Option<String>) -> Self {
        Self {
            stored_at: Utc::now().timestamp(),
            body: STANDARD.encode(body),
            location,
        }
    }

    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.body).ok()
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        let age = Utc::now().timestamp() - self.stored_at;
        age >= 0 && (age as u64) < ttl.as_secs()
    }
}

/// On-disk response cache keyed by method and URL.
///
/// Entries older than the TTL are treated as missing and overwritten on the
/// next store. Unreadable entries are ignored, never reported as errors.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub async fn load(&self, method: &str, url: &str) -> Option<CachedResponse> {
        let path = self.entry_path(method, url);
        let contents = fs::read(&path).await.ok()?;

        match serde_json::from_slice::<CachedResponse>(&contents) {
            Ok(entry) if entry.is_fresh(self.ttl) => {
                debug!(method, url, "Cache hit");
                Some(entry)
            }
            Ok(_) => {
                debug!(method, url, "Cache entry expired");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt cache entry");
                None
            }
        }
    }

    pub async fn store(&self, method: &str, url: &str, entry: &CachedResponse) -> AppResult<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.entry_path(method, url);
        fs::write(&path, serde_json::to_vec(entry)?).await?;
        Ok(())
    }

    /// Drops an entry, e.g. a response that turned out to be unusable.
    pub async fn remove(&self, method: &str, url: &str) {
        let _ = fs::remove_file(self.entry_path(method, url)).await;
    }

    fn entry_path(&self, method: &str, url: &str) -> PathBuf {
        self.dir.join(format!("{:016x}.json", cache_key(method, url)))
    }
}

fn cache_key(method: &str, url: &str) -> u64 {
    let mut hasher = fnv::FnvHasher::default();
    method.hash(&mut hasher);
    url.hash(&mut hasher);
    hasher.finish()
}
