//! Matlib persistence: minimal SQLite store for ETag-cached responses.
//! Keep code tiny and predictable.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

/// One cached response: keyed by the fully resolved request URL.
/// Entries never expire by time alone; they live until invalidated or
/// overwritten by a fresher ETag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub etag: String,
    pub data: serde_json::Value,
    pub ts: i64,
}

pub trait CacheStore: Send + Sync {
    fn get(&self, url: &str) -> Result<Option<CacheEntry>>;
    fn put(&self, url: &str, etag: &str, data: &serde_json::Value) -> Result<()>;
    fn invalidate(&self, url: &str) -> Result<()>;

    fn etag(&self, url: &str) -> Result<Option<String>> {
        Ok(self.get(url)?.map(|entry| entry.etag))
    }
}

/// SQLite-backed store. Simple, synchronous. Cache lookups aren't latency
/// sensitive here.
pub struct SqliteCache {
    db: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteCache {
    pub fn open_default() -> Result<Self> {
        let path = std::env::var("MATLIB_DB_PATH").unwrap_or_else(|_| default_db_path());
        Self::open(&path)
    }

    pub fn open(path: &str) -> Result<Self> {
        let started = std::time::Instant::now();
        let db = rusqlite::Connection::open(path)
            .with_context(|| format!("opening sqlite db at {}", path))?;
        db.pragma_update(None, "journal_mode", &"WAL").ok();
        db.pragma_update(None, "synchronous", &"NORMAL").ok();
        db.execute(
            "CREATE TABLE IF NOT EXISTS responses (
                url  TEXT PRIMARY KEY,
                etag TEXT NOT NULL,
                data TEXT NOT NULL,
                ts   INTEGER NOT NULL
            )",
            [],
        )
        .context("creating responses table")?;
        let me = Self { db: std::sync::Mutex::new(db) };
        histogram!("cache_open_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(me)
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, url: &str) -> Result<Option<CacheEntry>> {
        let started = std::time::Instant::now();
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare("SELECT etag, data, ts FROM responses WHERE url = ?1")?;
        let mut rows = stmt.query([url])?;
        let entry = match rows.next()? {
            Some(row) => {
                let etag: String = row.get(0)?;
                let raw: String = row.get(1)?;
                let ts: i64 = row.get(2)?;
                let data = serde_json::from_str(&raw).context("decoding cached payload")?;
                Some(CacheEntry { url: url.to_string(), etag, data, ts })
            }
            None => None,
        };
        histogram!("cache_get_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(entry)
    }

    fn put(&self, url: &str, etag: &str, data: &serde_json::Value) -> Result<()> {
        let started = std::time::Instant::now();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO responses(url, etag, data, ts) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(url) DO UPDATE SET etag = ?2, data = ?3, ts = ?4",
            (url, etag, serde_json::to_string(data)?, chrono::Utc::now().timestamp()),
        )?;
        histogram!("cache_put_ms", started.elapsed().as_secs_f64() * 1000.0);
        counter!("cache_put_total", 1u64);
        Ok(())
    }

    fn invalidate(&self, url: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute("DELETE FROM responses WHERE url = ?1", [url])?;
        counter!("cache_invalidate_total", 1u64);
        Ok(())
    }
}

fn default_db_path() -> String {
    if let Some(home) = std::env::var_os("HOME") {
        let mut p = std::path::PathBuf::from(home);
        p.push(".matlib");
        let _ = std::fs::create_dir_all(&p);
        p.push("cache.db");
        return p.to_string_lossy().to_string();
    }
    // Fallback to current directory
    "matlib-cache.db".to_string()
}
