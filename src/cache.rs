use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const TOKEN_KEY: &str = "token";
pub const QUOTES_KEY: &str = "quotes";
pub const SORTED_KEY: &str = "quotes-sorted";
pub const DUPLICATE_KEY: &str = "quotes-duplicate";
pub const DROPPED_KEY: &str = "quotes-dropped";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cache value for `{key}` is not valid: {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to create cache directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value store shared by every command. Writes replace any prior value.
pub trait CacheStore {
    fn get_value(&self, key: &str) -> Result<Option<Value>, CacheError>;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), CacheError>;
    fn remove(&mut self, key: &str) -> Result<(), CacheError>;
    fn clear(&mut self) -> Result<(), CacheError>;
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        Self: Sized,
    {
        match self.get_value(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v)
                .map(Some)
                .map_err(|source| CacheError::Value {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), CacheError>
    where
        Self: Sized,
    {
        let v = serde_json::to_value(value).map_err(|source| CacheError::Value {
            key: key.to_string(),
            source,
        })?;
        self.set_value(key, v)
    }
}

// ── SQLite backend ──

pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS cache (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(SqliteCache { conn })
    }
}

impl CacheStore for SqliteCache {
    fn get_value(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM cache WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;

        raw.map(|text| {
            serde_json::from_str(&text).map_err(|source| CacheError::Value {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    fn set_value(&mut self, key: &str, value: Value) -> Result<(), CacheError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cache (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))",
            rusqlite::params![key, value.to_string()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        self.conn
            .execute("DELETE FROM cache WHERE key = ?1", [key])?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CacheError> {
        self.conn.execute("DELETE FROM cache", [])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut stmt = self.conn.prepare("SELECT key FROM cache ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ── In-memory backend ──

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: std::collections::BTreeMap<String, Value>,
}

#[cfg(test)]
impl CacheStore for MemoryCache {
    fn get_value(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_value(&mut self, key: &str, value: Value) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exercise(store: &mut impl CacheStore) {
        assert_eq!(store.get::<String>(TOKEN_KEY).unwrap(), None);

        store.set(TOKEN_KEY, "1|abc").unwrap();
        assert_eq!(store.get::<String>(TOKEN_KEY).unwrap().as_deref(), Some("1|abc"));

        // last write wins
        store.set(TOKEN_KEY, "2|def").unwrap();
        assert_eq!(store.get::<String>(TOKEN_KEY).unwrap().as_deref(), Some("2|def"));

        store.set_value(QUOTES_KEY, json!([{"id": 1}])).unwrap();
        assert_eq!(store.keys().unwrap(), vec![QUOTES_KEY.to_string(), TOKEN_KEY.to_string()]);

        store.remove(TOKEN_KEY).unwrap();
        assert_eq!(store.get_value(TOKEN_KEY).unwrap(), None);

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn memory_cache_contract() {
        exercise(&mut MemoryCache::default());
    }

    #[test]
    fn sqlite_cache_contract() {
        exercise(&mut SqliteCache::open_in_memory().unwrap());
    }

    #[test]
    fn sqlite_cache_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/cache.sqlite");
        {
            let mut store = SqliteCache::open(&path).unwrap();
            store.set(QUOTES_KEY, &vec!["a", "b"]).unwrap();
        }
        let store = SqliteCache::open(&path).unwrap();
        let quotes: Vec<String> = store.get(QUOTES_KEY).unwrap().unwrap();
        assert_eq!(quotes, vec!["a", "b"]);
    }

    #[test]
    fn wrong_shape_is_a_value_error() {
        let mut store = MemoryCache::default();
        store.set_value(QUOTES_KEY, json!({"not": "a list"})).unwrap();
        let err = store.get::<Vec<String>>(QUOTES_KEY).unwrap_err();
        assert!(matches!(err, CacheError::Value { ref key, .. } if key == QUOTES_KEY));
    }
}
