//! Key-value repository contract and implementations.
//!
//! # Responsibility
//! - Provide string get/set over named keys.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `set_many` is all-or-nothing: either every entry is written or none is.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage transport failure.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Serialize(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to encode collection: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Durable string store keyed by collection name.
pub trait KeyValueRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;

    /// Writes every entry atomically.
    fn set_many(&self, entries: &[(&str, String)]) -> RepoResult<()>;

    fn remove(&self, key: &str) -> RepoResult<()>;

    fn set(&self, key: &str, value: String) -> RepoResult<()> {
        self.set_many(&[(key, value)])
    }
}

impl<R: KeyValueRepository + ?Sized> KeyValueRepository for &R {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get(key)
    }

    fn set_many(&self, entries: &[(&str, String)]) -> RepoResult<()> {
        (**self).set_many(entries)
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        (**self).remove(key)
    }
}

/// SQLite-backed key-value repository over the `kv_store` table.
#[derive(Clone, Copy)]
pub struct SqliteKeyValueRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueRepository for SqliteKeyValueRepository<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_many(&self, entries: &[(&str, String)]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![*key, value.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-local repository for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryKeyValueRepository {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryKeyValueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueRepository for MemoryKeyValueRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> RepoResult<()> {
        let mut map = self.entries.borrow_mut();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueRepository, MemoryKeyValueRepository, SqliteKeyValueRepository};
    use crate::db::open_db_in_memory;

    #[test]
    fn sqlite_set_overwrites_and_remove_clears() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(&conn);

        assert_eq!(repo.get("k").unwrap(), None);
        repo.set("k", "one".to_string()).unwrap();
        repo.set("k", "two".to_string()).unwrap();
        assert_eq!(repo.get("k").unwrap().as_deref(), Some("two"));

        repo.remove("k").unwrap();
        assert_eq!(repo.get("k").unwrap(), None);
    }

    #[test]
    fn sqlite_set_many_writes_all_entries() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(&conn);

        repo.set_many(&[("a", "1".to_string()), ("b", "2".to_string())])
            .unwrap();
        assert_eq!(repo.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(repo.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn memory_repository_behaves_like_a_map() {
        let repo = MemoryKeyValueRepository::new();
        assert!(repo.is_empty());
        repo.set("a", "1".to_string()).unwrap();
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get("a").unwrap().as_deref(), Some("1"));
        repo.remove("a").unwrap();
        assert!(repo.is_empty());
    }
}
