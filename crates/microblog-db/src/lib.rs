pub mod migrations;
pub mod queries;
pub mod records;
pub mod reports;
pub mod seed;
pub mod views;

use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::info;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{field} '{value}' is already taken")]
    Duplicate { field: &'static str, value: String },

    #[error("not found: {resource} '{key}'")]
    NotFound { resource: &'static str, key: String },

    #[error("database lock poisoned")]
    LockPoisoned,
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent readers from other processes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let db = Self::init(conn)?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> DbResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;
        views::ensure_views(&conn);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Runs `f` inside a transaction. Commits on `Ok`; any error (or a panic
    /// unwinding through `f`) drops the transaction, which rolls it back.
    pub fn with_tx<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> DbResult<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Closes the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> DbResult<()> {
        let conn = self.conn.into_inner().map_err(|_| DbError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| DbError::Sqlite(e))?;
        info!("Database closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_tx_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: DbResult<()> = db.with_tx(|tx| {
            tx.execute(
                "INSERT INTO user (username, email) VALUES ('ghost', 'ghost@example.com')",
                [],
            )?;
            Err(DbError::NotFound { resource: "user", key: "forced".into() })
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM user", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn close_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.close().unwrap();
    }

    #[test]
    fn with_tx_rolls_back_on_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("microblog.db");
        let db = Database::open(&path).unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: DbResult<()> = db.with_tx(|tx| {
                tx.execute(
                    "INSERT INTO user (username, email) VALUES ('ghost', 'ghost@example.com')",
                    [],
                )?;
                panic!("writer crashed mid-transaction");
            });
        }));
        assert!(outcome.is_err());

        // The panic poisoned the lock; this handle refuses further work.
        assert!(matches!(db.with_conn(|_| Ok(())), Err(DbError::LockPoisoned)));
        drop(db);

        let reopened = Database::open(&path).unwrap();
        let count: i64 = reopened
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM user", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }
}
