//! Unit-of-work boundary for multi-row writes.
//!
//! # Responsibility
//! - Run a closure atomically against the backing store.
//! - Hand the active transaction to repositories as an explicit typed handle.
//!
//! # Invariants
//! - Repository write methods accept only `&UnitOfWork`, so a write outside a
//!   transaction does not type-check.
//! - `run` commits only when the closure returns `Ok`; otherwise it rolls back
//!   and returns the closure error unchanged.
//! - A transaction dropped without commit (early return, panic) rolls back.

use crate::repo::{RepoError, RepoResult};
use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Capability proving that a write runs inside an open transaction.
///
/// Only [`TransactionRunner::run`] implementations create this handle.
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> UnitOfWork<'conn> {
    pub(crate) fn new(tx: Transaction<'conn>) -> Self {
        Self { tx }
    }

    /// Returns the transactional connection for write statements.
    ///
    /// # Errors
    /// - [`RepoError::NotInTransaction`] when the underlying connection has
    ///   left transaction mode (for example after a raw `COMMIT`).
    pub fn connection(&self) -> RepoResult<&Connection> {
        if self.tx.is_autocommit() {
            return Err(RepoError::NotInTransaction);
        }
        Ok(&self.tx)
    }

    fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> RepoResult<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

/// Executes units of work atomically against the backing store.
pub trait TransactionRunner {
    /// Runs read-only work against a plain connection, without a transaction.
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<RepoError>;

    /// Runs `f` inside one transaction.
    ///
    /// Begin/commit failures are converted into `E` via `From<RepoError>`;
    /// errors returned by `f` pass through unchanged.
    fn run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<RepoError>;
}

impl<R: TransactionRunner> TransactionRunner for Arc<R> {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<RepoError>,
    {
        (**self).read(f)
    }

    fn run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<RepoError>,
    {
        (**self).run(f)
    }
}

/// SQLite runner serializing access to one migrated connection.
pub struct SqliteTransactionRunner {
    conn: Mutex<Connection>,
}

impl SqliteTransactionRunner {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic inside `run` drops its transaction, which rolls back, so the
        // connection behind a poisoned lock is still consistent.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransactionRunner for SqliteTransactionRunner {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<RepoError>,
    {
        let conn = self.lock();
        f(&conn)
    }

    fn run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<RepoError>,
    {
        let mut conn = self.lock();
        // IMMEDIATE takes the write lock up front so read-then-write sequences
        // (version compare, then save) cannot interleave with another writer.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let uow = UnitOfWork::new(tx);

        match f(&uow) {
            Ok(value) => {
                uow.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback() {
                    warn!(
                        "event=tx_rollback module=db status=error error_code=rollback_failed error={rollback_err}"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteTransactionRunner, TransactionRunner};
    use crate::db::open_db_in_memory;
    use crate::repo::{RepoError, RepoResult};

    fn runner() -> SqliteTransactionRunner {
        SqliteTransactionRunner::new(open_db_in_memory().unwrap())
    }

    fn insert_probe(conn: &rusqlite::Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO activities (type, user_id, work_id, work_title, work_version)
             VALUES ('added', 'probe', 1, 'probe', 1);",
            [],
        )
    }

    fn count_probes(runner: &SqliteTransactionRunner) -> i64 {
        runner
            .read(|conn| -> RepoResult<i64> {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM activities WHERE user_id = 'probe';",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap()
    }

    #[test]
    fn run_commits_on_ok() {
        let runner = runner();
        runner
            .run(|uow| -> RepoResult<()> {
                insert_probe(uow.connection()?)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(count_probes(&runner), 1);
    }

    #[test]
    fn run_rolls_back_and_returns_closure_error_unchanged() {
        let runner = runner();
        let err = runner
            .run(|uow| -> RepoResult<()> {
                insert_probe(uow.connection()?)?;
                Err(RepoError::InvalidData("boom".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message == "boom"));
        assert_eq!(count_probes(&runner), 0);
    }

    #[test]
    fn connection_reports_not_in_transaction_after_raw_commit() {
        let runner = runner();
        let err = runner
            .run(|uow| -> RepoResult<()> {
                uow.connection()?.execute_batch("COMMIT;")?;
                uow.connection().map(|_| ())
            })
            .unwrap_err();
        assert!(matches!(err, RepoError::NotInTransaction));
    }

    #[test]
    fn panic_inside_run_leaves_no_partial_write() {
        let runner = runner();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = runner.run(|uow| -> RepoResult<()> {
                insert_probe(uow.connection()?)?;
                panic!("abort mid-transaction");
            });
        }));
        assert!(result.is_err());
        assert_eq!(count_probes(&runner), 0);
    }
}
