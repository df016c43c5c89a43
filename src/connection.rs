use std::fmt;
use std::sync::Arc;

use crate::error::SqliteServiceError;
use crate::statement::Statement;
use crate::worker::Worker;

/// Handle to one SQLite database served by a dedicated worker thread.
///
/// The handle is created unopened; [`Connection::open`] (or the blocking
/// variant) attaches the engine connection on the worker thread. Every
/// operation on this handle and on any [`Statement`] prepared from it runs
/// exclusively, in submission order, on that one thread.
///
/// Cloning is cheap and yields another handle to the same worker. The worker
/// thread is joined and the engine handle released when the last handle
/// (connection or derived statement) is dropped.
#[derive(Clone)]
pub struct Connection {
    worker: Arc<Worker>,
}

impl Connection {
    /// Spawn the worker thread for a new, not-yet-opened connection.
    ///
    /// # Errors
    /// Returns [`SqliteServiceError::OutOfResources`] if the worker thread
    /// cannot be spawned.
    pub fn new() -> Result<Self, SqliteServiceError> {
        Ok(Self {
            worker: Worker::spawn()?,
        })
    }

    /// Open the database at `url` (a filesystem path or `:memory:`).
    ///
    /// Opening an already-open connection replaces the engine handle; the
    /// caller must ensure no statement prepared on the previous handle is
    /// still in use.
    ///
    /// # Errors
    /// `ConnectionOpenFailure` if the engine rejects the URL,
    /// `OutOfResources` if it cannot allocate a handle.
    pub async fn open(&self, url: &str) -> Result<(), SqliteServiceError> {
        self.worker.open(url.to_owned()).await
    }

    /// Blocking form of [`Connection::open`]. Must not be called from an
    /// async context.
    ///
    /// # Errors
    /// Same error surface as [`Connection::open`].
    pub fn open_blocking(&self, url: &str) -> Result<(), SqliteServiceError> {
        self.worker.open_blocking(url.to_owned())
    }

    /// Run one or more SQL statements without capturing results.
    ///
    /// # Errors
    /// `LogicError` if the connection has never been opened, otherwise the
    /// classified engine failure (e.g. `SyntaxError`).
    pub async fn exec(&self, sql: &str) -> Result<(), SqliteServiceError> {
        self.worker.exec(sql.to_owned()).await
    }

    /// Blocking form of [`Connection::exec`].
    ///
    /// # Errors
    /// Same error surface as [`Connection::exec`].
    pub fn exec_blocking(&self, sql: &str) -> Result<(), SqliteServiceError> {
        self.worker.exec_blocking(sql.to_owned())
    }

    /// Prepare `sql`, step every row, and discard the contents. Useful to
    /// validate a read-only statement end to end.
    ///
    /// # Errors
    /// Same error surface as prepare-then-fetch.
    pub async fn fetch(&self, sql: &str) -> Result<(), SqliteServiceError> {
        self.worker.fetch_discard(sql.to_owned()).await
    }

    /// Blocking form of [`Connection::fetch`].
    ///
    /// # Errors
    /// Same error surface as [`Connection::fetch`].
    pub fn fetch_blocking(&self, sql: &str) -> Result<(), SqliteServiceError> {
        self.worker.fetch_discard_blocking(sql.to_owned())
    }

    /// Prepare a statement for later binding and fetching.
    ///
    /// Always returns a [`Statement`]; a preparation failure (malformed SQL,
    /// connection never opened) is recorded as the statement's error state
    /// rather than reported here. Fetching from such a statement is safe.
    pub async fn prepare(&self, sql: &str) -> Statement {
        let id = self.worker.next_statement_id();
        let sql = Arc::new(sql.to_owned());
        let error = self
            .worker
            .prepare(id, Arc::clone(&sql))
            .await
            .err();
        Statement::new(Arc::clone(&self.worker), id, sql, error)
    }

    /// Blocking form of [`Connection::prepare`].
    pub fn prepare_blocking(&self, sql: &str) -> Statement {
        let id = self.worker.next_statement_id();
        let sql = Arc::new(sql.to_owned());
        let error = self.worker.prepare_blocking(id, Arc::clone(&sql)).err();
        Statement::new(Arc::clone(&self.worker), id, sql, error)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}
