use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tokio::sync::oneshot;

use crate::error::SqliteServiceError;
use crate::value::{BindParam, Value};

use super::channel::{Command, StatementId};
use super::dispatcher::run_worker;

/// Handle to a connection's dedicated worker thread.
///
/// All engine calls issued through this handle execute one at a time, in
/// submission order, on the worker thread. Dropping the last reference sends
/// `Shutdown` behind any queued commands and joins the thread, so queued work
/// drains against the live engine handle before it is released.
pub(crate) struct Worker {
    sender: Sender<Command>,
    join_handle: Option<JoinHandle<()>>,
    next_statement_id: AtomicU64,
}

impl Worker {
    pub(crate) fn spawn() -> Result<Arc<Self>, SqliteServiceError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let join_handle = thread::Builder::new()
            .name("sqlite-service-worker".to_owned())
            .spawn(move || run_worker(&receiver))
            .map_err(|err| {
                SqliteServiceError::OutOfResources(format!(
                    "failed to spawn sqlite worker thread: {err}"
                ))
            })?;
        tracing::debug!("spawned sqlite worker thread");

        Ok(Arc::new(Self {
            sender,
            join_handle: Some(join_handle),
            next_statement_id: AtomicU64::new(1),
        }))
    }

    pub(crate) fn next_statement_id(&self) -> StatementId {
        self.next_statement_id.fetch_add(1, Ordering::Relaxed)
    }

    fn send_command(&self, command: Command) -> Result<(), SqliteServiceError> {
        self.sender
            .send(command)
            .map_err(|_| closed("sqlite worker queue is closed"))
    }

    /// Enqueue a command and await its completion on the caller's context.
    ///
    /// The held receiver is what keeps the caller's task alive while the
    /// result is in flight; dropping it simply discards the result.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, SqliteServiceError>>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, SqliteServiceError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.await.map_err(|_| closed(drop_message))?
    }

    /// Enqueue a command and block the issuing thread until the worker has
    /// finished it. Must not be called from an async context.
    fn request_blocking<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, SqliteServiceError>>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, SqliteServiceError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.blocking_recv().map_err(|_| closed(drop_message))?
    }

    pub(crate) async fn open(&self, url: String) -> Result<(), SqliteServiceError> {
        self.request(
            |respond_to| Command::Open { url, respond_to },
            "sqlite worker dropped while opening database",
        )
        .await
    }

    pub(crate) fn open_blocking(&self, url: String) -> Result<(), SqliteServiceError> {
        self.request_blocking(
            |respond_to| Command::Open { url, respond_to },
            "sqlite worker dropped while opening database",
        )
    }

    pub(crate) async fn exec(&self, sql: String) -> Result<(), SqliteServiceError> {
        self.request(
            |respond_to| Command::Exec { sql, respond_to },
            "sqlite worker dropped while executing statement",
        )
        .await
    }

    pub(crate) fn exec_blocking(&self, sql: String) -> Result<(), SqliteServiceError> {
        self.request_blocking(
            |respond_to| Command::Exec { sql, respond_to },
            "sqlite worker dropped while executing statement",
        )
    }

    pub(crate) async fn fetch_discard(&self, sql: String) -> Result<(), SqliteServiceError> {
        self.request(
            |respond_to| Command::Fetch { sql, respond_to },
            "sqlite worker dropped while fetching rows",
        )
        .await
    }

    pub(crate) fn fetch_discard_blocking(&self, sql: String) -> Result<(), SqliteServiceError> {
        self.request_blocking(
            |respond_to| Command::Fetch { sql, respond_to },
            "sqlite worker dropped while fetching rows",
        )
    }

    pub(crate) async fn prepare(
        &self,
        id: StatementId,
        sql: Arc<String>,
    ) -> Result<(), SqliteServiceError> {
        self.request(
            |respond_to| Command::Prepare {
                id,
                sql,
                respond_to,
            },
            "sqlite worker dropped while preparing statement",
        )
        .await
    }

    pub(crate) fn prepare_blocking(
        &self,
        id: StatementId,
        sql: Arc<String>,
    ) -> Result<(), SqliteServiceError> {
        self.request_blocking(
            |respond_to| Command::Prepare {
                id,
                sql,
                respond_to,
            },
            "sqlite worker dropped while preparing statement",
        )
    }

    pub(crate) fn bind_blocking(
        &self,
        id: StatementId,
        params: Vec<BindParam>,
    ) -> Result<(), SqliteServiceError> {
        self.request_blocking(
            |respond_to| Command::Bind {
                id,
                params,
                respond_to,
            },
            "sqlite worker dropped while binding parameters",
        )
    }

    pub(crate) async fn step(
        &self,
        id: StatementId,
    ) -> Result<Option<Vec<Value>>, SqliteServiceError> {
        self.request(
            |respond_to| Command::Step { id, respond_to },
            "sqlite worker dropped while stepping statement",
        )
        .await
    }

    pub(crate) fn step_blocking(
        &self,
        id: StatementId,
    ) -> Result<Option<Vec<Value>>, SqliteServiceError> {
        self.request_blocking(
            |respond_to| Command::Step { id, respond_to },
            "sqlite worker dropped while stepping statement",
        )
    }

    pub(crate) fn finalize(&self, id: StatementId) {
        let _ = self.sender.send(Command::Finalize { id });
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(handle) = self.join_handle.take()
            && let Err(err) = handle.join()
        {
            tracing::warn!("sqlite worker thread panicked: {err:?}");
        }
    }
}

// Reachable only when the worker thread has exited ahead of its handles
// (e.g. after a panic in the engine); orderly shutdown drops every handle
// before the queue closes.
fn closed(message: &str) -> SqliteServiceError {
    SqliteServiceError::ConnectionClosed(message.into())
}
