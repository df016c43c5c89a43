use std::sync::Arc;

use crate::error::SqliteServiceError;
use crate::row::FromRow;
use crate::value::BindParam;
use crate::worker::{StatementId, Worker};

/// A prepared, parameterizable, cursor-advancing query.
///
/// Created by [`Connection::prepare`](crate::Connection::prepare), which
/// returns a `Statement` even when preparation failed; the failure is carried
/// in the statement's error state and every subsequent operation is safe.
///
/// The statement shares ownership of the connection's worker, so the engine
/// handle outlives every statement prepared from it. Dropping the statement
/// releases its worker-side state.
///
/// The error state keeps the first recorded failure; it is never cleared by
/// a later successful bind or fetch.
pub struct Statement {
    worker: Arc<Worker>,
    id: StatementId,
    sql: Arc<String>,
    error: Option<SqliteServiceError>,
}

impl Statement {
    pub(crate) fn new(
        worker: Arc<Worker>,
        id: StatementId,
        sql: Arc<String>,
        error: Option<SqliteServiceError>,
    ) -> Self {
        Self {
            worker,
            id,
            sql,
            error,
        }
    }

    /// The SQL text this statement was prepared from.
    #[must_use]
    pub fn sql(&self) -> &str {
        self.sql.as_str()
    }

    /// The recorded error state, or `None` when the statement is healthy.
    #[must_use]
    pub fn error(&self) -> Option<&SqliteServiceError> {
        self.error.as_ref()
    }

    /// Diagnostic text of the recorded error; empty when the statement is
    /// healthy.
    #[must_use]
    pub fn last_error(&self) -> &str {
        self.error.as_ref().map_or("", SqliteServiceError::message)
    }

    fn record_error(&mut self, err: &SqliteServiceError) {
        if self.error.is_none() {
            self.error = Some(err.clone());
        }
    }

    /// Bind a list of parameters. Blocking; must not be called from an async
    /// context.
    ///
    /// Plain values fill positional placeholders in declaration order;
    /// `(name, value)` pairs resolve named placeholders through the engine.
    /// Both kinds may be mixed in one call, and binds may be split across
    /// calls (the positional cursor carries over).
    ///
    /// The first failing element aborts the rest of the list; elements bound
    /// before the failure stay bound.
    ///
    /// # Errors
    /// `BindFailure` for an unknown name or out-of-range position, recorded
    /// on the statement's error state. A statement whose error state is
    /// already set reports that error without binding anything.
    pub fn bind(&mut self, params: &[BindParam]) -> Result<(), SqliteServiceError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match self.worker.bind_blocking(self.id, params.to_vec()) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.record_error(&err);
                Err(err)
            }
        }
    }

    /// Advance the cursor one row into `out`. Blocking; must not be called
    /// from an async context.
    ///
    /// Returns `true` when a row was fetched and converted. Returns `false`
    /// at end of results, on a statement whose error state is set, or when a
    /// column cannot be represented in the destination type (the
    /// `ConversionFailure` is recorded on the error state — inspect
    /// [`Statement::error`] to tell the cases apart). On a `false` return
    /// `out` is left untouched; stale contents are not cleared.
    pub fn fetch<R: FromRow>(&mut self, out: &mut R) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.worker.step_blocking(self.id) {
            Ok(Some(columns)) => match R::from_row(&columns) {
                Ok(row) => {
                    *out = row;
                    true
                }
                Err(err) => {
                    self.record_error(&err);
                    false
                }
            },
            Ok(None) => false,
            Err(err) => {
                self.record_error(&err);
                false
            }
        }
    }

    /// Advance the cursor one row on the owning connection's worker, without
    /// blocking the caller.
    ///
    /// The outcome is an explicit tri-state: `Ok(Some(row))` for a fetched
    /// row, `Ok(None)` at end of results, `Err` for a failure.
    ///
    /// # Errors
    /// The statement's recorded error state if set, otherwise any classified
    /// engine or conversion failure (also recorded on the error state).
    pub async fn fetch_next<R: FromRow>(&mut self) -> Result<Option<R>, SqliteServiceError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let columns = match self.worker.step(self.id).await {
            Ok(columns) => columns,
            Err(err) => {
                self.record_error(&err);
                return Err(err);
            }
        };
        match columns {
            Some(columns) => match R::from_row(&columns) {
                Ok(row) => Ok(Some(row)),
                Err(err) => {
                    self.record_error(&err);
                    Err(err)
                }
            },
            None => Ok(None),
        }
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        self.worker.finalize(self.id);
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
