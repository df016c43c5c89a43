use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::SqliteServiceError;
use crate::value::{BindParam, Value};

/// Identifies worker-side prepared statement state.
pub(crate) type StatementId = u64;

pub(super) enum Command {
    Open {
        url: String,
        respond_to: oneshot::Sender<Result<(), SqliteServiceError>>,
    },
    Exec {
        sql: String,
        respond_to: oneshot::Sender<Result<(), SqliteServiceError>>,
    },
    /// Prepare, step every row, discard the contents.
    Fetch {
        sql: String,
        respond_to: oneshot::Sender<Result<(), SqliteServiceError>>,
    },
    Prepare {
        id: StatementId,
        sql: Arc<String>,
        respond_to: oneshot::Sender<Result<(), SqliteServiceError>>,
    },
    Bind {
        id: StatementId,
        params: Vec<BindParam>,
        respond_to: oneshot::Sender<Result<(), SqliteServiceError>>,
    },
    /// Advance the statement cursor one row; `None` means end of results.
    Step {
        id: StatementId,
        respond_to: oneshot::Sender<Result<Option<Vec<Value>>, SqliteServiceError>>,
    },
    /// Best-effort release of worker-side statement state; no response.
    Finalize {
        id: StatementId,
    },
    Shutdown,
}
