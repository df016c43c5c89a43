use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use crate::error::SqliteServiceError;
use crate::value::{BindParam, Value};

use super::channel::{Command, StatementId};

/// Worker-side state for one prepared statement.
///
/// Bound parameters are stored with their placeholder index already resolved.
/// Rows are buffered on the first step; the cursor is the front of the queue.
struct PreparedEntry {
    sql: Arc<String>,
    params: Vec<(usize, Value)>,
    next_positional: usize,
    rows: Option<VecDeque<Vec<Value>>>,
}

pub(super) fn run_worker(receiver: &Receiver<Command>) {
    let mut conn: Option<rusqlite::Connection> = None;
    let mut statements: HashMap<StatementId, PreparedEntry> = HashMap::new();

    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::Open { url, respond_to } => {
                let result = open_database(&url).map(|handle| {
                    // Reopening replaces the previous engine handle; the old
                    // one closes when dropped here.
                    conn = Some(handle);
                });
                let _ = respond_to.send(result);
            }
            Command::Exec { sql, respond_to } => {
                let result = require_conn(&mut conn).and_then(|c| execute_batch(c, &sql));
                let _ = respond_to.send(result);
            }
            Command::Fetch { sql, respond_to } => {
                let result = require_conn(&mut conn).and_then(|c| run_and_discard(c, &sql));
                let _ = respond_to.send(result);
            }
            Command::Prepare {
                id,
                sql,
                respond_to,
            } => {
                let result = require_conn(&mut conn).and_then(|c| validate_prepare(c, &sql));
                if result.is_ok() {
                    statements.insert(
                        id,
                        PreparedEntry {
                            sql,
                            params: Vec::new(),
                            next_positional: 0,
                            rows: None,
                        },
                    );
                }
                let _ = respond_to.send(result);
            }
            Command::Bind {
                id,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(bind_statement(&mut conn, &mut statements, id, params));
            }
            Command::Step { id, respond_to } => {
                let _ = respond_to.send(step_statement(&mut conn, &mut statements, id));
            }
            Command::Finalize { id } => {
                statements.remove(&id);
            }
        }
    }

    // Dropping the connection here closes the engine handle exactly once.
    tracing::debug!("sqlite worker drained; releasing engine handle");
}

fn open_database(url: &str) -> Result<rusqlite::Connection, SqliteServiceError> {
    let handle = rusqlite::Connection::open(url)?;
    tracing::debug!(url, "opened sqlite database");
    Ok(handle)
}

fn require_conn(
    conn: &mut Option<rusqlite::Connection>,
) -> Result<&mut rusqlite::Connection, SqliteServiceError> {
    conn.as_mut()
        .ok_or_else(|| SqliteServiceError::LogicError("no open database connection".into()))
}

fn execute_batch(conn: &rusqlite::Connection, sql: &str) -> Result<(), SqliteServiceError> {
    conn.execute_batch(sql)?;
    Ok(())
}

fn run_and_discard(conn: &rusqlite::Connection, sql: &str) -> Result<(), SqliteServiceError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    while rows.next()?.is_some() {}
    Ok(())
}

fn validate_prepare(conn: &rusqlite::Connection, sql: &str) -> Result<(), SqliteServiceError> {
    let _ = conn.prepare_cached(sql)?;
    Ok(())
}

fn bind_statement(
    conn: &mut Option<rusqlite::Connection>,
    statements: &mut HashMap<StatementId, PreparedEntry>,
    id: StatementId,
    params: Vec<BindParam>,
) -> Result<(), SqliteServiceError> {
    let entry = statements.get_mut(&id).ok_or_else(unknown_statement)?;
    let conn = require_conn(conn)?;
    if entry.rows.is_some() {
        return Err(SqliteServiceError::LogicError(
            "cannot bind after fetch has started".into(),
        ));
    }

    let stmt = conn.prepare_cached(entry.sql.as_str())?;
    // The first failing element aborts the rest of the list; elements bound
    // before the failure stay bound.
    for param in params {
        match param {
            BindParam::Positional(value) => {
                let idx = entry.next_positional + 1;
                if idx > stmt.parameter_count() {
                    return Err(SqliteServiceError::BindFailure(format!(
                        "positional parameter {idx} out of range; statement takes {} parameters",
                        stmt.parameter_count()
                    )));
                }
                entry.next_positional = idx;
                entry.params.push((idx, value));
            }
            BindParam::Named(name, value) => match stmt.parameter_index(&name)? {
                Some(idx) => entry.params.push((idx, value)),
                None => {
                    return Err(SqliteServiceError::BindFailure(format!(
                        "unknown parameter name: {name}"
                    )));
                }
            },
        }
    }
    Ok(())
}

fn step_statement(
    conn: &mut Option<rusqlite::Connection>,
    statements: &mut HashMap<StatementId, PreparedEntry>,
    id: StatementId,
) -> Result<Option<Vec<Value>>, SqliteServiceError> {
    let entry = statements.get_mut(&id).ok_or_else(unknown_statement)?;
    let conn = require_conn(conn)?;
    if entry.rows.is_none() {
        let buffered = materialize(conn, &entry.sql, &entry.params)?;
        entry.rows = Some(buffered);
    }
    Ok(entry.rows.as_mut().and_then(VecDeque::pop_front))
}

fn materialize(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[(usize, Value)],
) -> Result<VecDeque<Vec<Value>>, SqliteServiceError> {
    let mut stmt = conn.prepare_cached(sql)?;
    stmt.clear_bindings();
    for (idx, value) in params {
        stmt.raw_bind_parameter(*idx, value.to_engine())?;
    }
    let width = stmt.column_count();
    let mut rows = stmt.raw_query();
    let mut buffered = VecDeque::new();
    while let Some(row) = rows.next()? {
        let mut columns = Vec::with_capacity(width);
        for i in 0..width {
            columns.push(Value::from_engine(row.get_ref(i)?)?);
        }
        buffered.push_back(columns);
    }
    Ok(buffered)
}

fn unknown_statement() -> SqliteServiceError {
    SqliteServiceError::LogicError("statement is not prepared".into())
}
