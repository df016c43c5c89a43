//! Async adapter for the blocking SQLite engine.
//!
//! Each [`Connection`] owns one dedicated worker thread. Every blocking
//! engine call — for the connection and for every [`Statement`] prepared
//! from it — is serialized FIFO onto that thread, and results are delivered
//! back to the caller's async context through completion channels. Blocking
//! variants of each operation route through the same queue, so exactly one
//! thread ever touches an engine handle.
//!
//! ```no_run
//! use sqlite_service::Connection;
//!
//! # async fn demo() -> Result<(), sqlite_service::SqliteServiceError> {
//! let conn = Connection::new()?;
//! conn.open(":memory:").await?;
//! conn.exec("CREATE TABLE t (id INTEGER, label TEXT)").await?;
//!
//! let mut stmt = conn.prepare("SELECT 1, 'hello'").await;
//! let row: Option<(i64, String)> = stmt.fetch_next().await?;
//! assert_eq!(row, Some((1, "hello".into())));
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod row;
pub mod statement;
pub mod value;

mod worker;

pub use connection::Connection;
pub use error::{ErrorKind, SqliteServiceError};
pub use row::{FromColumn, FromRow};
pub use statement::Statement;
pub use value::{BindParam, Value};
