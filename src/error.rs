use thiserror::Error;

/// Abstract error category, distinct from the engine's raw status code.
///
/// Obtained from [`SqliteServiceError::kind`] when callers want to branch on
/// the classification without matching the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConnectionOpenFailure,
    OutOfResources,
    SyntaxError,
    LogicError,
    BindFailure,
    ConversionFailure,
    ConnectionClosed,
    UnknownEngineError,
}

/// Classified failure reported by any connection or statement operation.
///
/// Each variant carries the engine's diagnostic text verbatim. There is no
/// "OK" variant; absence of an error is expressed through `Result` and
/// `Option` at the call sites.
#[derive(Debug, Clone, Error)]
pub enum SqliteServiceError {
    #[error("Connection open failure: {0}")]
    ConnectionOpenFailure(String),

    #[error("Out of resources: {0}")]
    OutOfResources(String),

    #[error("Syntax error: {0}")]
    SyntaxError(String),

    #[error("Logic error: {0}")]
    LogicError(String),

    #[error("Bind failure: {0}")]
    BindFailure(String),

    #[error("Conversion failure: {0}")]
    ConversionFailure(String),

    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("Engine error: {0}")]
    UnknownEngineError(String),
}

impl SqliteServiceError {
    /// The classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionOpenFailure(_) => ErrorKind::ConnectionOpenFailure,
            Self::OutOfResources(_) => ErrorKind::OutOfResources,
            Self::SyntaxError(_) => ErrorKind::SyntaxError,
            Self::LogicError(_) => ErrorKind::LogicError,
            Self::BindFailure(_) => ErrorKind::BindFailure,
            Self::ConversionFailure(_) => ErrorKind::ConversionFailure,
            Self::ConnectionClosed(_) => ErrorKind::ConnectionClosed,
            Self::UnknownEngineError(_) => ErrorKind::UnknownEngineError,
        }
    }

    /// The engine diagnostic text, without the classification prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ConnectionOpenFailure(m)
            | Self::OutOfResources(m)
            | Self::SyntaxError(m)
            | Self::LogicError(m)
            | Self::BindFailure(m)
            | Self::ConversionFailure(m)
            | Self::ConnectionClosed(m)
            | Self::UnknownEngineError(m) => m,
        }
    }
}

// SQLITE_ERROR (primary code 1) is how the engine reports malformed SQL and
// references to missing objects; rusqlite surfaces its code as Unknown.
const SQLITE_GENERIC_ERROR: std::os::raw::c_int = 1;

impl From<rusqlite::Error> for SqliteServiceError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(code, message) => {
                let text = message.clone().unwrap_or_else(|| code.to_string());
                match code.code {
                    ErrorCode::CannotOpen => Self::ConnectionOpenFailure(text),
                    ErrorCode::OutOfMemory => Self::OutOfResources(text),
                    ErrorCode::ApiMisuse => Self::LogicError(text),
                    ErrorCode::ParameterOutOfRange => Self::BindFailure(text),
                    ErrorCode::TypeMismatch => Self::ConversionFailure(text),
                    _ if code.extended_code == SQLITE_GENERIC_ERROR => Self::SyntaxError(text),
                    _ => Self::UnknownEngineError(text),
                }
            }
            // Prepare-time syntax errors arrive as their own variant, with
            // the engine diagnostic in `msg`.
            rusqlite::Error::SqlInputError { msg, .. } => Self::SyntaxError(msg.clone()),
            rusqlite::Error::InvalidParameterName(name) => {
                Self::BindFailure(format!("unknown parameter name: {name}"))
            }
            rusqlite::Error::InvalidParameterCount(got, expected) => Self::BindFailure(format!(
                "wrong number of parameters: got {got}, statement takes {expected}"
            )),
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::InvalidColumnIndex(_)
            | rusqlite::Error::Utf8Error(..) => Self::ConversionFailure(err.to_string()),
            _ => Self::UnknownEngineError(err.to_string()),
        }
    }
}
