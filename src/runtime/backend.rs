//! The capability interface a terminal needs from a database driver.

use thiserror::Error;

use super::Value;

/// One row of a result set.
pub type Row = Vec<Value>;

/// A driver-level diagnostic, split by severity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("warning: {0}")]
    Warning(String),
    #[error("error: {0}")]
    Error(String),
}

impl BackendError {
    pub fn message(&self) -> &str {
        match self {
            BackendError::Warning(message) | BackendError::Error(message) => message,
        }
    }
}

/// A live connection plus its cursor.
///
/// A terminal moves its backend into the worker thread, so implementations
/// only need to be `Send`.
pub trait Backend: Send {
    /// Runs one statement. Rows it produces stay pending until [`fetch_all`].
    ///
    /// [`fetch_all`]: Backend::fetch_all
    fn execute(&mut self, query: &str) -> Result<(), BackendError>;

    /// Fetches every row of the most recently executed statement.
    fn fetch_all(&mut self) -> Result<Vec<Row>, BackendError>;

    /// Closes the cursor and the connection.
    fn close(&mut self) -> Result<(), BackendError>;
}

/// Opens backends from the `Config` literal of a compiled case file.
pub trait Connector: Send + Sync {
    /// `config` is passed through exactly as written in the `Config` block.
    fn connect(&self, config: &str, auto_commit: bool) -> Result<Box<dyn Backend>, BackendError>;
}
