//! Runtime Library for Generated Cases
//!
//! Everything a compiled test-case module calls into lives here.
//!
//! ## Modules
//! - `terminal`: the terminal worker, its bounded queue and result store
//! - `backend`: the driver capability interface terminals are built on
//! - `case`: case environment, terminal registry, failure mapping, suite runner
//! - `expect`: the assertion API
//! - `value`: dynamic values bound by cases
//! - `memory`: a scripted in-memory backend

pub mod backend;
pub mod case;
pub mod expect;
pub mod memory;
pub mod terminal;
pub mod value;

use thiserror::Error;

pub use backend::{Backend, BackendError, Connector, Row};
pub use case::{CaseEnv, CaseFailure, CaseResult, SuiteReport, SuiteRunner, TerminalRegistry};
pub use terminal::{ExecutionResult, ReturnCode, Terminal, TerminalStatus, QUEUE_CAPACITY};
pub use value::Value;

/// Failures of the runtime itself, as opposed to false assertions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeError {
    #[error("terminal '{terminal}' could not connect: {source}")]
    Connect {
        terminal: String,
        source: BackendError,
    },
    #[error("could not start worker for terminal '{terminal}': {message}")]
    Spawn { terminal: String, message: String },
    #[error("terminal '{terminal}' has no result set named '{name}'")]
    MissingResult { terminal: String, name: String },
    #[error("result set '{name}' on terminal '{terminal}' is not ready")]
    ResultNotReady { terminal: String, name: String },
    #[error("a value of type {0} is not a container")]
    NotAContainer(&'static str),
}

/// Glob-imported by generated modules.
pub mod prelude {
    pub use super::backend::Connector;
    pub use super::case::{
        fail_assertion, fail_unexpected, guarded, CaseEnv, CaseFailure, CaseResult, SuiteReport,
        SuiteRunner, TerminalRegistry,
    };
    pub use super::expect::*;
    pub use super::value::Value;
}
