//! Scaffold shared by every generated case: the environment terminals
//! connect with, the per-case registry, the failure mapping and the suite
//! runner.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;

use super::backend::Connector;
use super::terminal::Terminal;
use super::RuntimeError;

/// A false assertion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionFailure {
    message: String,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Why a case failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CaseFailure {
    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionFailure),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("panicked: {0}")]
    Panic(String),
}

pub type CaseResult = Result<(), CaseFailure>;

/// What every terminal of a suite connects with.
#[derive(Clone)]
pub struct CaseEnv {
    config: String,
    connector: Arc<dyn Connector>,
    auto_commit: bool,
}

impl CaseEnv {
    pub fn new(config: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self {
            config: config.into(),
            connector,
            auto_commit: true,
        }
    }

    pub fn with_auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    pub fn config(&self) -> &str {
        &self.config
    }

    /// Opens a connection and starts a terminal on it.
    pub fn start_terminal(&self, name: &str) -> Result<Terminal, RuntimeError> {
        let backend = self
            .connector
            .connect(&self.config, self.auto_commit)
            .map_err(|source| RuntimeError::Connect {
                terminal: name.to_string(),
                source,
            })?;
        Terminal::start(name, backend)
    }
}

impl fmt::Debug for CaseEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseEnv")
            .field("config", &self.config)
            .field("auto_commit", &self.auto_commit)
            .finish_non_exhaustive()
    }
}

/// Terminals started by one case, in start order.
#[derive(Debug, Default)]
pub struct TerminalRegistry {
    terminals: RefCell<Vec<Terminal>>,
}

impl TerminalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a terminal and registers it for teardown.
    pub fn start(&self, name: &str, env: &CaseEnv) -> Result<Terminal, RuntimeError> {
        let terminal = env.start_terminal(name)?;
        self.terminals.borrow_mut().push(terminal.clone());
        Ok(terminal)
    }

    pub fn len(&self) -> usize {
        self.terminals.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.borrow().is_empty()
    }

    pub fn into_inner(self) -> Vec<Terminal> {
        self.terminals.into_inner()
    }
}

/// Runs a case body. A panic inside it becomes [`CaseFailure::Panic`].
pub fn guarded<F>(body: F) -> CaseResult
where
    F: FnOnce() -> CaseResult,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(outcome) => outcome,
        Err(payload) => Err(CaseFailure::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub fn fail_assertion(case: &str, failure: AssertionFailure) -> CaseResult {
    tracing::error!(case, %failure, "test case assertion error");
    Err(CaseFailure::Assertion(failure))
}

pub fn fail_unexpected(case: &str, failure: CaseFailure) -> CaseResult {
    tracing::error!(case, %failure, "test case exception");
    Err(failure)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    pub name: String,
    pub outcome: CaseResult,
}

/// Runs the cases of a generated suite one after another.
#[derive(Debug, Default)]
pub struct SuiteRunner {
    reports: Vec<CaseReport>,
}

impl SuiteRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run<F>(&mut self, name: &str, case: F)
    where
        F: FnOnce() -> CaseResult,
    {
        let span = tracing::info_span!("case", name);
        let _entered = span.enter();
        let outcome = guarded(case);
        match &outcome {
            Ok(()) => tracing::info!("ok"),
            Err(failure) => tracing::warn!(%failure, "FAIL"),
        }
        self.reports.push(CaseReport {
            name: name.to_string(),
            outcome,
        });
    }

    pub fn finish(self) -> SuiteReport {
        let report = SuiteReport {
            cases: self.reports,
        };
        tracing::info!("{}", report);
        report
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|case| case.outcome.is_err())
    }

    pub fn passed(&self) -> usize {
        self.cases.len() - self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for case in self.failures() {
            if let Err(failure) = &case.outcome {
                writeln!(f, "FAIL: {}: {}", case.name, failure)?;
            }
        }
        let plural = if self.cases.len() == 1 { "" } else { "s" };
        writeln!(f, "Ran {} test{}", self.cases.len(), plural)?;
        let failed = self.cases.len() - self.passed();
        if failed == 0 {
            write!(f, "OK")
        } else {
            write!(f, "FAILED (failures={})", failed)
        }
    }
}
