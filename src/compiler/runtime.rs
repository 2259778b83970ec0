//! Runtime API Surface
//!
//! This module names the items of `case_compiler::runtime` that generated
//! code calls into, so the contract between generator and runtime lives in
//! one place.
//!
//! ## Contract
//! - Terminal API: `execute`, `store_result`, `wait_finish`,
//!   `get_result_set`, `get_last_ret_code`, `close`, `join`
//! - Assertion API: the eight `expect_*` functions
//! - Scaffold: `TerminalRegistry`, `guarded`, `fail_assertion`,
//!   `fail_unexpected`, `SuiteRunner`

use crate::ast::AssertOp;
use crate::ir::TerminalMethod;

/// Module path glob-imported by every generated program.
pub const PRELUDE: &str = "case_compiler::runtime::prelude";

/// The implicit terminal every case starts with.
pub const DEFAULT_TERMINAL: &str = "case_terminal";

/// Result-store key used by scoped statements on the default terminal.
pub const DEFAULT_RESULT: &str = "result";

/// Result-store key used by scoped statements on a named terminal.
pub const NAMED_RESULT: &str = "scope_term_result";

/// Binding that holds a case's terminal registry.
pub const REGISTRY: &str = "terminals";

/// Binding that holds a case's outcome until teardown has run.
pub const OUTCOME: &str = "outcome";

/// Type of the per-case terminal registry.
pub const REGISTRY_TYPE: &str = "TerminalRegistry";

/// Runs a case body, turning panics into failures.
pub const GUARD: &str = "guarded";

/// Records an assertion failure for a case.
pub const FAIL_ASSERTION: &str = "fail_assertion";

/// Records any other failure for a case.
pub const FAIL_UNEXPECTED: &str = "fail_unexpected";

/// Prefix of expression temporaries.
pub const TEMP_PREFIX: &str = "tmp_";

/// Method name on `Terminal` for a given operation.
pub fn terminal_method(method: TerminalMethod) -> &'static str {
    match method {
        TerminalMethod::Execute => "execute",
        TerminalMethod::StoreResult => "store_result",
        TerminalMethod::WaitFinish => "wait_finish",
        TerminalMethod::GetResultSet => "get_result_set",
        TerminalMethod::GetLastRetCode => "get_last_ret_code",
    }
}

/// Whether the call can fail and must be followed by `?`.
pub fn is_fallible(method: TerminalMethod) -> bool {
    matches!(method, TerminalMethod::GetResultSet)
}

/// Assertion function for an operator.
pub fn assertion_function(op: AssertOp) -> &'static str {
    match op {
        AssertOp::Equal => "expect_equal",
        AssertOp::NotEqual => "expect_not_equal",
        AssertOp::StrEqual => "expect_str_equal",
        AssertOp::StrNotEqual => "expect_str_not_equal",
        AssertOp::SubStr => "expect_substr",
        AssertOp::NoSubStr => "expect_no_substr",
        AssertOp::In => "expect_in",
        AssertOp::NotIn => "expect_not_in",
    }
}
