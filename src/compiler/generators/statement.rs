//! Statement Compilation Module
//!
//! This module contains helper functions for compiling IR statements to Rust
//! source. Each function takes `&mut Compiler` to append lines at the
//! current indentation.
//!
//! ## Case layout
//! ```text
//! let terminals = TerminalRegistry::new();
//! let outcome = match guarded(|| -> CaseResult { ...; Ok(()) }) {
//!     Err(CaseFailure::Assertion(failure)) => fail_assertion(case, failure),
//!     Err(failure) => fail_unexpected(case, failure),
//!     Ok(()) => Ok(()),
//! };
//! // close every terminal, then join every terminal
//! ```

use super::expression::{binding, render_expression, string_literal};
use crate::codegen::{CodeGenError, Compiler};
use crate::compiler::runtime::{
    assertion_function, FAIL_ASSERTION, FAIL_UNEXPECTED, GUARD, OUTCOME, REGISTRY, REGISTRY_TYPE,
};
use crate::ir::IRStmt;

pub fn compile_statement(compiler: &mut Compiler, stmt: &IRStmt) -> Result<(), CodeGenError> {
    match stmt {
        IRStmt::RegistryInit => {
            compiler.line(format!("let {} = {}::new();", REGISTRY, REGISTRY_TYPE));
        }
        IRStmt::StartTerminal { name } => {
            compiler.line(format!(
                "let {} = {}.start({}, &self.env)?;",
                binding(name)?,
                REGISTRY,
                string_literal(name)
            ));
        }
        IRStmt::Let { target, value } => {
            compiler.line(format!(
                "let {} = {};",
                binding(target)?,
                render_expression(value)?
            ));
        }
        IRStmt::Expr(expr) => {
            compiler.line(format!("{};", render_expression(expr)?));
        }
        IRStmt::Assert { op, left, right } => {
            compiler.line(format!(
                "{}(&{}, &{})?;",
                assertion_function(*op),
                binding(left)?,
                binding(right)?
            ));
        }
        IRStmt::Guarded { case, body } => compile_guarded(compiler, case, body)?,
        IRStmt::Teardown => compile_teardown(compiler),
    }
    Ok(())
}

/// Compiles the guarded region of a case and the mapping of its failures.
pub fn compile_guarded(
    compiler: &mut Compiler,
    case: &str,
    body: &[IRStmt],
) -> Result<(), CodeGenError> {
    compiler.open(format!(
        "let {} = match {}(|| -> CaseResult {{",
        OUTCOME, GUARD
    ));
    for stmt in body {
        compile_statement(compiler, stmt)?;
    }
    compiler.line("Ok(())");
    compiler.reopen("}) {");

    let case = string_literal(case);
    compiler.line(format!(
        "Err(CaseFailure::Assertion(failure)) => {}({}, failure),",
        FAIL_ASSERTION, case
    ));
    compiler.line(format!("Err(failure) => {}({}, failure),", FAIL_UNEXPECTED, case));
    compiler.line("Ok(()) => Ok(()),");
    compiler.close("};");
    Ok(())
}

/// Compiles the unconditional teardown: every registered terminal is closed
/// before any of them is joined, both in registration order.
pub fn compile_teardown(compiler: &mut Compiler) {
    compiler.line(format!("let {0} = {0}.into_inner();", REGISTRY));
    compiler.open(format!("for term in &{} {{", REGISTRY));
    compiler.line("term.close();");
    compiler.close("}");
    compiler.open(format!("for term in &{} {{", REGISTRY));
    compiler.line("term.join();");
    compiler.close("}");
}
