use crate::compiler::generators::{expression, statement};
use crate::compiler::runtime::{OUTCOME, PRELUDE};
use crate::ir::{IRCase, IRProgram};
use thiserror::Error;

const INDENT: &str = "    ";

#[derive(Debug, Error, PartialEq)]
pub enum CodeGenError {
    #[error("'{0}' cannot be used as a name in generated code")]
    InvalidIdentifier(String),
}

/// Renders an [`IRProgram`] as a Rust module driving the terminal runtime.
///
/// The compiler owns the output buffer and the indentation level; the
/// helpers in `compiler::generators` append to it through [`Compiler::line`],
/// [`Compiler::open`] and [`Compiler::close`].
pub struct Compiler {
    out: String,
    indent: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    pub fn compile_program(mut self, program: &IRProgram) -> Result<String, CodeGenError> {
        self.line("// Generated by case-compiler. Do not edit.");
        self.line("#![allow(unused_variables, non_snake_case)]");
        self.blank();
        self.line("use std::sync::Arc;");
        self.blank();
        self.line(format!("use {}::*;", PRELUDE));
        self.blank();
        self.line(format!(
            "pub const CONFIG: &str = {};",
            expression::raw_string_literal(&program.config)
        ));
        self.blank();

        self.open("pub struct GeneratedCases {");
        self.line("env: CaseEnv,");
        self.close("}");
        self.blank();

        self.open("impl GeneratedCases {");
        self.open("pub fn new(connector: Arc<dyn Connector>) -> Self {");
        self.open("Self {");
        self.line("env: CaseEnv::new(CONFIG, connector),");
        self.close("}");
        self.close("}");
        for case in &program.cases {
            self.blank();
            self.compile_case(case)?;
        }
        self.close("}");
        self.blank();

        self.open("pub fn run_all(connector: Arc<dyn Connector>) -> SuiteReport {");
        self.line("let cases = GeneratedCases::new(connector);");
        self.line("let mut suite = SuiteRunner::new();");
        for case in &program.cases {
            self.line(format!(
                "suite.run({}, || cases.{}());",
                expression::string_literal(&case.function),
                case.function
            ));
        }
        self.line("suite.finish()");
        self.close("}");

        tracing::debug!(
            cases = program.cases.len(),
            bytes = self.out.len(),
            "generated program"
        );
        Ok(self.out)
    }

    fn compile_case(&mut self, case: &IRCase) -> Result<(), CodeGenError> {
        self.open(format!("pub fn {}(&self) -> CaseResult {{", case.function));
        for stmt in &case.body {
            statement::compile_statement(self, stmt)?;
        }
        self.line(OUTCOME);
        self.close("}");
        Ok(())
    }

    /// Appends one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Appends a line that opens a block and indents what follows.
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent += 1;
    }

    /// Dedents and appends the line that closes a block.
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// Closes one block and opens the next on the same line, as in `}) {`.
    pub fn reopen(&mut self, text: impl AsRef<str>) {
        self.close(text);
        self.indent += 1;
    }
}
