use crate::ast::{Case, Dispatch, Expression, ScopedStatement, Spec, Statement, Target};
use crate::compiler::runtime::{
    DEFAULT_RESULT, DEFAULT_TERMINAL, NAMED_RESULT, OUTCOME, REGISTRY, TEMP_PREFIX,
};
use crate::ir::{IRCase, IRExpr, IRProgram, IRStmt, TerminalMethod};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LoweringError {
    #[error("Numeric literal out of range: {0}")]
    NumberOutOfRange(String),
    #[error("'{name}' in case '{case}' clashes with a name the generated case uses")]
    ReservedName { name: String, case: String },
}

/// Names of items a user binding would shadow in the generated case.
const RESERVED_NAMES: &[&str] = &[
    REGISTRY,
    OUTCOME,
    DEFAULT_TERMINAL,
    "CONFIG",
    "Some",
    "None",
    "Ok",
    "Err",
];

fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
        || name
            .strip_prefix(TEMP_PREFIX)
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// What a scoped statement hands back to the production that contains it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeResult {
    /// The terminal the query ran on.
    pub terminal: String,
    /// Whether the rows were fetched into the result store.
    pub fetched: bool,
    /// The result-store key the rows were stored under.
    pub result_name: &'static str,
}

/// Lowers a parsed case file to the IR.
pub fn lower_program(spec: &Spec) -> Result<IRProgram, LoweringError> {
    Emitter::new().lower_spec(spec)
}

/// Emitter state for one compilation run.
///
/// Cases are numbered from 1 across the whole run so that cases sharing a
/// name still get distinct functions. Temporaries are numbered per case.
#[derive(Debug)]
pub struct Emitter {
    case_seq: usize,
    case_name: String,
    temp_seq: usize,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            case_seq: 1,
            case_name: String::new(),
            temp_seq: 0,
        }
    }

    pub fn lower_spec(&mut self, spec: &Spec) -> Result<IRProgram, LoweringError> {
        let cases = spec
            .cases
            .iter()
            .map(|case| self.lower_case(case))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IRProgram {
            config: spec.config.clone(),
            cases,
        })
    }

    fn lower_case(&mut self, case: &Case) -> Result<IRCase, LoweringError> {
        let function = self.open_case(&case.name);
        tracing::debug!(case = %case.name, function = %function, "lowering case");

        let mut guarded = vec![IRStmt::StartTerminal {
            name: DEFAULT_TERMINAL.to_string(),
        }];
        for statement in &case.statements {
            self.lower_statement(statement, &mut guarded)?;
        }

        Ok(IRCase {
            body: vec![
                IRStmt::RegistryInit,
                IRStmt::Guarded {
                    case: function.clone(),
                    body: guarded,
                },
                IRStmt::Teardown,
            ],
            function,
        })
    }

    fn open_case(&mut self, name: &str) -> String {
        let function = format!("test_{}_{}", self.case_seq, name);
        self.case_seq += 1;
        self.case_name = name.to_string();
        self.temp_seq = 0;
        function
    }

    fn user_name(&self, name: &str) -> Result<String, LoweringError> {
        if is_reserved(name) {
            return Err(LoweringError::ReservedName {
                name: name.to_string(),
                case: self.case_name.clone(),
            });
        }
        Ok(name.to_string())
    }

    fn fresh_temp(&mut self) -> String {
        self.temp_seq += 1;
        format!("{}{}", TEMP_PREFIX, self.temp_seq)
    }

    fn lower_statement(
        &mut self,
        statement: &Statement,
        out: &mut Vec<IRStmt>,
    ) -> Result<(), LoweringError> {
        match statement {
            Statement::Scoped(scoped) => {
                self.lower_scoped(scoped, out)?;
            }
            Statement::Declaration(terms) => {
                for name in terms {
                    let name = self.user_name(name)?;
                    out.push(IRStmt::StartTerminal { name });
                }
            }
            Statement::Assignment { target, value } => {
                let temp = self.lower_expression(value, out)?;
                out.push(IRStmt::Let {
                    target: self.user_name(target)?,
                    value: IRExpr::Variable(temp),
                });
            }
            Statement::Assertion { op, left, right } => {
                let left = self.lower_expression(left, out)?;
                let right = self.lower_expression(right, out)?;
                out.push(IRStmt::Assert {
                    op: *op,
                    left,
                    right,
                });
            }
        }
        Ok(())
    }

    /// Emits the dispatch of one query and reports where its result lives.
    pub fn lower_scoped(
        &mut self,
        scoped: &ScopedStatement,
        out: &mut Vec<IRStmt>,
    ) -> Result<ScopeResult, LoweringError> {
        let (terminal, result_name) = match &scoped.target {
            Target::Default => (DEFAULT_TERMINAL.to_string(), DEFAULT_RESULT),
            Target::Named(name) => (self.user_name(name)?, NAMED_RESULT),
        };
        tracing::trace!(
            case = %self.case_name,
            terminal = %terminal,
            dispatch = ?scoped.dispatch,
            fetch = scoped.fetch_result,
            "lowering scoped statement"
        );

        let call = |method, arg: Option<&str>| {
            IRStmt::Expr(IRExpr::TerminalCall {
                terminal: terminal.clone(),
                method,
                arg: arg.map(str::to_string),
            })
        };

        out.push(call(TerminalMethod::Execute, Some(&scoped.query)));
        if scoped.fetch_result {
            out.push(call(TerminalMethod::StoreResult, Some(result_name)));
        }
        if scoped.dispatch == Dispatch::Sync {
            out.push(call(TerminalMethod::WaitFinish, None));
        }

        Ok(ScopeResult {
            terminal,
            fetched: scoped.fetch_result,
            result_name,
        })
    }

    /// Binds the value of an expression to a fresh temporary and returns
    /// the temporary's name.
    fn lower_expression(
        &mut self,
        expression: &Expression,
        out: &mut Vec<IRStmt>,
    ) -> Result<String, LoweringError> {
        let value = match expression {
            Expression::String(text) => IRExpr::Str(text.clone()),
            Expression::Number(literal) => lower_number(literal)?,
            Expression::Variable(name) => IRExpr::Variable(self.user_name(name)?),
            Expression::Scoped(scoped) => {
                let scope = self.lower_scoped(scoped, out)?;
                if scope.fetched {
                    IRExpr::TerminalCall {
                        terminal: scope.terminal,
                        method: TerminalMethod::GetResultSet,
                        arg: Some(scope.result_name.to_string()),
                    }
                } else {
                    IRExpr::TerminalCall {
                        terminal: scope.terminal,
                        method: TerminalMethod::GetLastRetCode,
                        arg: None,
                    }
                }
            }
        };

        let temp = self.fresh_temp();
        out.push(IRStmt::Let {
            target: temp.clone(),
            value,
        });
        Ok(temp)
    }
}

fn lower_number(literal: &str) -> Result<IRExpr, LoweringError> {
    if literal.contains('.') {
        literal
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(IRExpr::Float)
            .ok_or_else(|| LoweringError::NumberOutOfRange(literal.to_string()))
    } else {
        literal
            .parse::<i64>()
            .map(IRExpr::Int)
            .map_err(|_| LoweringError::NumberOutOfRange(literal.to_string()))
    }
}
