use crate::ast::AssertOp;

/// The operations a generated case may invoke on a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalMethod {
    Execute,
    StoreResult,
    WaitFinish,
    GetResultSet,
    GetLastRetCode,
}

/// A simplified Intermediate Representation for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum IRExpr {
    /// A string literal value.
    Str(String),
    /// An integer literal value.
    Int(i64),
    /// A float literal value.
    Float(f64),
    /// A read of an earlier binding.
    Variable(String),
    /// A call on a terminal, with an optional string argument.
    TerminalCall {
        terminal: String,
        method: TerminalMethod,
        arg: Option<String>,
    },
}

/// A simplified Intermediate Representation for statements.
#[derive(Debug, Clone, PartialEq)]
pub enum IRStmt {
    /// Declares the case's empty terminal registry.
    RegistryInit,
    /// Creates, starts and registers a terminal bound to `name`.
    StartTerminal { name: String },
    /// A binding: `let target = value`.
    Let { target: String, value: IRExpr },
    /// An expression evaluated for its effect.
    Expr(IRExpr),
    /// A call into the assertion API with two bound operands.
    Assert {
        op: AssertOp,
        left: String,
        right: String,
    },
    /// The guarded region of a case. Assertion failures and every other
    /// failure inside `body` are mapped to a failed outcome for `case`.
    Guarded { case: String, body: Vec<IRStmt> },
    /// Closes every registered terminal, then joins them all.
    Teardown,
}

/// One generated test function.
#[derive(Debug, Clone, PartialEq)]
pub struct IRCase {
    /// Name of the generated function, `test_<seq>_<name>`.
    pub function: String,
    pub body: Vec<IRStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IRProgram {
    pub config: String,
    pub cases: Vec<IRCase>,
}
