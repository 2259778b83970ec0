/// A whole source file: one configuration block followed by the cases.
#[derive(Debug, Clone, PartialEq)]
pub struct Spec {
    /// Connection parameters with the string delimiters removed.
    pub config: String,
    pub cases: Vec<Case>,
}

/// `TestCase <name> { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub name: String,
    pub statements: Vec<Statement>,
    pub line: usize,
}

/// One `;`-terminated statement inside a case.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A query dispatched to a terminal, e.g. `a: "SELECT 1"`.
    Scoped(ScopedStatement),
    /// `Terminal a b c`
    Declaration(Vec<String>),
    /// `x = <expression>`
    Assignment { target: String, value: Expression },
    /// `expect_equal(<expression>, <expression>)`
    Assertion {
        op: AssertOp,
        left: Expression,
        right: Expression,
    },
}

/// Which terminal a scoped statement runs on.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// The implicit per-case terminal.
    Default,
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Block until the terminal has drained its queue.
    Sync,
    /// Fire and forget.
    Async,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopedStatement {
    pub target: Target,
    pub dispatch: Dispatch,
    pub query: String,
    /// Set by `ResultSet(...)`: the rows must be fetched and kept.
    pub fetch_result: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    String(String),
    /// The literal as written, e.g. `"42"` or `"0.5"`.
    Number(String),
    Variable(String),
    Scoped(ScopedStatement),
}

/// The assertion operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertOp {
    Equal,
    NotEqual,
    StrEqual,
    StrNotEqual,
    SubStr,
    NoSubStr,
    In,
    NotIn,
}
