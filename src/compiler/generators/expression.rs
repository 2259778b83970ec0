//! Expression Rendering Module
//!
//! Turns IR expressions, names and literals into Rust source fragments.

use crate::codegen::CodeGenError;
use crate::compiler::runtime::{is_fallible, terminal_method};
use crate::ir::IRExpr;

/// Words that are keywords in every Rust edition and can still be used as
/// raw identifiers.
const RAW_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try", "typeof",
    "unsized", "virtual", "yield", "gen",
];

/// Names that can never be a binding, not even as raw identifiers.
const FORBIDDEN: &[&str] = &["_", "self", "Self", "super", "crate"];

/// Renders a DSL name as a Rust binding, escaping keywords.
pub fn binding(name: &str) -> Result<String, CodeGenError> {
    if FORBIDDEN.contains(&name) {
        return Err(CodeGenError::InvalidIdentifier(name.to_string()));
    }
    if RAW_KEYWORDS.contains(&name) {
        Ok(format!("r#{}", name))
    } else {
        Ok(name.to_string())
    }
}

/// A normal Rust string literal holding `text`.
pub fn string_literal(text: &str) -> String {
    // `str`'s Debug output is a valid, fully escaped Rust literal.
    format!("{:?}", text)
}

/// A raw Rust string literal holding `text` byte-for-byte, with as many
/// `#` as needed so the text cannot terminate it early.
pub fn raw_string_literal(text: &str) -> String {
    let mut hashes = 1;
    while text.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{text}\"{fence}")
}

/// Renders an expression yielding a runtime `Value` or `()`.
pub fn render_expression(expr: &IRExpr) -> Result<String, CodeGenError> {
    let rendered = match expr {
        IRExpr::Str(text) => format!("Value::from({})", string_literal(text)),
        IRExpr::Int(value) => format!("Value::Int({})", value),
        IRExpr::Float(value) => format!("Value::Float({:?})", value),
        IRExpr::Variable(name) => format!("{}.clone()", binding(name)?),
        IRExpr::TerminalCall {
            terminal,
            method,
            arg,
        } => {
            let arg = arg.as_deref().map(string_literal).unwrap_or_default();
            let suffix = if is_fallible(*method) { "?" } else { "" };
            format!(
                "{}.{}({}){}",
                binding(terminal)?,
                terminal_method(*method),
                arg,
                suffix
            )
        }
    };
    Ok(rendered)
}
