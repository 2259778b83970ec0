//! Code Generators Module
//!
//! Rendering helpers used by `codegen::Compiler`:
//! - `expression`: literals, bindings and terminal calls as Rust expressions
//! - `statement`: IR statements, including the guarded region and teardown

pub mod expression;
pub mod statement;
