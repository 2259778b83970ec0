//! Compiler Module
//!
//! Helper infrastructure for turning the IR into Rust source.
//!
//! ## Architecture
//! - `runtime`: names of the runtime items generated code calls into
//! - `generators`: statement and expression rendering used by `codegen::Compiler`

pub mod generators;
pub mod runtime;
