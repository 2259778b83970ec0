pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod lowering;
pub mod parser;
pub mod runtime;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the file the CLI writes the generated module to.
pub const OUTPUT_FILE: &str = "real_test.rs";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] lexer::LexError),
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
    #[error(transparent)]
    Lowering(#[from] lowering::LoweringError),
    #[error(transparent)]
    CodeGen(#[from] codegen::CodeGenError),
}

/// Compiles test-case source into the text of a Rust module.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = lexer::tokenize(source)?;
    let spec = parser::parse_program(&tokens)?;
    let ir = lowering::lower_program(&spec)?;
    let code = codegen::Compiler::new().compile_program(&ir)?;
    Ok(code)
}

/// Writes generated code to [`OUTPUT_FILE`] inside `dir`, replacing any
/// previous output, and returns the path written.
pub fn write_output(dir: &Path, code: &str) -> io::Result<PathBuf> {
    let path = dir.join(OUTPUT_FILE);
    std::fs::write(&path, code)?;
    tracing::debug!(path = %path.display(), bytes = code.len(), "wrote output");
    Ok(path)
}
