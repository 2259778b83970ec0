use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use case_compiler::{compile, error, write_output, OUTPUT_FILE};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Compiles a test-case file into a Rust module of runnable cases.
#[derive(Parser)]
#[command(name = "case-compiler")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the test-case file
    file: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let filename = cli.file.display().to_string();

    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error opening file {}: {}", filename, e);
            return ExitCode::FAILURE;
        }
    };

    let code = match compile(&source) {
        Ok(code) => code,
        Err(e) => {
            error::display_compile_error(&source, &filename, &e);
            return ExitCode::FAILURE;
        }
    };

    match write_output(Path::new("."), &code) {
        Ok(path) => {
            tracing::info!(input = %filename, output = %path.display(), "generated test cases");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing {}: {}", OUTPUT_FILE, e);
            ExitCode::FAILURE
        }
    }
}
