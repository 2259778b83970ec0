use ariadne::{CharSet, Color, Config, Label, Report, ReportKind, Source};

use crate::CompileError;

/// Where an error points: 1-based line and column plus a byte offset.
struct Position {
    line: usize,
    column: usize,
    offset: usize,
    width: usize,
}

fn position(error: &CompileError) -> Option<Position> {
    match error {
        CompileError::Lex(err) => {
            let (line, column, offset) = err.position();
            Some(Position {
                line,
                column,
                offset,
                width: 1,
            })
        }
        CompileError::Parse(err) => {
            let (line, column, offset) = err.position();
            let width = match err {
                crate::parser::ParseError::UnexpectedToken { lexeme, .. } => lexeme.chars().count(),
                crate::parser::ParseError::UnexpectedEof { .. } => 1,
            };
            Some(Position {
                line,
                column,
                offset,
                width,
            })
        }
        CompileError::Lowering(_) | CompileError::CodeGen(_) => None,
    }
}

fn title(error: &CompileError) -> &'static str {
    match error {
        CompileError::Lex(_) => "Lex error",
        CompileError::Parse(_) => "Parse error",
        CompileError::Lowering(_) => "Lowering error",
        CompileError::CodeGen(_) => "Code generation error",
    }
}

/// Builds the report for `error` and writes it to `out`.
///
/// Positioned errors are followed by the offending source line with a `^`
/// under the column.
pub fn write_compile_error(
    source: &str,
    filename: &str,
    error: &CompileError,
    out: &mut impl std::io::Write,
) -> std::io::Result<()> {
    // Report spans count characters, diagnostics carry byte offsets.
    let char_len = source.chars().count();
    let (start, width, label) = match position(error) {
        Some(pos) => {
            let start = source[..pos.offset.min(source.len())].chars().count();
            (
                start,
                pos.width.max(1),
                format!("Line:{},Column:{}", pos.line, pos.column),
            )
        }
        None => (0, 1, error.to_string()),
    };
    let start = start.min(char_len.saturating_sub(1));
    let end = (start + width).min(char_len.max(start + 1));

    let report = Report::build(ReportKind::Error, filename, start)
        .with_config(
            Config::default()
                .with_char_set(CharSet::Ascii)
                .with_color(false),
        )
        .with_message(format!("{}: {}", title(error), error))
        .with_label(
            Label::new((filename, start..end))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish();
    report.write((filename, Source::from(source)), &mut *out)?;

    match position(error) {
        Some(pos) => write_fragment(source, pos.offset, out),
        None => Ok(()),
    }
}

/// Writes the source line holding `offset` with a `^` under it.
fn write_fragment(source: &str, offset: usize, out: &mut impl std::io::Write) -> std::io::Result<()> {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = source[offset..].find('\n').map_or(source.len(), |i| offset + i);
    // Tabs stay tabs so the caret lines up with the excerpt.
    let pad: String = source[start..offset]
        .chars()
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();

    writeln!(out, "[Cases Code Fragment]")?;
    writeln!(out, "{}", &source[start..end])?;
    writeln!(out, "{}^", pad)
}

/// Displays a compile error on stderr with source context.
pub fn display_compile_error(source: &str, filename: &str, error: &CompileError) {
    let mut stderr = std::io::stderr().lock();
    if write_compile_error(source, filename, error, &mut stderr).is_err() {
        eprintln!("{}", error);
    }
}
