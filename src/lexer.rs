//! Lexical analysis for the test-case language.
//!
//! The lexer is an iterator over `Result<Token, LexError>`. It stops at the
//! first error; [`tokenize`] collects the whole stream and appends `Eof`.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

/// Every kind of token the language knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    RawString,
    NormalString,
    Number,
    LBrace,
    RBrace,
    Colon,
    Comma,
    Semicolon,
    EqualSign,
    LParen,
    RParen,
    Id,

    // Reserved words
    Async,
    If,
    Then,
    Else,
    While,
    TestCase,
    Terminal,
    ResultSet,
    ExpectEqual,
    ExpectNotEqual,
    ExpectStrEqual,
    ExpectStrNotEqual,
    ExpectSubStr,
    ExpectNoSubStr,
    ExpectIn,
    ExpectNotIn,
    Config,

    Eof,
}

impl TokenKind {
    /// Maps a word to its reserved kind, if it is one.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "Async" => TokenKind::Async,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "TestCase" => TokenKind::TestCase,
            "Terminal" => TokenKind::Terminal,
            "ResultSet" => TokenKind::ResultSet,
            "expect_equal" => TokenKind::ExpectEqual,
            "expect_not_equal" => TokenKind::ExpectNotEqual,
            "expect_str_equal" => TokenKind::ExpectStrEqual,
            "expect_str_not_equal" => TokenKind::ExpectStrNotEqual,
            "expect_substr" => TokenKind::ExpectSubStr,
            "expect_no_substr" => TokenKind::ExpectNoSubStr,
            "expect_in" => TokenKind::ExpectIn,
            "expect_not_in" => TokenKind::ExpectNotIn,
            "Config" => TokenKind::Config,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_string(self) -> bool {
        matches!(self, TokenKind::RawString | TokenKind::NormalString)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::RawString => "raw string",
            TokenKind::NormalString => "string",
            TokenKind::Number => "number",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::EqualSign => "'='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Id => "identifier",
            TokenKind::Async => "'Async'",
            TokenKind::If => "'if'",
            TokenKind::Then => "'then'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::TestCase => "'TestCase'",
            TokenKind::Terminal => "'Terminal'",
            TokenKind::ResultSet => "'ResultSet'",
            TokenKind::ExpectEqual => "'expect_equal'",
            TokenKind::ExpectNotEqual => "'expect_not_equal'",
            TokenKind::ExpectStrEqual => "'expect_str_equal'",
            TokenKind::ExpectStrNotEqual => "'expect_str_not_equal'",
            TokenKind::ExpectSubStr => "'expect_substr'",
            TokenKind::ExpectNoSubStr => "'expect_no_substr'",
            TokenKind::ExpectIn => "'expect_in'",
            TokenKind::ExpectNotIn => "'expect_not_in'",
            TokenKind::Config => "'Config'",
            TokenKind::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// A token with its source position. Lines and columns are 1-based,
/// `offset` is the byte offset of the first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Token {
    /// The literal value of a string token with its delimiters removed.
    ///
    /// Raw strings are returned verbatim. In normal strings `\"` and `\\`
    /// collapse to the escaped character; any other backslash is kept.
    pub fn string_value(&self) -> String {
        match self.kind {
            TokenKind::RawString => self.lexeme[3..self.lexeme.len() - 3].to_string(),
            TokenKind::NormalString => unescape(&self.lexeme[1..self.lexeme.len() - 1]),
            _ => self.lexeme.clone(),
        }
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next @ ('"' | '\\')) = chars.peek() {
                out.push(next);
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("[Lex Error] Line:{line},Column:{column}: unexpected character {ch:?}")]
    UnexpectedCharacter {
        ch: char,
        line: usize,
        column: usize,
        offset: usize,
    },
    #[error("[Lex Error] Line:{line},Column:{column}: unterminated string literal")]
    UnterminatedString {
        line: usize,
        column: usize,
        offset: usize,
    },
}

impl LexError {
    pub fn position(&self) -> (usize, usize, usize) {
        match *self {
            LexError::UnexpectedCharacter {
                line,
                column,
                offset,
                ..
            }
            | LexError::UnterminatedString {
                line,
                column,
                offset,
            } => (line, column, offset),
        }
    }
}

/// Streaming lexer over a source string.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            failed: false,
        }
    }

    /// Current byte offset, or the source length at end of input.
    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(offset, _)| offset)
            .unwrap_or(self.source.len())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '#' => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn starts_with(&self, offset: usize, pattern: &str) -> bool {
        self.source[offset..].starts_with(pattern)
    }

    fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        self.skip_trivia();

        let (line, column, start) = (self.line, self.column, self.offset());
        let c = self.peek()?;

        let kind = match c {
            '"' if self.starts_with(start, "\"\"\"") => {
                if let Err(err) = self.raw_string(line, column, start) {
                    return Some(Err(err));
                }
                TokenKind::RawString
            }
            '"' => {
                if let Err(err) = self.normal_string(line, column, start) {
                    return Some(Err(err));
                }
                TokenKind::NormalString
            }
            '0'..='9' => {
                self.number();
                TokenKind::Number
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                    self.bump();
                }
                let source = self.source;
                let end = self.offset();
                let word = &source[start..end];
                TokenKind::keyword(word).unwrap_or(TokenKind::Id)
            }
            _ => {
                let kind = match c {
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    '=' => TokenKind::EqualSign,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    _ => {
                        return Some(Err(LexError::UnexpectedCharacter {
                            ch: c,
                            line,
                            column,
                            offset: start,
                        }))
                    }
                };
                self.bump();
                kind
            }
        };

        let end = self.offset();
        Some(Ok(Token {
            kind,
            lexeme: self.source[start..end].to_string(),
            line,
            column,
            offset: start,
        }))
    }

    fn raw_string(&mut self, line: usize, column: usize, start: usize) -> Result<(), LexError> {
        for _ in 0..3 {
            self.bump();
        }
        loop {
            let offset = self.offset();
            if self.starts_with(offset, "\"\"\"") {
                for _ in 0..3 {
                    self.bump();
                }
                return Ok(());
            }
            if self.bump().is_none() {
                return Err(LexError::UnterminatedString {
                    line,
                    column,
                    offset: start,
                });
            }
        }
    }

    fn normal_string(&mut self, line: usize, column: usize, start: usize) -> Result<(), LexError> {
        self.bump();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    return Ok(());
                }
                Some('\\') => {
                    self.bump();
                    if matches!(self.peek(), Some('"' | '\\')) {
                        self.bump();
                    }
                }
                Some('\n') | None => {
                    return Err(LexError::UnterminatedString {
                        line,
                        column,
                        offset: start,
                    })
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn number(&mut self) {
        while matches!(self.peek(), Some('0'..='9')) {
            self.bump();
        }
        // The fraction only counts when a digit follows the point.
        let offset = self.offset();
        let mut rest = self.source[offset..].chars();
        if rest.next() == Some('.') && matches!(rest.next(), Some('0'..='9')) {
            self.bump();
            while matches!(self.peek(), Some('0'..='9')) {
                self.bump();
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_token();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

/// Lexes the whole source, appending an `Eof` token positioned after the
/// last character.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    for token in lexer.by_ref() {
        tokens.push(token?);
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        line: lexer.line,
        column: lexer.column,
        offset: source.len(),
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_punctuation_and_keywords() {
        assert_eq!(
            kinds("Config { } : , ; = ( ) Async TestCase"),
            vec![
                TokenKind::Config,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::EqualSign,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Async,
                TokenKind::TestCase,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_reserved_words_are_case_sensitive() {
        assert_eq!(
            kinds("async If while expect_in"),
            vec![
                TokenKind::Id,
                TokenKind::Id,
                TokenKind::While,
                TokenKind::ExpectIn,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_with_fraction() {
        let tokens = tokenize("12 3.25").unwrap();
        assert_eq!(tokens[0].lexeme, "12");
        assert_eq!(tokens[1].lexeme, "3.25");
        assert_eq!(tokens[1].kind, TokenKind::Number);
    }

    #[test]
    fn test_trailing_point_is_not_part_of_number() {
        let err = tokenize("1.").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                ch: '.',
                line: 1,
                column: 2,
                offset: 1
            }
        );
    }

    #[test]
    fn test_raw_string_spans_lines() {
        let tokens = tokenize("\"\"\"a\nb\"\"\" x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::RawString);
        assert_eq!(tokens[0].string_value(), "a\nb");
        assert_eq!((tokens[1].line, tokens[1].column), (2, 6));
    }

    #[test]
    fn test_normal_string_escapes() {
        let tokens = tokenize(r#""say \"hi\" \\ \n""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::NormalString);
        assert_eq!(tokens[0].string_value(), r#"say "hi" \ \n"#);
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = tokenize("# heading\n  ; # trailing\n:").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (2, 3));
        assert_eq!((tokens[1].line, tokens[1].column), (3, 1));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("x = \"abc\n").unwrap_err();
        assert!(matches!(
            err,
            LexError::UnterminatedString {
                line: 1,
                column: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_lexer_halts_after_error() {
        let items: Vec<_> = Lexer::new("a @ b").collect();
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }
}
