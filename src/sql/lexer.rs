//! SQL lexer for DDL statements.

use std::iter::Peekable;
use std::str::Chars;

/// SQL token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Add,
    Table,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Constraint,
    Index,
    If,
    Exists,
    Check,

    // Identifiers and literals
    Ident(String),
    /// Identifier written in quotes; never a keyword.
    Quoted(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    /// Any other punctuation (`=`, `:`, `+`, ...).
    Symbol(char),

    // End of input
    Eof,
}

impl Token {
    /// Identifier text for bare and quoted identifiers.
    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Ident(s) | Token::Quoted(s) => Some(s),
            _ => None,
        }
    }

    /// Reserved words recognised by the lexer. In name positions they are
    /// read back as plain identifiers.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Create
                | Token::Alter
                | Token::Add
                | Token::Table
                | Token::Only
                | Token::Primary
                | Token::Key
                | Token::Foreign
                | Token::References
                | Token::Not
                | Token::Null
                | Token::Unique
                | Token::Default
                | Token::On
                | Token::Constraint
                | Token::Index
                | Token::If
                | Token::Exists
                | Token::Check
        )
    }

    /// True for a bare identifier matching `word` case-insensitively.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(word))
    }
}

/// 1-based line/column location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A token with its source location and byte offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub position: Position,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated quoted identifier starting at {0}")]
    UnterminatedIdentifier(Position),
    #[error("unterminated string literal starting at {0}")]
    UnterminatedString(Position),
    #[error("unterminated block comment starting at {0}")]
    UnterminatedComment(Position),
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            Self::UnterminatedIdentifier(p)
            | Self::UnterminatedString(p)
            | Self::UnterminatedComment(p) => *p,
        }
    }
}

/// SQL lexer.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current_char: Option<char>,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current_char = chars.next();
        Self {
            chars,
            current_char,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char {
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.current_char = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char {
            if c == '\n' {
                self.advance();
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self, start: Position) -> Result<(), LexError> {
        self.advance(); // skip /
        self.advance(); // skip *
        while let Some(c) = self.current_char {
            self.advance();
            if c == '*' && self.current_char == Some('/') {
                self.advance();
                return Ok(());
            }
        }
        Err(LexError::UnterminatedComment(start))
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    fn read_quoted_identifier(&mut self, close: char, start: Position) -> Result<String, LexError> {
        self.advance(); // skip opening quote
        let mut ident = String::new();
        while let Some(c) = self.current_char {
            if c == close {
                // Doubled closing quote is an escaped quote
                if self.peek() == Some(&close) {
                    ident.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return Ok(ident);
                }
            } else {
                ident.push(c);
                self.advance();
            }
        }
        Err(LexError::UnterminatedIdentifier(start))
    }

    fn read_string(&mut self, start: Position) -> Result<String, LexError> {
        self.advance(); // skip opening quote
        let mut s = String::new();
        while let Some(c) = self.current_char {
            if c == '\'' {
                if self.peek() == Some(&'\'') {
                    s.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return Ok(s);
                }
            } else if c == '\\' {
                self.advance();
                if let Some(escaped) = self.current_char {
                    match escaped {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        'r' => s.push('\r'),
                        _ => s.push(escaped),
                    }
                    self.advance();
                }
            } else {
                s.push(c);
                self.advance();
            }
        }
        Err(LexError::UnterminatedString(start))
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        let mut has_dot = false;

        if self.current_char == Some('-') {
            num.push('-');
            self.advance();
        }

        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else if c == '.' && !has_dot {
                has_dot = true;
                num.push(c);
                self.advance();
            } else {
                break;
            }
        }
        num
    }

    fn keyword_or_ident(s: String) -> Token {
        match s.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "ALTER" => Token::Alter,
            "ADD" => Token::Add,
            "TABLE" => Token::Table,
            "ONLY" => Token::Only,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "FOREIGN" => Token::Foreign,
            "REFERENCES" => Token::References,
            "NOT" => Token::Not,
            "NULL" => Token::Null,
            "UNIQUE" => Token::Unique,
            "DEFAULT" => Token::Default,
            "ON" => Token::On,
            "CONSTRAINT" => Token::Constraint,
            "INDEX" => Token::Index,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "CHECK" => Token::Check,
            _ => Token::Ident(s),
        }
    }

    fn next_lexeme(&mut self) -> Result<Lexeme, LexError> {
        loop {
            self.skip_whitespace();
            let start = self.position();
            let offset = self.offset;

            let current = self.current_char;
            let token = match current {
                None => Token::Eof,

                Some('-') => {
                    if self.peek() == Some(&'-') {
                        self.skip_line_comment();
                        continue;
                    } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        Token::Num(self.read_number())
                    } else {
                        self.advance();
                        Token::Symbol('-')
                    }
                }

                Some('/') => {
                    if self.peek() == Some(&'*') {
                        self.skip_block_comment(start)?;
                        continue;
                    }
                    self.advance();
                    Token::Symbol('/')
                }

                Some('#') => {
                    self.skip_line_comment();
                    continue;
                }

                Some('(') => {
                    self.advance();
                    Token::LParen
                }
                Some(')') => {
                    self.advance();
                    Token::RParen
                }
                Some(',') => {
                    self.advance();
                    Token::Comma
                }
                Some(';') => {
                    self.advance();
                    Token::Semicolon
                }
                Some('.') => {
                    self.advance();
                    Token::Dot
                }

                Some('"') => Token::Quoted(self.read_quoted_identifier('"', start)?),
                Some('`') => Token::Quoted(self.read_quoted_identifier('`', start)?),
                Some('[') => Token::Quoted(self.read_quoted_identifier(']', start)?),

                Some('\'') => Token::Str(self.read_string(start)?),

                Some(c) if c.is_ascii_digit() => Token::Num(self.read_number()),

                Some(c) if c.is_alphabetic() || c == '_' => {
                    Self::keyword_or_ident(self.read_identifier())
                }

                Some(c) => {
                    self.advance();
                    Token::Symbol(c)
                }
            };
            return Ok(Lexeme {
                token,
                position: start,
                start: offset,
                end: self.offset,
            });
        }
    }

    /// Collect all tokens with positions. The last lexeme is always `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Lexeme>, LexError> {
        let mut lexemes = Vec::new();
        loop {
            let lexeme = self.next_lexeme()?;
            let done = lexeme.token == Token::Eof;
            lexemes.push(lexeme);
            if done {
                break;
            }
        }
        Ok(lexemes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Lexer::new(sql)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|l| l.token)
            .collect()
    }

    #[test]
    fn test_simple_create_table() {
        let tokens = tokens("CREATE TABLE users (id INT);");

        assert_eq!(tokens[0], Token::Create);
        assert_eq!(tokens[1], Token::Table);
        assert_eq!(tokens[2], Token::Ident("users".to_string()));
        assert_eq!(tokens[3], Token::LParen);
        assert_eq!(tokens[4], Token::Ident("id".to_string()));
        assert_eq!(tokens[5], Token::Ident("INT".to_string()));
        assert_eq!(tokens[6], Token::RParen);
        assert_eq!(tokens[7], Token::Semicolon);
        assert_eq!(tokens[8], Token::Eof);
    }

    #[test]
    fn test_quoted_identifiers() {
        let tokens = tokens(r#"CREATE TABLE "User Table" (`column name` INT, [key] TEXT);"#);

        assert_eq!(tokens[2], Token::Quoted("User Table".to_string()));
        assert_eq!(tokens[4], Token::Quoted("column name".to_string()));
        assert_eq!(tokens[7], Token::Quoted("key".to_string()));
    }

    #[test]
    fn test_doubled_quote_escape() {
        let tokens = tokens(r#""say ""hi""""#);
        assert_eq!(tokens[0], Token::Quoted(r#"say "hi""#.to_string()));
    }

    #[test]
    fn test_comments() {
        let tokens = tokens("-- comment\nCREATE /* block */ TABLE t (id INT); # trailing");

        assert_eq!(tokens[0], Token::Create);
        assert_eq!(tokens[1], Token::Table);
    }

    #[test]
    fn test_positions_and_offsets() {
        let sql = "CREATE TABLE t (\n  id INT\n);";
        let lexemes = Lexer::new(sql).tokenize().unwrap();
        let id = &lexemes[4];
        assert_eq!(id.token, Token::Ident("id".to_string()));
        assert_eq!(id.position, Position { line: 2, column: 3 });
        assert_eq!(&sql[id.start..id.end], "id");
    }

    #[test]
    fn test_position_after_comment() {
        let sql = "/* c */ CREATE";
        let lexemes = Lexer::new(sql).tokenize().unwrap();
        assert_eq!(lexemes[0].token, Token::Create);
        assert_eq!(&sql[lexemes[0].start..lexemes[0].end], "CREATE");
        assert_eq!(lexemes[0].position.column, 9);
    }

    #[test]
    fn test_unterminated_identifier() {
        let err = Lexer::new("CREATE TABLE \"users (id INT);").tokenize().unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedIdentifier(Position { line: 1, column: 14 })
        );
    }

    #[test]
    fn test_unterminated_string_and_comment() {
        assert!(matches!(
            Lexer::new("DEFAULT 'abc").tokenize(),
            Err(LexError::UnterminatedString(_))
        ));
        assert!(matches!(
            Lexer::new("/* never closed").tokenize(),
            Err(LexError::UnterminatedComment(_))
        ));
    }

    #[test]
    fn test_symbols_are_kept() {
        let tokens = tokens("ENGINE=InnoDB");
        assert_eq!(tokens[1], Token::Symbol('='));
    }
}
