//! SQL parser for CREATE TABLE and ALTER TABLE ... ADD CONSTRAINT statements.
//!
//! Parsing only extracts definitions by name. Names are resolved against
//! each other in a second pass (see `resolve`), so statement order does not
//! matter.

use super::dialect::Dialect;
use super::lexer::{LexError, Lexeme, Lexer, Position, Token};
use super::types::map_type;
use crate::error::{ErrorKind, NotFound};
use crate::model::ColumnType;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SqlParseError {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("syntax error at {position}: {message} in `{statement}`")]
    Syntax {
        message: String,
        statement: String,
        position: Position,
    },
    #[error("unsupported type `{type_name}` for column `{column}` at {position}")]
    UnsupportedType {
        type_name: String,
        column: String,
        statement: String,
        position: Position,
    },
    #[error("unresolved reference to {reference} at {position} in `{statement}`")]
    UnresolvedReference {
        reference: String,
        statement: String,
        position: Position,
    },
    #[error(transparent)]
    Graph(#[from] NotFound),
}

impl SqlParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Lex(_) | Self::Syntax { .. } => ErrorKind::ParseError,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            Self::Graph(_) => ErrorKind::NotFound,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Lex(e) => Some(e.position()),
            Self::Syntax { position, .. }
            | Self::UnsupportedType { position, .. }
            | Self::UnresolvedReference { position, .. } => Some(*position),
            Self::Graph(_) => None,
        }
    }

    /// Text of the offending statement, when there is one.
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Syntax { statement, .. }
            | Self::UnsupportedType { statement, .. }
            | Self::UnresolvedReference { statement, .. } => Some(statement),
            Self::Lex(_) | Self::Graph(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_nullable: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub statement: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    /// `columns` of the owning table reference `target_columns` of
    /// `target_table`. An empty target list means "its primary key".
    ForeignKey {
        columns: Vec<String>,
        target_table: String,
        target_columns: Vec<String>,
    },
}

/// A constraint on a named table, applied once every table is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Alteration {
    pub table: String,
    pub constraint: TableConstraint,
    pub statement: String,
    pub position: Position,
}

/// Everything extracted from a DDL document, before name resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub tables: Vec<TableDef>,
    pub alterations: Vec<Alteration>,
}

/// Tokenize and parse a whole DDL document. `Dialect::Auto` is resolved
/// from the tokens before any statement is parsed.
pub fn parse_document(input: &str, dialect: Dialect) -> Result<Document, SqlParseError> {
    let lexemes = Lexer::new(input).tokenize()?;
    let dialect = dialect.resolve(input, &lexemes);
    debug!(?dialect, "parsing DDL");
    let mut document = Document::default();

    for statement in split_statements(input, &lexemes)? {
        debug!(line = statement.position.line, "parsing statement");
        let mut parser = Parser::new(&statement, dialect);
        parser.parse_statement(&mut document)?;
    }

    Ok(document)
}

/// One `;`-terminated statement.
struct Statement<'a> {
    lexemes: &'a [Lexeme],
    text: &'a str,
    position: Position,
}

/// Split on top-level semicolons. Quotes are already handled by the
/// lexer; parentheses must balance within each statement.
fn split_statements<'a>(
    source: &'a str,
    lexemes: &'a [Lexeme],
) -> Result<Vec<Statement<'a>>, SqlParseError> {
    let mut statements = Vec::new();
    let mut open_parens: Vec<Position> = Vec::new();
    let mut start = 0;

    for (i, lexeme) in lexemes.iter().enumerate() {
        match lexeme.token {
            Token::LParen => open_parens.push(lexeme.position),
            Token::RParen => {
                if open_parens.pop().is_none() {
                    let statement = statement_at(source, &lexemes[start..=i]);
                    return Err(SqlParseError::Syntax {
                        message: "unbalanced `)`".to_string(),
                        statement: statement.text.to_string(),
                        position: lexeme.position,
                    });
                }
            }
            Token::Semicolon if open_parens.is_empty() => {
                if i > start {
                    statements.push(statement_at(source, &lexemes[start..i]));
                }
                start = i + 1;
            }
            Token::Eof => {
                if let Some(open) = open_parens.last() {
                    let statement = statement_at(source, &lexemes[start..i.max(start + 1)]);
                    return Err(SqlParseError::Syntax {
                        message: "unclosed `(`".to_string(),
                        statement: statement.text.to_string(),
                        position: *open,
                    });
                }
                if i > start {
                    statements.push(statement_at(source, &lexemes[start..i]));
                }
            }
            _ => {}
        }
    }

    Ok(statements)
}

fn statement_at<'a>(source: &'a str, lexemes: &'a [Lexeme]) -> Statement<'a> {
    let (text, position) = match (lexemes.first(), lexemes.last()) {
        (Some(first), Some(last)) => (&source[first.start..last.end], first.position),
        _ => ("", Position::default()),
    };
    Statement {
        lexemes,
        text: text.trim(),
        position,
    }
}

struct Parser<'a> {
    lexemes: &'a [Lexeme],
    source: &'a str,
    pos: usize,
    dialect: Dialect,
    eof: Lexeme,
}

impl<'a> Parser<'a> {
    fn new(statement: &Statement<'a>, dialect: Dialect) -> Self {
        let end = statement.lexemes.last().map(|l| l.end).unwrap_or(0);
        Self {
            lexemes: statement.lexemes,
            source: statement.text,
            pos: 0,
            dialect,
            eof: Lexeme {
                token: Token::Eof,
                position: statement.lexemes.last().map(|l| l.position).unwrap_or_default(),
                start: end,
                end,
            },
        }
    }

    fn lexeme(&self) -> &Lexeme {
        self.lexemes.get(self.pos).unwrap_or(&self.eof)
    }

    fn current(&self) -> &Token {
        &self.lexeme().token
    }

    fn position(&self) -> Position {
        self.lexeme().position
    }

    fn advance(&mut self) {
        if self.pos < self.lexemes.len() {
            self.pos += 1;
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, SqlParseError> {
        Err(SqlParseError::Syntax {
            message: message.into(),
            statement: self.source.to_string(),
            position: self.position(),
        })
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), SqlParseError> {
        if self.current() == &expected {
            self.advance();
            Ok(())
        } else {
            self.error(format!("expected {}, found {:?}", what, self.current()))
        }
    }

    fn token_at(&self, offset: usize) -> &Token {
        self.lexemes.get(self.pos + offset).map_or(&self.eof.token, |l| &l.token)
    }

    /// The name spelled by the lexeme `offset` tokens ahead. Keywords count
    /// as names here, written as they appear in the source.
    fn name_at(&self, offset: usize) -> Option<String> {
        let lexeme = self.lexemes.get(self.pos + offset)?;
        match &lexeme.token {
            Token::Ident(name) | Token::Quoted(name) => Some(name.clone()),
            token if token.is_keyword() => Some(self.slice(lexeme.start, lexeme.end)),
            _ => None,
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, SqlParseError> {
        match self.name_at(0) {
            Some(name) => {
                self.advance();
                Ok(name)
            }
            None => self.error(format!("expected {}, found {:?}", what, self.current())),
        }
    }

    /// `name` or `schema.name`; the last part is kept.
    fn qualified_name(&mut self, what: &str) -> Result<String, SqlParseError> {
        let mut name = self.expect_ident(what)?;
        while self.current() == &Token::Dot {
            self.advance();
            name = self.expect_ident(what)?;
        }
        Ok(name)
    }

    fn at_item_end(&self) -> bool {
        matches!(self.current(), Token::Comma | Token::RParen | Token::Eof)
    }

    fn parse_statement(&mut self, document: &mut Document) -> Result<(), SqlParseError> {
        match self.current() {
            Token::Create => self.parse_create_table(document),
            Token::Alter => self.parse_alter_table(document),
            _ => self.error("unrecognized statement, expected CREATE TABLE or ALTER TABLE"),
        }
    }

    fn parse_create_table(&mut self, document: &mut Document) -> Result<(), SqlParseError> {
        let position = self.position();
        self.advance(); // CREATE

        // CREATE [TEMP | TEMPORARY | UNLOGGED] TABLE
        while ["temp", "temporary", "unlogged", "global", "local"]
            .iter()
            .any(|w| self.current().is_word(w))
        {
            self.advance();
        }
        self.expect(Token::Table, "TABLE after CREATE")?;

        if self.current() == &Token::If {
            self.advance();
            self.expect(Token::Not, "NOT")?;
            self.expect(Token::Exists, "EXISTS")?;
        }

        let table_name = self.qualified_name("table name")?;
        self.expect(Token::LParen, "`(` to open the table body")?;

        let mut columns: Vec<ColumnDef> = Vec::new();
        let mut names = HashSet::new();

        if self.current() == &Token::RParen {
            self.advance();
        } else {
            loop {
                if let Some(column) = self.parse_table_item(&table_name, document)? {
                    if !names.insert(column.name.clone()) {
                        return Err(SqlParseError::Syntax {
                            message: format!("duplicate column `{}`", column.name),
                            statement: self.source.to_string(),
                            position: column.position,
                        });
                    }
                    columns.push(column);
                }
                match self.current() {
                    Token::Comma => self.advance(),
                    Token::RParen => {
                        self.advance();
                        break;
                    }
                    _ => return self.error("expected `,` or `)` in table body"),
                }
            }
        }

        // Anything after the body is a table option (ENGINE=..., WITH (...)).
        document.tables.push(TableDef {
            name: table_name,
            columns,
            statement: self.source.to_string(),
            position,
        });
        Ok(())
    }

    /// One comma-separated item of a table body: a column definition or a
    /// table-level constraint (which is recorded as an alteration).
    fn parse_table_item(
        &mut self,
        table: &str,
        document: &mut Document,
    ) -> Result<Option<ColumnDef>, SqlParseError> {
        let position = self.position();
        match self.current() {
            Token::Constraint | Token::Primary | Token::Unique | Token::Foreign | Token::Check => {
                if let Some(constraint) = self.parse_table_constraint()? {
                    self.record(document, table, constraint, position);
                }
                Ok(None)
            }
            Token::Index | Token::Key if self.at_index_definition() => {
                self.skip_item()?;
                Ok(None)
            }
            _ if self.name_at(0).is_some() => self.parse_column(table, document).map(Some),
            _ => self.error(format!("unexpected {:?} in table body", self.current())),
        }
    }

    /// MySQL secondary index: `KEY [name] [USING x] (cols)`. A column list
    /// holds names, where a column type such as `varchar(10)` holds numbers,
    /// so `key varchar(10)` stays a column called `key`.
    fn at_index_definition(&self) -> bool {
        let holds_names = |offset: usize| self.name_at(offset).is_some();
        match self.token_at(1) {
            Token::LParen => holds_names(2),
            Token::Ident(_) | Token::Quoted(_) => match self.token_at(2) {
                Token::LParen => holds_names(3),
                token => token.is_word("using"),
            },
            _ => false,
        }
    }

    fn record(
        &self,
        document: &mut Document,
        table: &str,
        constraint: TableConstraint,
        position: Position,
    ) {
        document.alterations.push(Alteration {
            table: table.to_string(),
            constraint,
            statement: self.source.to_string(),
            position,
        });
    }

    /// `[CONSTRAINT name] PRIMARY KEY (..) | UNIQUE (..) | FOREIGN KEY .. | CHECK (..)`.
    /// CHECK constraints are skipped and yield `None`.
    fn parse_table_constraint(&mut self) -> Result<Option<TableConstraint>, SqlParseError> {
        if self.current() == &Token::Constraint {
            self.advance();
            if self.current().ident().is_some() {
                self.advance();
            }
        }

        match self.current() {
            Token::Primary => {
                self.advance();
                self.expect(Token::Key, "KEY after PRIMARY")?;
                Ok(Some(TableConstraint::PrimaryKey(self.column_list()?)))
            }
            Token::Unique => {
                self.advance();
                if matches!(self.current(), Token::Key | Token::Index) {
                    self.advance();
                }
                // MySQL: UNIQUE KEY name (cols)
                if self.current().ident().is_some() {
                    self.advance();
                }
                Ok(Some(TableConstraint::Unique(self.column_list()?)))
            }
            Token::Foreign => self.foreign_key_clause().map(Some),
            Token::Check => {
                self.advance();
                self.skip_group()?;
                Ok(None)
            }
            _ => self.error("expected PRIMARY KEY, UNIQUE, FOREIGN KEY or CHECK"),
        }
    }

    fn parse_column(&mut self, table: &str, document: &mut Document) -> Result<ColumnDef, SqlParseError> {
        let position = self.position();
        let name = self.expect_ident("column name")?;

        // Type: bare words plus parenthesized parameters, e.g.
        // `character varying(255)` or `int(11) unsigned`.
        let mut raw_type = String::new();
        loop {
            match self.current() {
                Token::Ident(word) => {
                    if !raw_type.is_empty() {
                        raw_type.push(' ');
                    }
                    raw_type.push_str(word);
                    self.advance();
                }
                Token::LParen if !raw_type.is_empty() => {
                    let start = self.lexeme().start;
                    self.skip_group()?;
                    let end = self.lexemes[self.pos - 1].end;
                    raw_type.push_str(&self.slice(start, end));
                }
                _ => break,
            }
        }

        if raw_type.is_empty() {
            return self.error(format!("missing type for column `{}`", name));
        }

        let column_type =
            map_type(&raw_type, self.dialect).ok_or_else(|| SqlParseError::UnsupportedType {
                type_name: raw_type.clone(),
                column: name.clone(),
                statement: self.source.to_string(),
                position,
            })?;

        let mut column = ColumnDef {
            name,
            column_type,
            is_primary_key: false,
            is_unique: false,
            is_nullable: true,
            position,
        };

        while !self.at_item_end() {
            let clause = self.position();
            match self.current() {
                Token::Primary => {
                    self.advance();
                    self.expect(Token::Key, "KEY after PRIMARY")?;
                    column.is_primary_key = true;
                }
                Token::Not => {
                    self.advance();
                    self.expect(Token::Null, "NULL after NOT")?;
                    column.is_nullable = false;
                }
                Token::Null => {
                    self.advance();
                    column.is_nullable = true;
                }
                Token::Unique => {
                    self.advance();
                    if self.current() == &Token::Key {
                        self.advance();
                    }
                    column.is_unique = true;
                }
                Token::Default => {
                    self.advance();
                    self.skip_expression()?;
                }
                Token::References => {
                    self.advance();
                    let (target_table, target_columns) = self.reference()?;
                    let constraint = TableConstraint::ForeignKey {
                        columns: vec![column.name.clone()],
                        target_table,
                        target_columns,
                    };
                    self.record(document, table, constraint, clause);
                }
                Token::Check | Token::LParen => {
                    if self.current() == &Token::Check {
                        self.advance();
                    }
                    self.skip_group()?;
                }
                Token::Constraint => {
                    self.advance();
                    if self.current().ident().is_some() {
                        self.advance();
                    }
                }
                Token::On => self.skip_on_actions()?,
                // AUTO_INCREMENT, COLLATE x, COMMENT 'x', GENERATED ... and the like
                Token::Ident(_)
                | Token::Quoted(_)
                | Token::Str(_)
                | Token::Num(_)
                | Token::Symbol(_)
                | Token::Dot => self.advance(),
                other => {
                    return self.error(format!("unexpected {:?} in column definition", other));
                }
            }
        }

        Ok(column)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        // Lexeme offsets are relative to the whole document; the parser only
        // holds the statement text, so rebase on the first lexeme.
        let base = self.lexemes.first().map(|l| l.start).unwrap_or(0);
        self.source
            .get(start - base..end - base)
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    /// `FOREIGN KEY [name] (cols) REFERENCES table [(cols)] [ON ...]`
    fn foreign_key_clause(&mut self) -> Result<TableConstraint, SqlParseError> {
        self.expect(Token::Foreign, "FOREIGN")?;
        self.expect(Token::Key, "KEY after FOREIGN")?;
        if self.current().ident().is_some() {
            self.advance();
        }
        let columns = self.column_list()?;
        self.expect(Token::References, "REFERENCES")?;
        let (target_table, target_columns) = self.reference()?;

        if !target_columns.is_empty() && target_columns.len() != columns.len() {
            return self.error(format!(
                "foreign key has {} columns but references {}",
                columns.len(),
                target_columns.len()
            ));
        }

        Ok(TableConstraint::ForeignKey {
            columns,
            target_table,
            target_columns,
        })
    }

    /// `table [(cols)] [ON DELETE ..] [ON UPDATE ..]` after REFERENCES.
    fn reference(&mut self) -> Result<(String, Vec<String>), SqlParseError> {
        let target = self.qualified_name("referenced table")?;
        let columns = if self.current() == &Token::LParen {
            self.column_list()?
        } else {
            Vec::new()
        };
        // MATCH FULL / MATCH SIMPLE
        if self.current().is_word("match") {
            self.advance();
            self.advance();
        }
        self.skip_on_actions()?;
        Ok((target, columns))
    }

    /// `(a, b DESC, c(10))`
    fn column_list(&mut self) -> Result<Vec<String>, SqlParseError> {
        self.expect(Token::LParen, "`(` before column list")?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.expect_ident("column name")?);
            // Prefix length and sort order in index column lists
            if self.current() == &Token::LParen {
                self.skip_group()?;
            }
            if self.current().is_word("asc") || self.current().is_word("desc") {
                self.advance();
            }
            match self.current() {
                Token::Comma => self.advance(),
                Token::RParen => {
                    self.advance();
                    return Ok(columns);
                }
                _ => return self.error("expected `,` or `)` in column list"),
            }
        }
    }

    fn skip_on_actions(&mut self) -> Result<(), SqlParseError> {
        while self.current() == &Token::On {
            self.advance();
            if !(self.current().is_word("delete") || self.current().is_word("update")) {
                return self.error("expected DELETE or UPDATE after ON");
            }
            self.advance();
            // CASCADE, RESTRICT, SET NULL, SET DEFAULT, NO ACTION, CURRENT_TIMESTAMP
            if self.current().is_word("set") || self.current().is_word("no") {
                self.advance();
                self.advance();
            } else if self.current().ident().is_some() {
                self.advance();
                if self.current() == &Token::LParen {
                    self.skip_group()?;
                }
            } else {
                return self.error("expected referential action");
            }
        }
        Ok(())
    }

    /// Skip a DEFAULT expression: operands joined by operator symbols,
    /// e.g. `'x'::text`, `now()`, `(1 + 2)`, `-1`.
    fn skip_expression(&mut self) -> Result<(), SqlParseError> {
        loop {
            match self.current() {
                Token::LParen => self.skip_group()?,
                Token::Ident(_) => {
                    self.advance();
                    if self.current() == &Token::LParen {
                        self.skip_group()?;
                    }
                }
                Token::Str(_) | Token::Num(_) | Token::Null | Token::Quoted(_) => self.advance(),
                _ => return self.error("expected DEFAULT value"),
            }
            if matches!(self.current(), Token::Symbol(_) | Token::Dot) {
                while matches!(self.current(), Token::Symbol(_) | Token::Dot) {
                    self.advance();
                }
            } else {
                return Ok(());
            }
        }
    }

    /// Skip a balanced parenthesized group starting at the current `(`.
    fn skip_group(&mut self) -> Result<(), SqlParseError> {
        self.expect(Token::LParen, "`(`")?;
        let mut depth = 1;
        while depth > 0 {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Eof => return self.error("unclosed `(`"),
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    /// Skip to the next top-level `,` or `)` of the enclosing list.
    fn skip_item(&mut self) -> Result<(), SqlParseError> {
        while !self.at_item_end() {
            if self.current() == &Token::LParen {
                self.skip_group()?;
            } else {
                self.advance();
            }
        }
        Ok(())
    }

    /// `ALTER TABLE [IF EXISTS] [ONLY] name ADD [CONSTRAINT n] <constraint> [, ADD ...]`
    fn parse_alter_table(&mut self, document: &mut Document) -> Result<(), SqlParseError> {
        self.advance(); // ALTER
        self.expect(Token::Table, "TABLE after ALTER")?;
        if self.current() == &Token::If {
            self.advance();
            self.expect(Token::Exists, "EXISTS")?;
        }
        if self.current() == &Token::Only {
            self.advance();
        }
        let table = self.qualified_name("table name")?;

        loop {
            let position = self.position();
            self.expect(Token::Add, "ADD CONSTRAINT")?;
            if !matches!(
                self.current(),
                Token::Constraint | Token::Primary | Token::Unique | Token::Foreign
            ) {
                return self.error("unsupported ALTER TABLE form, expected a key constraint");
            }
            if let Some(constraint) = self.parse_table_constraint()? {
                self.record(document, &table, constraint, position);
            }

            // NOT VALID, DEFERRABLE INITIALLY DEFERRED, ...
            while !matches!(self.current(), Token::Comma | Token::Eof) {
                if self.current() == &Token::LParen {
                    self.skip_group()?;
                } else {
                    self.advance();
                }
            }
            if self.current() == &Token::Comma {
                self.advance();
            } else {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Document {
        parse_document(sql, Dialect::Generic).unwrap()
    }

    #[test]
    fn test_parse_simple_table() {
        let doc = parse(
            r#"
            CREATE TABLE users (
                id INT PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                bio TEXT NULL
            );
            "#,
        );
        assert_eq!(doc.tables.len(), 1);

        let users = &doc.tables[0];
        assert_eq!(users.name, "users");
        assert_eq!(users.columns.len(), 3);

        let id = &users.columns[0];
        assert_eq!(id.column_type, ColumnType::Integer);
        assert!(id.is_primary_key);
        assert!(id.is_nullable);

        let email = &users.columns[1];
        assert_eq!(email.column_type, ColumnType::Varchar);
        assert!(!email.is_nullable);
        assert!(email.is_unique);

        assert!(users.columns[2].is_nullable);
    }

    #[test]
    fn test_table_level_constraints_become_alterations() {
        let doc = parse(
            r#"CREATE TABLE "Order Items" (
                "order_id" INTEGER NOT NULL,
                "sku" VARCHAR(32),
                CONSTRAINT pk_items PRIMARY KEY ("order_id", "sku"),
                UNIQUE ("sku"),
                FOREIGN KEY ("order_id") REFERENCES orders ("id") ON DELETE CASCADE,
                CHECK (order_id > 0)
            );"#,
        );
        let table = &doc.tables[0];
        assert_eq!(table.name, "Order Items");
        assert_eq!(table.columns.len(), 2);
        assert_eq!(
            doc.alterations.iter().map(|a| &a.constraint).collect::<Vec<_>>(),
            vec![
                &TableConstraint::PrimaryKey(vec!["order_id".to_string(), "sku".to_string()]),
                &TableConstraint::Unique(vec!["sku".to_string()]),
                &TableConstraint::ForeignKey {
                    columns: vec!["order_id".to_string()],
                    target_table: "orders".to_string(),
                    target_columns: vec!["id".to_string()],
                },
            ]
        );
        assert!(doc.alterations.iter().all(|a| a.table == "Order Items"));
    }

    #[test]
    fn test_inline_reference() {
        let doc = parse("CREATE TABLE orders (user_id INT REFERENCES public.users ON DELETE SET NULL);");
        assert_eq!(
            doc.alterations[0].constraint,
            TableConstraint::ForeignKey {
                columns: vec!["user_id".to_string()],
                target_table: "users".to_string(),
                target_columns: vec![],
            }
        );
    }

    #[test]
    fn test_alter_table_foreign_key() {
        let doc = parse(
            "ALTER TABLE ONLY public.posts ADD CONSTRAINT fk1 FOREIGN KEY (user_id) REFERENCES users(id) NOT VALID;",
        );
        let alteration = &doc.alterations[0];
        assert_eq!(alteration.table, "posts");
        assert!(matches!(
            &alteration.constraint,
            TableConstraint::ForeignKey { target_table, .. } if target_table == "users"
        ));
    }

    #[test]
    fn test_alter_without_constraint_name_and_multiple_actions() {
        let doc = parse(
            "ALTER TABLE posts ADD FOREIGN KEY (a) REFERENCES x (id), ADD CONSTRAINT posts_pkey PRIMARY KEY (id);",
        );
        assert_eq!(doc.alterations.len(), 2);
        assert_eq!(
            doc.alterations[1].constraint,
            TableConstraint::PrimaryKey(vec!["id".to_string()])
        );
    }

    #[test]
    fn test_dialect_noise_is_ignored() {
        let doc = parse_document(
            r#"
            -- MySQL dump
            CREATE TABLE IF NOT EXISTS `users` (
              `id` int(11) unsigned NOT NULL AUTO_INCREMENT,
              `active` tinyint(1) NOT NULL DEFAULT '1',
              `created` datetime DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
              `name` varchar(64) COLLATE utf8mb4_bin DEFAULT NULL COMMENT 'display',
              PRIMARY KEY (`id`),
              KEY `idx_name` (`name`(10))
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
            "#,
            Dialect::MySQL,
        )
        .unwrap();
        let columns = &doc.tables[0].columns;
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].column_type, ColumnType::Integer);
        assert_eq!(columns[1].column_type, ColumnType::Boolean);
        assert_eq!(columns[2].column_type, ColumnType::Timestamp);
        assert!(columns[3].is_nullable);
    }

    #[test]
    fn test_keywords_as_names() {
        let doc = parse(
            "CREATE TABLE settings (key TEXT NOT NULL, index INTEGER, Add BOOLEAN, only TEXT REFERENCES kv (key));",
        );
        let names: Vec<&str> = doc.tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["key", "index", "Add", "only"]);
        assert!(!doc.tables[0].columns[0].is_nullable);
        assert_eq!(
            doc.alterations[0].constraint,
            TableConstraint::ForeignKey {
                columns: vec!["only".to_string()],
                target_table: "kv".to_string(),
                target_columns: vec!["key".to_string()],
            }
        );

        let doc = parse("ALTER TABLE x ADD FOREIGN KEY (key) REFERENCES exists (if);");
        assert!(matches!(
            &doc.alterations[0].constraint,
            TableConstraint::ForeignKey { columns, target_table, target_columns }
                if columns == &["key"] && target_table == "exists" && target_columns == &["if"]
        ));
    }

    #[test]
    fn test_key_column_versus_index_line() {
        let doc = parse_document(
            "CREATE TABLE t (key varchar(10), a INT, KEY (a), KEY by_key (key), INDEX idx USING BTREE (a), KEY `k2` (`key`(4)));",
            Dialect::MySQL,
        )
        .unwrap();
        let names: Vec<&str> = doc.tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["key", "a"]);
        assert_eq!(doc.tables[0].columns[0].column_type, ColumnType::Varchar);
    }

    #[test]
    fn test_postgres_defaults_and_casts() {
        let doc = parse_document(
            "CREATE TABLE t (id uuid DEFAULT gen_random_uuid() NOT NULL, tag text DEFAULT 'x'::text, n integer DEFAULT -1);",
            Dialect::PostgreSQL,
        )
        .unwrap();
        let columns = &doc.tables[0].columns;
        assert_eq!(columns.len(), 3);
        assert!(!columns[0].is_nullable);
        assert_eq!(columns[1].column_type, ColumnType::Text);
    }

    #[test]
    fn test_empty_statements_and_empty_body() {
        let doc = parse(";; CREATE TABLE \"t\" (\n);\n;");
        assert_eq!(doc.tables.len(), 1);
        assert!(doc.tables[0].columns.is_empty());
    }

    #[test]
    fn test_semicolon_inside_quotes_does_not_split() {
        let doc = parse(r#"CREATE TABLE "a;b" ("x;y" TEXT DEFAULT ';');"#);
        assert_eq!(doc.tables[0].name, "a;b");
        assert_eq!(doc.tables[0].columns[0].name, "x;y");
    }

    #[test]
    fn test_unsupported_type() {
        let err = parse_document("CREATE TABLE t (price DECIMAL(10,2));", Dialect::Generic).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert!(matches!(
            err,
            SqlParseError::UnsupportedType { ref type_name, ref column, .. }
                if type_name == "DECIMAL(10,2)" && column == "price"
        ));
    }

    #[test]
    fn test_unrecognized_statement() {
        let err = parse_document(
            "CREATE TABLE a (id INT);\nCREATE INDEX idx ON a (id);",
            Dialect::Generic,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.statement(), Some("CREATE INDEX idx ON a (id)"));
        assert_eq!(err.position().map(|p| p.line), Some(2));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let err = parse_document("CREATE TABLE a (id INT;", Dialect::Generic).unwrap_err();
        assert!(matches!(err, SqlParseError::Syntax { ref message, .. } if message == "unclosed `(`"));

        let err = parse_document("CREATE TABLE a (id INT));", Dialect::Generic).unwrap_err();
        assert!(matches!(err, SqlParseError::Syntax { ref message, .. } if message == "unbalanced `)`"));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_document("CREATE TABLE \"a (id INT);", Dialect::Generic).unwrap_err();
        assert!(matches!(err, SqlParseError::Lex(LexError::UnterminatedIdentifier(_))));
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_duplicate_column() {
        let err = parse_document("CREATE TABLE a (id INT, id TEXT);", Dialect::Generic).unwrap_err();
        assert!(err.to_string().contains("duplicate column `id`"));
    }

    #[test]
    fn test_unsupported_alter_form() {
        let err = parse_document("ALTER TABLE a ADD COLUMN b INT;", Dialect::Generic).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_missing_type() {
        let err = parse_document("CREATE TABLE a (id PRIMARY KEY);", Dialect::Generic).unwrap_err();
        assert!(err.to_string().contains("missing type"));
    }
}
