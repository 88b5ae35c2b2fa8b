//! SQL dialect selection. Only type mapping depends on the dialect.

use super::lexer::{Lexeme, Token};
use serde::{Deserialize, Serialize};

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Guess from the document's tokens
    #[default]
    Auto,
    /// Standard SQL
    Generic,
    #[serde(rename = "postgres")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
}

/// Bare words only PostgreSQL writes.
const POSTGRES_WORDS: &[&str] = &[
    "serial",
    "bigserial",
    "smallserial",
    "serial4",
    "serial8",
    "jsonb",
    "timestamptz",
    "timetz",
    "bytea",
    "citext",
    "nextval",
];

/// Bare words only MySQL writes.
const MYSQL_WORDS: &[&str] = &[
    "auto_increment",
    "tinyint",
    "mediumint",
    "tinytext",
    "mediumtext",
    "longtext",
    "unsigned",
];

impl Dialect {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "generic" | "sql" | "ansi" => Some(Self::Generic),
            "postgres" | "postgresql" | "pg" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            _ => None,
        }
    }

    /// Guess the dialect from a tokenized document.
    ///
    /// Each dialect collects one point per cue and the higher score wins;
    /// no cue at all, or a tie, means `Generic`. Cues are bare words and
    /// punctuation, never the text of a quoted name, so a column called
    /// `"serial_no"` says nothing about the dialect.
    pub fn detect(source: &str, lexemes: &[Lexeme]) -> Self {
        let mut postgres = 0usize;
        let mut mysql = 0usize;

        for (i, lexeme) in lexemes.iter().enumerate() {
            let next = lexemes.get(i + 1).map(|l| &l.token);
            match &lexeme.token {
                Token::Ident(word) => {
                    let word = word.to_lowercase();
                    if POSTGRES_WORDS.contains(&word.as_str()) {
                        postgres += 1;
                    } else if MYSQL_WORDS.contains(&word.as_str())
                        || (word == "engine" && next == Some(&Token::Symbol('=')))
                    {
                        mysql += 1;
                    }
                }
                // `value::type` casts
                Token::Symbol(':') if next == Some(&Token::Symbol(':')) => postgres += 1,
                Token::Quoted(_) if source.get(lexeme.start..).is_some_and(|s| s.starts_with('`')) => {
                    mysql += 1;
                }
                _ => {}
            }
        }

        if postgres > mysql {
            Self::PostgreSQL
        } else if mysql > postgres {
            Self::MySQL
        } else {
            Self::Generic
        }
    }

    /// Resolve `Auto` to a concrete dialect.
    pub fn resolve(self, source: &str, lexemes: &[Lexeme]) -> Self {
        match self {
            Self::Auto => Self::detect(source, lexemes),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::lexer::Lexer;

    fn detect(sql: &str) -> Dialect {
        Dialect::detect(sql, &Lexer::new(sql).tokenize().unwrap())
    }

    #[test]
    fn test_detect_postgres() {
        assert_eq!(detect("CREATE TABLE users (id SERIAL);"), Dialect::PostgreSQL);
        assert_eq!(detect("CREATE TABLE t (tag text DEFAULT 'x'::text);"), Dialect::PostgreSQL);
    }

    #[test]
    fn test_detect_mysql() {
        assert_eq!(detect("CREATE TABLE `users` (id INT AUTO_INCREMENT);"), Dialect::MySQL);
        assert_eq!(detect("CREATE TABLE users (id INT) ENGINE=InnoDB;"), Dialect::MySQL);
    }

    #[test]
    fn test_detect_generic() {
        let sql = r#"CREATE TABLE "users" ("id" INTEGER NOT NULL, PRIMARY KEY ("id"));"#;
        assert_eq!(detect(sql), Dialect::Generic);
    }

    #[test]
    fn test_names_are_not_cues() {
        assert_eq!(detect("CREATE TABLE devices (serial_no TEXT, engine TEXT);"), Dialect::Generic);
        assert_eq!(detect(r#"CREATE TABLE "serial" ("jsonb" TEXT);"#), Dialect::Generic);
        assert_eq!(detect("CREATE TABLE t (note TEXT DEFAULT 'serial::text');"), Dialect::Generic);
    }

    #[test]
    fn test_backticked_names_outvote_postgres_lookalikes() {
        let sql = "CREATE TABLE `devices` (`serial_no` VARCHAR(32), `active` TINYINT(1)) ENGINE=InnoDB;";
        assert_eq!(detect(sql), Dialect::MySQL);
    }

    #[test]
    fn test_resolve_keeps_explicit_dialect() {
        let sql = "CREATE TABLE t (id SERIAL);";
        let lexemes = Lexer::new(sql).tokenize().unwrap();
        assert_eq!(Dialect::MySQL.resolve(sql, &lexemes), Dialect::MySQL);
        assert_eq!(Dialect::Auto.resolve(sql, &lexemes), Dialect::PostgreSQL);
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!(Dialect::from_str("PG"), Some(Dialect::PostgreSQL));
        assert_eq!(Dialect::from_str("mariadb"), Some(Dialect::MySQL));
        assert_eq!(Dialect::from_str("oracle"), None);
    }
}
