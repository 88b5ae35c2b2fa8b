//! SQL type to column vocabulary mapping.

use super::Dialect;
use crate::model::ColumnType;

/// Map a declared SQL type (e.g. `VARCHAR(255)`, `character varying`,
/// `timestamp with time zone`) to the closest vocabulary member.
///
/// The longest leading run of words that names a known type wins, so
/// trailing modifiers such as `UNSIGNED` or `AUTO_INCREMENT` are ignored.
pub fn map_type(sql_type: &str, dialect: Dialect) -> Option<ColumnType> {
    let lower = sql_type.to_lowercase();
    let base = lower.split('(').next().unwrap_or(&lower);
    let words: Vec<&str> = base.split_whitespace().collect();

    (1..=words.len()).rev().find_map(|n| {
        let candidate = words[..n].join(" ");
        match dialect {
            Dialect::MySQL => map_mysql_type(&candidate, &lower),
            Dialect::PostgreSQL => map_postgres_type(&candidate),
            _ => map_generic_type(&candidate),
        }
    })
}

fn map_postgres_type(base: &str) -> Option<ColumnType> {
    match base {
        "serial" | "serial4" | "bigserial" | "serial8" | "smallserial" | "serial2" | "int4"
        | "int8" | "int2" => Some(ColumnType::Integer),
        "timestamptz" | "timestamp with time zone" | "timestamp without time zone" => {
            Some(ColumnType::Timestamp)
        }
        "jsonb" => Some(ColumnType::Json),
        "bool" => Some(ColumnType::Boolean),
        "citext" | "name" => Some(ColumnType::Text),
        _ => map_generic_type(base),
    }
}

fn map_mysql_type(base: &str, full: &str) -> Option<ColumnType> {
    match base {
        // TINYINT(1) is MySQL's boolean
        "tinyint" if full.contains("tinyint(1)") => Some(ColumnType::Boolean),
        "tinyint" | "mediumint" => Some(ColumnType::Integer),
        "datetime" => Some(ColumnType::Timestamp),
        "longtext" | "mediumtext" | "tinytext" => Some(ColumnType::Text),
        _ => map_generic_type(base),
    }
}

fn map_generic_type(base: &str) -> Option<ColumnType> {
    match base {
        "varchar" | "character varying" | "char varying" | "nvarchar" | "varchar2" | "char"
        | "character" | "nchar" | "string" => Some(ColumnType::Varchar),
        "int" | "integer" | "bigint" | "smallint" | "serial" => Some(ColumnType::Integer),
        "boolean" | "bool" | "bit" => Some(ColumnType::Boolean),
        "date" => Some(ColumnType::Date),
        "timestamp" | "datetime" => Some(ColumnType::Timestamp),
        "uuid" | "uniqueidentifier" => Some(ColumnType::Uuid),
        "text" | "clob" | "ntext" => Some(ColumnType::Text),
        "json" | "jsonb" => Some(ColumnType::Json),
        _ => None,
    }
}
