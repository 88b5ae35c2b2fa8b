//! Error kinds surfaced at the import/export boundary.

use crate::model::{ColumnId, InvariantViolation, RelationId, TableId};
use crate::sql::{GenerationError, SqlParseError};
use crate::suggestion::SuggestionError;
use serde::Serialize;
use std::fmt;

/// A mutation referred to something that does not exist. The graph is
/// left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("table {0} not found")]
    Table(TableId),
    #[error("column {column} not found in table {table}")]
    Column { table: TableId, column: ColumnId },
    #[error("relation {0} not found")]
    Relation(RelationId),
    #[error("column position {index} out of range for table {table} ({len} columns)")]
    Position {
        table: TableId,
        index: usize,
        len: usize,
    },
}

/// Machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    UnsupportedType,
    UnresolvedReference,
    ParseError,
    GenerationError,
    SuggestionError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::UnsupportedType => "unsupported_type",
            Self::UnresolvedReference => "unresolved_reference",
            Self::ParseError => "parse_error",
            Self::GenerationError => "generation_error",
            Self::SuggestionError => "suggestion_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Parse(#[from] SqlParseError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Suggestion(#[from] SuggestionError),
    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<InvariantViolation> for SchemaError {
    fn from(violation: InvariantViolation) -> Self {
        Self::Generation(GenerationError::Inconsistent(violation))
    }
}

impl SchemaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Parse(e) => e.kind(),
            Self::Generation(_) => ErrorKind::GenerationError,
            Self::Suggestion(_) => ErrorKind::SuggestionError,
            Self::Json(_) => ErrorKind::ParseError,
        }
    }
}
