//! SQL DDL codec: text to schema graph and back.

mod dialect;
mod generator;
mod lexer;
mod parser;
mod resolve;
mod types;

pub use dialect::Dialect;
pub use generator::{generate, quote_ident, GenerationError};
pub use lexer::{LexError, Position};
pub use parser::SqlParseError;

use crate::layout::{GridConfig, GridLayout, Placement};
use crate::model::SchemaGraph;
use serde::{Deserialize, Serialize};

/// Settings for turning DDL text into a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportOptions {
    pub dialect: Dialect,
    pub grid: GridConfig,
    /// Mark an imported foreign key `1:1` when its column is unique or the
    /// sole primary key.
    pub infer_one_to_one: bool,
}

/// A parsed graph together with its initial grid positions.
#[derive(Debug, Clone, Serialize)]
pub struct Import {
    pub graph: SchemaGraph,
    pub placements: Vec<Placement>,
}

/// Parse a DDL document into a fresh graph.
///
/// Either every statement parses and every reference resolves, or an error
/// is returned and nothing is built.
pub fn parse_ddl(input: &str, options: &ImportOptions) -> Result<SchemaGraph, SqlParseError> {
    let document = parser::parse_document(input, options.dialect)?;
    resolve::build_graph(&document, options.infer_one_to_one)
}

/// Parse a DDL document and lay its tables out on the configured grid.
pub fn import_ddl(input: &str, options: &ImportOptions) -> Result<Import, SqlParseError> {
    let graph = parse_ddl(input, options)?;
    let placements = GridLayout::new(options.grid).layout(&graph);
    Ok(Import { graph, placements })
}
