//! Schema suggestions from an external service.
//!
//! The service answers a prompt with a JSON document of tables and
//! relations. The crate only defines that shape and how it becomes a graph;
//! talking to the service is left to a [`SuggestionProvider`].

use crate::engine::ColumnSpec;
use crate::error::NotFound;
use crate::model::{Cardinality, ColumnId, ColumnType, SchemaGraph, TableId};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("suggestion service failed: {0}")]
    Provider(String),
    #[error("malformed suggestion: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("suggested table id `{0}` is used more than once")]
    DuplicateTableId(String),
    #[error("suggested column id `{column}` is used more than once in table `{table}`")]
    DuplicateColumnId { table: String, column: String },
    #[error("suggested relation {relation} references unknown table `{table}`")]
    UnknownTable { relation: usize, table: String },
    #[error("suggested relation {relation} references unknown column `{column}` of table `{table}`")]
    UnknownColumn {
        relation: usize,
        table: String,
        column: String,
    },
    #[error(transparent)]
    Graph(#[from] NotFound),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSuggestion {
    pub tables: Vec<SuggestedTable>,
    #[serde(default)]
    pub relations: Vec<SuggestedRelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedTable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<SuggestedColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedColumn {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(rename = "isPK", default)]
    pub is_pk: bool,
    /// Ignored on import; foreign keys come from the relations.
    #[serde(rename = "isFK", default)]
    pub is_fk: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default = "nullable_by_default")]
    pub is_nullable: bool,
}

fn nullable_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedRelation {
    pub source_table_id: String,
    pub source_column_id: String,
    pub target_table_id: String,
    pub target_column_id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_cardinality")]
    pub cardinality: Cardinality,
}

/// Accepts `"1:n"` or `" N:M "` as well as the canonical spelling.
fn lenient_cardinality<'de, D>(deserializer: D) -> Result<Cardinality, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Cardinality::from_str(&s).ok_or_else(|| de::Error::unknown_variant(&s, &["1:1", "1:N", "N:M"]))
}

impl SchemaSuggestion {
    pub fn from_json(json: &str) -> Result<Self, SuggestionError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The external service that turns a prompt into a suggestion.
pub trait SuggestionProvider {
    fn suggest(&self, prompt: &str) -> Result<SchemaSuggestion, SuggestionError>;
}

impl<F> SuggestionProvider for F
where
    F: Fn(&str) -> Result<SchemaSuggestion, SuggestionError>,
{
    fn suggest(&self, prompt: &str) -> Result<SchemaSuggestion, SuggestionError> {
        self(prompt)
    }
}

impl SchemaGraph {
    /// Build a fresh graph from a suggestion.
    ///
    /// Every reference is checked before anything is built. Ids are
    /// regenerated and foreign-key flags are derived from the relations, so
    /// the suggested `isFK` values are not trusted.
    pub fn from_suggestion(suggestion: &SchemaSuggestion) -> Result<Self, SuggestionError> {
        let mut known: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
        for table in &suggestion.tables {
            let mut columns = HashMap::new();
            for (index, column) in table.columns.iter().enumerate() {
                if columns.insert(column.id.as_str(), index).is_some() {
                    return Err(SuggestionError::DuplicateColumnId {
                        table: table.id.clone(),
                        column: column.id.clone(),
                    });
                }
            }
            if known.insert(table.id.as_str(), columns).is_some() {
                return Err(SuggestionError::DuplicateTableId(table.id.clone()));
            }
        }

        for (index, relation) in suggestion.relations.iter().enumerate() {
            for (table, column) in [
                (&relation.source_table_id, &relation.source_column_id),
                (&relation.target_table_id, &relation.target_column_id),
            ] {
                let columns = known.get(table.as_str()).ok_or_else(|| SuggestionError::UnknownTable {
                    relation: index,
                    table: table.clone(),
                })?;
                if !columns.contains_key(column.as_str()) {
                    return Err(SuggestionError::UnknownColumn {
                        relation: index,
                        table: table.clone(),
                        column: column.clone(),
                    });
                }
            }
        }

        let mut graph = SchemaGraph::new();
        let mut ids: HashMap<(&str, &str), (TableId, ColumnId)> = HashMap::new();
        for table in &suggestion.tables {
            let table_id = graph.add_table_with(table.name.clone(), None);
            for column in &table.columns {
                let spec = ColumnSpec {
                    name: column.name.clone(),
                    column_type: column.column_type,
                    is_primary_key: column.is_pk,
                    is_unique: column.is_unique,
                    is_nullable: column.is_nullable,
                };
                let column_id = graph.add_column(&table_id, spec)?;
                ids.insert((table.id.as_str(), column.id.as_str()), (table_id.clone(), column_id));
            }
        }

        for (index, relation) in suggestion.relations.iter().enumerate() {
            let endpoint = |table, column| {
                ids.get(&(table, column)).ok_or_else(|| SuggestionError::UnknownColumn {
                    relation: index,
                    table: table.to_string(),
                    column: column.to_string(),
                })
            };
            let (source_table, source_column) =
                endpoint(relation.source_table_id.as_str(), relation.source_column_id.as_str())?;
            let (target_table, target_column) =
                endpoint(relation.target_table_id.as_str(), relation.target_column_id.as_str())?;
            let id = graph.connect(source_table, source_column, target_table, target_column)?;
            graph.set_cardinality(&id, relation.cardinality)?;
        }

        debug!(
            tables = graph.tables().len(),
            relations = graph.relations().len(),
            "built graph from suggestion"
        );
        Ok(graph)
    }
}
