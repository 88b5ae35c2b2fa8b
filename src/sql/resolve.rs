//! Second parsing pass: resolve names and build the graph through the
//! mutation engine.

use super::parser::{Alteration, Document, SqlParseError, TableConstraint};
use crate::engine::{ColumnPatch, ColumnSpec};
use crate::model::{Cardinality, ColumnId, SchemaGraph, TableId};
use std::collections::HashMap;
use tracing::debug;

struct TableEntry {
    id: TableId,
    columns: HashMap<String, ColumnId>,
}

/// Name-keyed index of the tables built in pass one.
struct NameIndex {
    tables: HashMap<String, TableEntry>,
}

impl NameIndex {
    fn table(&self, name: &str, alteration: &Alteration) -> Result<&TableEntry, SqlParseError> {
        self.tables
            .get(name)
            .ok_or_else(|| unresolved(format!("table `{}`", name), alteration))
    }

    fn column(
        &self,
        table: &str,
        column: &str,
        alteration: &Alteration,
    ) -> Result<(TableId, ColumnId), SqlParseError> {
        let entry = self.table(table, alteration)?;
        let column_id = entry
            .columns
            .get(column)
            .ok_or_else(|| unresolved(format!("column `{}`.`{}`", table, column), alteration))?;
        Ok((entry.id.clone(), column_id.clone()))
    }
}

fn unresolved(reference: String, alteration: &Alteration) -> SqlParseError {
    SqlParseError::UnresolvedReference {
        reference,
        statement: alteration.statement.clone(),
        position: alteration.position,
    }
}

/// Build a graph from a parsed document.
///
/// Pass one creates every table and column. Pass two applies key
/// constraints, then foreign keys in document order, so references may
/// point at tables declared later in the text.
pub fn build_graph(document: &Document, infer_one_to_one: bool) -> Result<SchemaGraph, SqlParseError> {
    let mut graph = SchemaGraph::new();
    let mut index = NameIndex {
        tables: HashMap::new(),
    };

    for def in &document.tables {
        if index.tables.contains_key(&def.name) {
            return Err(SqlParseError::Syntax {
                message: format!("duplicate table `{}`", def.name),
                statement: def.statement.clone(),
                position: def.position,
            });
        }
        let table_id = graph.add_table_with(def.name.clone(), None);
        let mut columns = HashMap::new();
        for column in &def.columns {
            let spec = ColumnSpec {
                name: column.name.clone(),
                column_type: column.column_type,
                is_primary_key: column.is_primary_key,
                is_unique: column.is_unique,
                is_nullable: column.is_nullable,
            };
            let column_id = graph.add_column(&table_id, spec)?;
            columns.insert(column.name.clone(), column_id);
        }
        index.tables.insert(
            def.name.clone(),
            TableEntry {
                id: table_id,
                columns,
            },
        );
    }

    let (keys, foreign_keys): (Vec<&Alteration>, Vec<&Alteration>) = document
        .alterations
        .iter()
        .partition(|a| !matches!(a.constraint, TableConstraint::ForeignKey { .. }));

    for alteration in keys {
        apply_key(&mut graph, &index, alteration)?;
    }
    for alteration in foreign_keys {
        apply_foreign_key(&mut graph, &index, alteration, infer_one_to_one)?;
    }

    Ok(graph)
}

fn apply_key(
    graph: &mut SchemaGraph,
    index: &NameIndex,
    alteration: &Alteration,
) -> Result<(), SqlParseError> {
    match &alteration.constraint {
        TableConstraint::PrimaryKey(columns) => {
            for column in columns {
                let (table_id, column_id) = index.column(&alteration.table, column, alteration)?;
                let patch = ColumnPatch {
                    is_primary_key: Some(true),
                    ..ColumnPatch::default()
                };
                graph.update_column(&table_id, &column_id, patch)?;
            }
        }
        TableConstraint::Unique(columns) => {
            let mut resolved = Vec::new();
            for column in columns {
                resolved.push(index.column(&alteration.table, column, alteration)?);
            }
            // Composite uniqueness has no per-column representation.
            if let [(table_id, column_id)] = resolved.as_slice() {
                let patch = ColumnPatch {
                    is_unique: Some(true),
                    ..ColumnPatch::default()
                };
                graph.update_column(table_id, column_id, patch)?;
            } else {
                debug!(table = %alteration.table, "ignoring composite UNIQUE constraint");
            }
        }
        TableConstraint::ForeignKey { .. } => {}
    }
    Ok(())
}

fn apply_foreign_key(
    graph: &mut SchemaGraph,
    index: &NameIndex,
    alteration: &Alteration,
    infer_one_to_one: bool,
) -> Result<(), SqlParseError> {
    let TableConstraint::ForeignKey {
        columns,
        target_table,
        target_columns,
    } = &alteration.constraint
    else {
        return Ok(());
    };

    // Without an explicit list the referenced table's primary key is used.
    let target_columns: Vec<String> = if target_columns.is_empty() {
        let entry = index.table(target_table, alteration)?;
        let primary: Vec<String> = graph
            .table(&entry.id)
            .map(|t| t.primary_key().map(|c| c.name.clone()).collect())
            .unwrap_or_default();
        if primary.len() != columns.len() {
            return Err(unresolved(
                format!("primary key of `{}`", target_table),
                alteration,
            ));
        }
        primary
    } else {
        target_columns.clone()
    };

    // Resolve everything before connecting anything.
    let mut pairs = Vec::with_capacity(columns.len());
    for (column, target_column) in columns.iter().zip(&target_columns) {
        let holder = index.column(&alteration.table, column, alteration)?;
        let referenced = index.column(target_table, target_column, alteration)?;
        pairs.push((referenced, holder));
    }

    for ((ref_table, ref_column), (fk_table, fk_column)) in pairs {
        let relation = graph.connect(&ref_table, &ref_column, &fk_table, &fk_column)?;
        if infer_one_to_one && is_one_to_one_holder(graph, &fk_table, &fk_column) {
            graph.set_cardinality(&relation, Cardinality::OneToOne)?;
        }
        debug!(
            relation = %relation,
            table = %alteration.table,
            references = %target_table,
            "resolved foreign key"
        );
    }
    Ok(())
}

/// A unique FK column, or one that is the whole primary key, can hold at
/// most one row per referenced row.
fn is_one_to_one_holder(graph: &SchemaGraph, table: &TableId, column: &ColumnId) -> bool {
    let Some(t) = graph.table(table) else {
        return false;
    };
    let Some(c) = t.column(column) else {
        return false;
    };
    c.is_unique || (c.is_primary_key && t.primary_key().count() == 1)
}
