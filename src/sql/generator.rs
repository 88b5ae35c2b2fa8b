//! Generator for converting a schema graph to canonical DDL text.

use crate::model::{Column, ColumnId, InvariantViolation, RelationId, SchemaGraph, Table, TableId};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("relation {relation} references unknown table {table}")]
    UnknownTable { relation: RelationId, table: TableId },
    #[error("relation {relation} references unknown column {column} of table {table}")]
    UnknownColumn {
        relation: RelationId,
        table: TableId,
        column: ColumnId,
    },
    #[error("table name `{0}` is used more than once")]
    DuplicateTableName(String),
    #[error("column name `{column}` is used more than once in table `{table}`")]
    DuplicateColumnName { table: String, column: String },
    #[error("inconsistent graph: {0}")]
    Inconsistent(#[from] InvariantViolation),
}

/// Serialize a graph to `CREATE TABLE` statements followed by one
/// `ALTER TABLE ... FOREIGN KEY` per relation.
///
/// Output depends only on the graph: the constraint name counter starts
/// over on every call.
pub fn generate(graph: &SchemaGraph) -> Result<String, GenerationError> {
    check_names(graph)?;

    let mut statements = Vec::with_capacity(graph.tables().len() + graph.relations().len());
    for table in graph.tables() {
        let mut output = String::new();
        generate_table(&mut output, table);
        statements.push(output);
    }

    let mut counter = 0;
    for relation in graph.relations() {
        let (source_table, source_column) =
            endpoint(graph, &relation.id, &relation.source_table_id, &relation.source_column_id)?;
        let (target_table, target_column) =
            endpoint(graph, &relation.id, &relation.target_table_id, &relation.target_column_id)?;

        counter += 1;
        let name = format!("fk_{}_{}_{}", target_table.name, target_column.name, counter);
        statements.push(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});\n",
            quote_ident(&target_table.name),
            quote_ident(&name),
            quote_ident(&target_column.name),
            quote_ident(&source_table.name),
            quote_ident(&source_column.name),
        ));
    }

    Ok(statements.join("\n"))
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn check_names(graph: &SchemaGraph) -> Result<(), GenerationError> {
    let mut tables = HashSet::new();
    for table in graph.tables() {
        if !tables.insert(table.name.as_str()) {
            return Err(GenerationError::DuplicateTableName(table.name.clone()));
        }
        let mut columns = HashSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(GenerationError::DuplicateColumnName {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn endpoint<'g>(
    graph: &'g SchemaGraph,
    relation: &RelationId,
    table: &TableId,
    column: &ColumnId,
) -> Result<(&'g Table, &'g Column), GenerationError> {
    let t = graph.table(table).ok_or_else(|| GenerationError::UnknownTable {
        relation: relation.clone(),
        table: table.clone(),
    })?;
    let c = t.column(column).ok_or_else(|| GenerationError::UnknownColumn {
        relation: relation.clone(),
        table: table.clone(),
        column: column.clone(),
    })?;
    Ok((t, c))
}

fn generate_table(output: &mut String, table: &Table) {
    output.push_str(&format!("CREATE TABLE {} (\n", quote_ident(&table.name)));

    let mut items: Vec<String> = table.columns.iter().map(generate_column).collect();

    let primary_key: Vec<String> = table.primary_key().map(|c| quote_ident(&c.name)).collect();
    if !primary_key.is_empty() {
        items.push(format!("    PRIMARY KEY ({})", primary_key.join(", ")));
    }

    if !items.is_empty() {
        output.push_str(&items.join(",\n"));
        output.push('\n');
    }
    output.push_str(");\n");
}

fn generate_column(column: &Column) -> String {
    let mut line = format!("    {} {}", quote_ident(&column.name), column.column_type.as_sql());
    if !column.is_nullable {
        line.push_str(" NOT NULL");
    }
    // Primary keys are already unique
    if column.is_unique && !column.is_primary_key {
        line.push_str(" UNIQUE");
    }
    line
}
