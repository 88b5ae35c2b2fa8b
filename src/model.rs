//! Schema graph data model: tables, columns, relations and their invariants.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_type!(
    /// Globally unique table identifier.
    TableId
);
id_type!(
    /// Column identifier, unique within the owning table.
    ColumnId
);
id_type!(
    /// Relation identifier.
    RelationId
);

/// Closed vocabulary of column scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Varchar,
    Integer,
    Boolean,
    Date,
    Timestamp,
    Uuid,
    Text,
    Json,
}

impl ColumnType {
    pub const ALL: [ColumnType; 8] = [
        Self::Varchar,
        Self::Integer,
        Self::Boolean,
        Self::Date,
        Self::Timestamp,
        Self::Uuid,
        Self::Text,
        Self::Json,
    ];

    /// SQL spelling used by the DDL generator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Varchar => "VARCHAR",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::Uuid => "UUID",
            Self::Text => "TEXT",
            Self::Json => "JSON",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Relation-level cardinality annotation. Not representable in DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[default]
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:M")]
    ManyToMany,
}

impl Cardinality {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "1:1" => Some(Self::OneToOne),
            "1:N" => Some(Self::OneToMany),
            "N:M" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToMany => "N:M",
        }
    }

    /// Arrow heads drawn by the canvas as `(at_source, at_target)`.
    pub fn markers(self) -> (bool, bool) {
        match self {
            Self::OneToOne => (false, false),
            Self::OneToMany => (false, true),
            Self::ManyToMany => (true, true),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub is_primary_key: bool,
    /// Cached copy of "some relation targets this column". Kept in sync by
    /// the mutation engine; see [`SchemaGraph::is_foreign_key`].
    pub is_foreign_key: bool,
    pub is_unique: bool,
    pub is_nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.id == id)
    }

    pub(crate) fn column_mut(&mut self, id: &ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| &c.id == id)
    }

    /// Columns flagged as primary key, in column order.
    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: RelationId,
    pub source_table_id: TableId,
    pub source_column_id: ColumnId,
    pub target_table_id: TableId,
    pub target_column_id: ColumnId,
    pub cardinality: Cardinality,
}

impl Relation {
    pub fn touches_column(&self, table: &TableId, column: &ColumnId) -> bool {
        self.is_source(table, column) || self.targets(table, column)
    }

    pub fn touches_table(&self, table: &TableId) -> bool {
        &self.source_table_id == table || &self.target_table_id == table
    }

    pub fn is_source(&self, table: &TableId, column: &ColumnId) -> bool {
        &self.source_table_id == table && &self.source_column_id == column
    }

    pub fn targets(&self, table: &TableId, column: &ColumnId) -> bool {
        &self.target_table_id == table && &self.target_column_id == column
    }
}

/// The complete in-memory schema: tables in insertion order plus relations.
///
/// Fields are private; every change goes through the mutation engine
/// (`engine` module) so that the invariants checked by
/// [`SchemaGraph::check_invariants`] hold after each call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaGraph {
    pub(crate) tables: Vec<Table>,
    pub(crate) relations: Vec<Relation>,
    #[serde(skip)]
    pub(crate) next_id: u64,
}

/// A broken graph invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("relation {relation} references missing table {table}")]
    DanglingTable { relation: RelationId, table: TableId },
    #[error("relation {relation} references missing column {column} of table {table}")]
    DanglingColumn {
        relation: RelationId,
        table: TableId,
        column: ColumnId,
    },
    #[error("column {column} of table {table} has isForeignKey={stored}, relations say {derived}")]
    ForeignKeyFlag {
        table: TableId,
        column: ColumnId,
        stored: bool,
        derived: bool,
    },
    #[error("duplicate table id {0}")]
    DuplicateTableId(TableId),
    #[error("duplicate column id {column} in table {table}")]
    DuplicateColumnId { table: TableId, column: ColumnId },
    #[error("duplicate relation id {0}")]
    DuplicateRelationId(RelationId),
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, id: &TableId) -> Option<&Table> {
        self.tables.iter().find(|t| &t.id == id)
    }

    /// First table with the given name. Names are not unique at this layer.
    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn column(&self, table: &TableId, column: &ColumnId) -> Option<&Column> {
        self.table(table).and_then(|t| t.column(column))
    }

    pub fn relation(&self, id: &RelationId) -> Option<&Relation> {
        self.relations.iter().find(|r| &r.id == id)
    }

    pub fn relations_for_table<'a>(
        &'a self,
        table: &'a TableId,
    ) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations.iter().filter(move |r| r.touches_table(table))
    }

    pub fn relations_for_column<'a>(
        &'a self,
        table: &'a TableId,
        column: &'a ColumnId,
    ) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations
            .iter()
            .filter(move |r| r.touches_column(table, column))
    }

    /// Derived foreign-key status: true iff at least one relation targets
    /// the column. This is the authoritative read path; the stored
    /// `Column::is_foreign_key` is a cache of it.
    pub fn is_foreign_key(&self, table: &TableId, column: &ColumnId) -> bool {
        self.relations.iter().any(|r| r.targets(table, column))
    }

    pub(crate) fn table_mut(&mut self, id: &TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| &t.id == id)
    }

    /// Check that ids are unique, every relation endpoint exists and every
    /// cached FK flag matches the relations. A broken cascade shows up as a
    /// dangling endpoint.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut table_ids = HashSet::new();
        for table in &self.tables {
            if !table_ids.insert(&table.id) {
                return Err(InvariantViolation::DuplicateTableId(table.id.clone()));
            }
            let mut column_ids = HashSet::new();
            for column in &table.columns {
                if !column_ids.insert(&column.id) {
                    return Err(InvariantViolation::DuplicateColumnId {
                        table: table.id.clone(),
                        column: column.id.clone(),
                    });
                }
            }
        }

        let mut relation_ids = HashSet::new();
        for relation in &self.relations {
            if !relation_ids.insert(&relation.id) {
                return Err(InvariantViolation::DuplicateRelationId(relation.id.clone()));
            }
            for (table, column) in [
                (&relation.source_table_id, &relation.source_column_id),
                (&relation.target_table_id, &relation.target_column_id),
            ] {
                let Some(t) = self.table(table) else {
                    return Err(InvariantViolation::DanglingTable {
                        relation: relation.id.clone(),
                        table: table.clone(),
                    });
                };
                if t.column(column).is_none() {
                    return Err(InvariantViolation::DanglingColumn {
                        relation: relation.id.clone(),
                        table: table.clone(),
                        column: column.clone(),
                    });
                }
            }
        }

        for table in &self.tables {
            for column in &table.columns {
                let derived = self.is_foreign_key(&table.id, &column.id);
                if column.is_foreign_key != derived {
                    return Err(InvariantViolation::ForeignKeyFlag {
                        table: table.id.clone(),
                        column: column.id.clone(),
                        stored: column.is_foreign_key,
                        derived,
                    });
                }
            }
        }

        Ok(())
    }
}
