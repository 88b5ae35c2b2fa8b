//! Graph mutation engine.
//!
//! Every operation either applies fully with the graph consistent again or returns
//! [`NotFound`] without touching the graph. Lookups happen before any
//! write so a failing call is always a no-op.

use crate::error::NotFound;
use crate::model::{
    Cardinality, Column, ColumnId, ColumnType, Relation, RelationId, SchemaGraph, Table, TableId,
};
use serde::Deserialize;
use tracing::{debug, warn};

/// Definition of a new column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_nullable: bool,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            name: "new_column".to_string(),
            column_type: ColumnType::Varchar,
            is_primary_key: false,
            is_unique: false,
            is_nullable: true,
        }
    }
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            ..Self::default()
        }
    }

    /// The `id INTEGER` primary key every new table starts with.
    pub fn primary_id() -> Self {
        Self {
            name: "id".to_string(),
            column_type: ColumnType::Integer,
            is_primary_key: true,
            is_unique: false,
            is_nullable: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }
}

/// Partial column update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub column_type: Option<ColumnType>,
    pub is_primary_key: Option<bool>,
    /// Advisory only: reconciled against the relations right away.
    pub is_foreign_key: Option<bool>,
    pub is_unique: Option<bool>,
    pub is_nullable: Option<bool>,
}

impl SchemaGraph {
    fn fresh_id(&mut self, prefix: char, taken: impl Fn(&Self, &str) -> bool) -> String {
        loop {
            self.next_id += 1;
            let candidate = format!("{}{}", prefix, self.next_id);
            if !taken(self, &candidate) {
                return candidate;
            }
        }
    }

    fn fresh_table_id(&mut self) -> TableId {
        TableId::new(self.fresh_id('t', |g, id| {
            g.tables.iter().any(|t| t.id.as_str() == id)
        }))
    }

    fn fresh_column_id(&mut self) -> ColumnId {
        ColumnId::new(self.fresh_id('c', |g, id| {
            g.tables
                .iter()
                .flat_map(|t| &t.columns)
                .any(|c| c.id.as_str() == id)
        }))
    }

    fn fresh_relation_id(&mut self) -> RelationId {
        RelationId::new(self.fresh_id('r', |g, id| {
            g.relations.iter().any(|r| r.id.as_str() == id)
        }))
    }

    fn require_table(&self, table: &TableId) -> Result<&Table, NotFound> {
        self.table(table).ok_or_else(|| NotFound::Table(table.clone()))
    }

    fn require_column(&self, table: &TableId, column: &ColumnId) -> Result<&Column, NotFound> {
        self.require_table(table)?
            .column(column)
            .ok_or_else(|| NotFound::Column {
                table: table.clone(),
                column: column.clone(),
            })
    }

    /// Re-derive the cached FK flag of one column from the relations.
    fn refresh_foreign_key(&mut self, table: &TableId, column: &ColumnId) {
        let derived = self.is_foreign_key(table, column);
        if let Some(col) = self.table_mut(table).and_then(|t| t.column_mut(column)) {
            col.is_foreign_key = derived;
        }
    }

    /// Re-derive every cached FK flag. Returns how many flags changed.
    pub fn reconcile_foreign_keys(&mut self) -> usize {
        let mut changed = 0;
        for ti in 0..self.tables.len() {
            for ci in 0..self.tables[ti].columns.len() {
                let table = &self.tables[ti];
                let derived = self
                    .relations
                    .iter()
                    .any(|r| r.targets(&table.id, &table.columns[ci].id));
                let column = &mut self.tables[ti].columns[ci];
                if column.is_foreign_key != derived {
                    column.is_foreign_key = derived;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Add a `new_table` with the default `id` primary key column.
    pub fn add_table(&mut self) -> TableId {
        self.add_table_with("new_table", Some(ColumnSpec::primary_id()))
    }

    /// Add a table with the given name and optional first column.
    pub fn add_table_with(
        &mut self,
        name: impl Into<String>,
        initial_column: Option<ColumnSpec>,
    ) -> TableId {
        let id = self.fresh_table_id();
        let columns = match initial_column {
            Some(spec) => vec![self.build_column(spec)],
            None => Vec::new(),
        };
        self.tables.push(Table {
            id: id.clone(),
            name: name.into(),
            columns,
        });
        debug!(table = %id, "added table");
        id
    }

    fn build_column(&mut self, spec: ColumnSpec) -> Column {
        Column {
            id: self.fresh_column_id(),
            name: spec.name,
            column_type: spec.column_type,
            is_primary_key: spec.is_primary_key,
            is_foreign_key: false,
            is_unique: spec.is_unique,
            is_nullable: spec.is_nullable,
        }
    }

    /// Rename a table. Duplicate names are allowed here.
    pub fn rename_table(&mut self, table: &TableId, name: impl Into<String>) -> Result<(), NotFound> {
        let t = self
            .table_mut(table)
            .ok_or_else(|| NotFound::Table(table.clone()))?;
        t.name = name.into();
        Ok(())
    }

    /// Remove a table, its columns and every relation touching it.
    pub fn remove_table(&mut self, table: &TableId) -> Result<Table, NotFound> {
        let index = self
            .tables
            .iter()
            .position(|t| &t.id == table)
            .ok_or_else(|| NotFound::Table(table.clone()))?;

        let (removed, kept): (Vec<Relation>, Vec<Relation>) = std::mem::take(&mut self.relations)
            .into_iter()
            .partition(|r| r.touches_table(table));
        self.relations = kept;
        let removed_table = self.tables.remove(index);

        for relation in &removed {
            self.refresh_foreign_key(&relation.target_table_id, &relation.target_column_id);
        }
        debug!(table = %table, relations = removed.len(), "removed table");
        Ok(removed_table)
    }

    /// Append a column to a table.
    pub fn add_column(&mut self, table: &TableId, spec: ColumnSpec) -> Result<ColumnId, NotFound> {
        self.require_table(table)?;
        let column = self.build_column(spec);
        let id = column.id.clone();
        if let Some(t) = self.table_mut(table) {
            t.columns.push(column);
        }
        Ok(id)
    }

    /// Merge the supplied fields into a column.
    ///
    /// A write to `is_foreign_key` is advisory: the flag is re-derived from
    /// the relations before returning.
    pub fn update_column(
        &mut self,
        table: &TableId,
        column: &ColumnId,
        patch: ColumnPatch,
    ) -> Result<(), NotFound> {
        self.require_column(table, column)?;
        let derived = self.is_foreign_key(table, column);
        let Some(col) = self.table_mut(table).and_then(|t| t.column_mut(column)) else {
            return Ok(());
        };

        if let Some(name) = patch.name {
            col.name = name;
        }
        if let Some(column_type) = patch.column_type {
            col.column_type = column_type;
        }
        if let Some(pk) = patch.is_primary_key {
            col.is_primary_key = pk;
        }
        if let Some(unique) = patch.is_unique {
            col.is_unique = unique;
        }
        if let Some(nullable) = patch.is_nullable {
            col.is_nullable = nullable;
        }
        if let Some(requested) = patch.is_foreign_key {
            if requested != derived {
                warn!(
                    table = %table,
                    column = %column,
                    requested,
                    derived,
                    "isForeignKey write overridden by incident relations"
                );
            }
        }
        col.is_foreign_key = derived;
        Ok(())
    }

    /// Remove a column and every relation touching it, then re-derive the
    /// FK flag of the surviving endpoints.
    pub fn remove_column(&mut self, table: &TableId, column: &ColumnId) -> Result<Column, NotFound> {
        self.require_column(table, column)?;

        let (removed, kept): (Vec<Relation>, Vec<Relation>) = std::mem::take(&mut self.relations)
            .into_iter()
            .partition(|r| r.touches_column(table, column));
        self.relations = kept;

        let t = self
            .table_mut(table)
            .ok_or_else(|| NotFound::Table(table.clone()))?;
        let index = t
            .column_index(column)
            .ok_or_else(|| NotFound::Column {
                table: table.clone(),
                column: column.clone(),
            })?;
        let removed_column = t.columns.remove(index);

        for relation in &removed {
            self.refresh_foreign_key(&relation.source_table_id, &relation.source_column_id);
            self.refresh_foreign_key(&relation.target_table_id, &relation.target_column_id);
        }
        debug!(table = %table, column = %column, relations = removed.len(), "removed column");
        Ok(removed_column)
    }

    /// Move a column within its table's ordered sequence.
    pub fn reorder_column(&mut self, table: &TableId, from: usize, to: usize) -> Result<(), NotFound> {
        let t = self
            .table_mut(table)
            .ok_or_else(|| NotFound::Table(table.clone()))?;
        let len = t.columns.len();
        for index in [from, to] {
            if index >= len {
                return Err(NotFound::Position {
                    table: table.clone(),
                    index,
                    len,
                });
            }
        }
        let column = t.columns.remove(from);
        t.columns.insert(to, column);
        Ok(())
    }

    /// Create a `1:N` relation. The target column becomes a foreign key.
    pub fn connect(
        &mut self,
        source_table: &TableId,
        source_column: &ColumnId,
        target_table: &TableId,
        target_column: &ColumnId,
    ) -> Result<RelationId, NotFound> {
        self.require_column(source_table, source_column)?;
        self.require_column(target_table, target_column)?;

        let id = self.fresh_relation_id();
        self.relations.push(Relation {
            id: id.clone(),
            source_table_id: source_table.clone(),
            source_column_id: source_column.clone(),
            target_table_id: target_table.clone(),
            target_column_id: target_column.clone(),
            cardinality: Cardinality::OneToMany,
        });
        self.refresh_foreign_key(target_table, target_column);
        debug!(relation = %id, "connected");
        Ok(id)
    }

    pub fn set_cardinality(
        &mut self,
        relation: &RelationId,
        cardinality: Cardinality,
    ) -> Result<(), NotFound> {
        let r = self
            .relations
            .iter_mut()
            .find(|r| &r.id == relation)
            .ok_or_else(|| NotFound::Relation(relation.clone()))?;
        r.cardinality = cardinality;
        Ok(())
    }

    /// Remove a relation and re-derive its former target's FK flag.
    pub fn disconnect(&mut self, relation: &RelationId) -> Result<Relation, NotFound> {
        let index = self
            .relations
            .iter()
            .position(|r| &r.id == relation)
            .ok_or_else(|| NotFound::Relation(relation.clone()))?;
        let removed = self.relations.remove(index);
        self.refresh_foreign_key(&removed.target_table_id, &removed.target_column_id);
        Ok(removed)
    }

    /// The document a fresh editing session starts with.
    pub fn starter() -> Self {
        let mut graph = Self::new();
        let built = graph.build_starter();
        debug_assert!(built.is_ok(), "starter schema failed to build: {:?}", built);
        graph
    }

    fn build_starter(&mut self) -> Result<(), NotFound> {
        let users = self.add_table_with("users", None);
        let users_id = self.add_column(
            &users,
            ColumnSpec::new("id", ColumnType::Uuid).primary_key().not_null(),
        )?;
        self.add_column(&users, ColumnSpec::new("email", ColumnType::Varchar).unique().not_null())?;
        self.add_column(&users, ColumnSpec::new("created_at", ColumnType::Timestamp))?;

        let posts = self.add_table_with("posts", None);
        self.add_column(&posts, ColumnSpec::new("id", ColumnType::Uuid).primary_key().not_null())?;
        let user_id = self.add_column(&posts, ColumnSpec::new("user_id", ColumnType::Uuid).not_null())?;
        self.add_column(&posts, ColumnSpec::new("content", ColumnType::Text))?;

        self.connect(&users, &users_id, &posts, &user_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Fixture {
        graph: SchemaGraph,
        a: TableId,
        a_id: ColumnId,
        b: TableId,
        b_a_id: ColumnId,
    }

    fn fixture() -> Fixture {
        let mut graph = SchemaGraph::new();
        let a = graph.add_table_with("a", Some(ColumnSpec::primary_id()));
        let a_id = graph.table(&a).unwrap().columns[0].id.clone();
        let b = graph.add_table_with("b", Some(ColumnSpec::primary_id()));
        let b_a_id = graph
            .add_column(&b, ColumnSpec::new("a_id", ColumnType::Integer))
            .unwrap();
        Fixture {
            graph,
            a,
            a_id,
            b,
            b_a_id,
        }
    }

    #[test]
    fn test_add_table_defaults() {
        let mut graph = SchemaGraph::new();
        let t = graph.add_table();
        let table = graph.table(&t).unwrap();
        assert_eq!(table.name, "new_table");
        assert_eq!(table.columns.len(), 1);
        let id = &table.columns[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.column_type, ColumnType::Integer);
        assert!(id.is_primary_key);
        assert!(!id.is_nullable);
    }

    #[test]
    fn test_add_table_without_initial_column() {
        let mut graph = SchemaGraph::new();
        let t = graph.add_table_with("empty", None);
        assert!(graph.table(&t).unwrap().columns.is_empty());
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let mut graph = SchemaGraph::new();
        let t1 = graph.add_table();
        let t2 = graph.add_table();
        assert_ne!(t1, t2);
        let c1 = graph.tables()[0].columns[0].id.clone();
        let c2 = graph.tables()[1].columns[0].id.clone();
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_add_column_unknown_table() {
        let mut graph = SchemaGraph::new();
        let err = graph
            .add_column(&TableId::new("nope"), ColumnSpec::default())
            .unwrap_err();
        assert_eq!(err, NotFound::Table(TableId::new("nope")));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_connect_sets_target_fk() {
        let mut f = fixture();
        f.graph.connect(&f.a, &f.a_id, &f.b, &f.b_a_id).unwrap();
        let col = f.graph.column(&f.b, &f.b_a_id).unwrap();
        assert!(col.is_foreign_key);
        assert!(!f.graph.column(&f.a, &f.a_id).unwrap().is_foreign_key);
        assert_eq!(f.graph.relations()[0].cardinality, Cardinality::OneToMany);
    }

    #[test]
    fn test_connect_missing_column_is_noop() {
        let mut f = fixture();
        let err = f
            .graph
            .connect(&f.a, &ColumnId::new("ghost"), &f.b, &f.b_a_id)
            .unwrap_err();
        assert!(matches!(err, NotFound::Column { .. }));
        assert!(f.graph.relations().is_empty());
        assert!(!f.graph.column(&f.b, &f.b_a_id).unwrap().is_foreign_key);
    }

    #[test]
    fn test_disconnect_clears_fk() {
        let mut f = fixture();
        let r1 = f.graph.connect(&f.a, &f.a_id, &f.b, &f.b_a_id).unwrap();
        f.graph.disconnect(&r1).unwrap();
        assert!(!f.graph.column(&f.b, &f.b_a_id).unwrap().is_foreign_key);
        assert_eq!(f.graph.check_invariants(), Ok(()));
    }

    #[test]
    fn test_remove_target_column_drops_relation() {
        let mut f = fixture();
        f.graph.connect(&f.a, &f.a_id, &f.b, &f.b_a_id).unwrap();
        f.graph.remove_column(&f.b, &f.b_a_id).unwrap();
        assert!(f.graph.relations().is_empty());
        assert!(!f.graph.column(&f.a, &f.a_id).unwrap().is_foreign_key);
        assert_eq!(f.graph.check_invariants(), Ok(()));
    }

    #[test]
    fn test_remove_source_column_clears_target_fk() {
        let mut f = fixture();
        f.graph.connect(&f.a, &f.a_id, &f.b, &f.b_a_id).unwrap();
        f.graph.remove_column(&f.a, &f.a_id).unwrap();
        assert!(f.graph.relations().is_empty());
        assert!(!f.graph.column(&f.b, &f.b_a_id).unwrap().is_foreign_key);
    }

    #[test]
    fn test_fk_retained_until_last_relation() {
        let mut f = fixture();
        let a2 = f
            .graph
            .add_column(&f.a, ColumnSpec::new("code", ColumnType::Integer))
            .unwrap();
        let r1 = f.graph.connect(&f.a, &f.a_id, &f.b, &f.b_a_id).unwrap();
        let r2 = f.graph.connect(&f.a, &a2, &f.b, &f.b_a_id).unwrap();

        f.graph.disconnect(&r1).unwrap();
        assert!(f.graph.column(&f.b, &f.b_a_id).unwrap().is_foreign_key);
        f.graph.disconnect(&r2).unwrap();
        assert!(!f.graph.column(&f.b, &f.b_a_id).unwrap().is_foreign_key);
    }

    #[test]
    fn test_remove_table_cascades() {
        let mut f = fixture();
        f.graph.connect(&f.a, &f.a_id, &f.b, &f.b_a_id).unwrap();
        f.graph.remove_table(&f.a).unwrap();
        assert_eq!(f.graph.tables().len(), 1);
        assert!(f.graph.relations().is_empty());
        assert!(!f.graph.column(&f.b, &f.b_a_id).unwrap().is_foreign_key);
        assert_eq!(
            f.graph.remove_table(&f.a).unwrap_err(),
            NotFound::Table(f.a.clone())
        );
    }

    #[test]
    fn test_update_column_merges_fields() {
        let mut f = fixture();
        f.graph
            .update_column(
                &f.b,
                &f.b_a_id,
                ColumnPatch {
                    name: Some("owner_id".to_string()),
                    is_nullable: Some(false),
                    ..ColumnPatch::default()
                },
            )
            .unwrap();
        let col = f.graph.column(&f.b, &f.b_a_id).unwrap();
        assert_eq!(col.name, "owner_id");
        assert!(!col.is_nullable);
        assert_eq!(col.column_type, ColumnType::Integer);
    }

    #[test]
    fn test_fk_write_is_reconciled() {
        let mut f = fixture();
        f.graph
            .update_column(
                &f.a,
                &f.a_id,
                ColumnPatch {
                    is_foreign_key: Some(true),
                    ..ColumnPatch::default()
                },
            )
            .unwrap();
        assert!(!f.graph.column(&f.a, &f.a_id).unwrap().is_foreign_key);
        assert_eq!(f.graph.check_invariants(), Ok(()));
    }

    #[test]
    fn test_reconcile_repairs_stale_flags() {
        let mut f = fixture();
        f.graph.connect(&f.a, &f.a_id, &f.b, &f.b_a_id).unwrap();
        f.graph.tables[1].columns[1].is_foreign_key = false;
        assert_eq!(f.graph.reconcile_foreign_keys(), 1);
        assert_eq!(f.graph.check_invariants(), Ok(()));
    }

    #[test]
    fn test_reorder_column() {
        let mut f = fixture();
        f.graph.reorder_column(&f.b, 1, 0).unwrap();
        let names: Vec<_> = f.graph.table(&f.b).unwrap().columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a_id", "id"]);
        assert!(matches!(
            f.graph.reorder_column(&f.b, 0, 5),
            Err(NotFound::Position { index: 5, len: 2, .. })
        ));
    }

    #[test]
    fn test_set_cardinality() {
        let mut f = fixture();
        let r = f.graph.connect(&f.a, &f.a_id, &f.b, &f.b_a_id).unwrap();
        f.graph.set_cardinality(&r, Cardinality::ManyToMany).unwrap();
        assert_eq!(f.graph.relation(&r).unwrap().cardinality, Cardinality::ManyToMany);
        assert!(f
            .graph
            .set_cardinality(&RelationId::new("r404"), Cardinality::OneToOne)
            .is_err());
    }

    #[test]
    fn test_rename_allows_duplicates() {
        let mut f = fixture();
        f.graph.rename_table(&f.b, "a").unwrap();
        assert_eq!(f.graph.tables()[1].name, "a");
    }

    #[test]
    fn test_starter_schema() {
        let graph = SchemaGraph::starter();
        assert_eq!(graph.tables().len(), 2);
        assert_eq!(graph.relations().len(), 1);
        let posts = graph.table_by_name("posts").unwrap();
        assert!(posts.column_by_name("user_id").unwrap().is_foreign_key);
        let users = graph.table_by_name("users").unwrap();
        assert!(users.column_by_name("email").unwrap().is_unique);
        assert!(users.columns[0].is_primary_key && !users.columns[0].is_nullable);

        let relation = &graph.relations()[0];
        assert_eq!(relation.source_column_id, users.column_by_name("id").unwrap().id);
        assert_eq!(relation.target_column_id, posts.column_by_name("user_id").unwrap().id);
        assert_eq!(graph.check_invariants(), Ok(()));
    }

    #[derive(Debug, Clone)]
    enum Op {
        AddTable(bool),
        RemoveTable(usize),
        AddColumn(usize),
        UpdateFk(usize, usize, bool),
        RemoveColumn(usize, usize),
        Reorder(usize, usize, usize),
        Connect(usize, usize, usize, usize),
        Disconnect(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::AddTable),
            (0..6usize).prop_map(Op::RemoveTable),
            (0..6usize).prop_map(Op::AddColumn),
            (0..6usize, 0..4usize, any::<bool>()).prop_map(|(t, c, v)| Op::UpdateFk(t, c, v)),
            (0..6usize, 0..4usize).prop_map(|(t, c)| Op::RemoveColumn(t, c)),
            (0..6usize, 0..4usize, 0..4usize).prop_map(|(t, a, b)| Op::Reorder(t, a, b)),
            (0..6usize, 0..4usize, 0..6usize, 0..4usize)
                .prop_map(|(a, b, c, d)| Op::Connect(a, b, c, d)),
            (0..8usize).prop_map(Op::Disconnect),
        ]
    }

    fn table_at(graph: &SchemaGraph, i: usize) -> TableId {
        graph
            .tables()
            .get(i)
            .map(|t| t.id.clone())
            .unwrap_or_else(|| TableId::new("missing"))
    }

    fn column_at(graph: &SchemaGraph, t: usize, c: usize) -> ColumnId {
        graph
            .tables()
            .get(t)
            .and_then(|t| t.columns.get(c))
            .map(|c| c.id.clone())
            .unwrap_or_else(|| ColumnId::new("missing"))
    }

    fn apply(graph: &mut SchemaGraph, op: &Op) -> bool {
        match *op {
            Op::AddTable(with_id) => {
                let initial = with_id.then(ColumnSpec::primary_id);
                graph.add_table_with("t", initial);
                true
            }
            Op::RemoveTable(t) => graph.remove_table(&table_at(graph, t)).is_ok(),
            Op::AddColumn(t) => graph
                .add_column(&table_at(graph, t), ColumnSpec::default())
                .is_ok(),
            Op::UpdateFk(t, c, v) => {
                let patch = ColumnPatch {
                    is_foreign_key: Some(v),
                    ..ColumnPatch::default()
                };
                graph
                    .update_column(&table_at(graph, t), &column_at(graph, t, c), patch)
                    .is_ok()
            }
            Op::RemoveColumn(t, c) => graph
                .remove_column(&table_at(graph, t), &column_at(graph, t, c))
                .is_ok(),
            Op::Reorder(t, a, b) => graph.reorder_column(&table_at(graph, t), a, b).is_ok(),
            Op::Connect(st, sc, tt, tc) => graph
                .connect(
                    &table_at(graph, st),
                    &column_at(graph, st, sc),
                    &table_at(graph, tt),
                    &column_at(graph, tt, tc),
                )
                .is_ok(),
            Op::Disconnect(r) => {
                let id = graph
                    .relations()
                    .get(r)
                    .map(|r| r.id.clone())
                    .unwrap_or_else(|| RelationId::new("missing"));
                graph.disconnect(&id).is_ok()
            }
        }
    }

    proptest! {
        #[test]
        fn prop_invariants_hold_after_every_operation(
            ops in prop::collection::vec(op_strategy(), 1..40)
        ) {
            let mut graph = SchemaGraph::new();
            for op in &ops {
                let before = serde_json::to_string(&graph).unwrap();
                let applied = apply(&mut graph, op);
                prop_assert_eq!(graph.check_invariants(), Ok(()));
                if !applied {
                    prop_assert_eq!(serde_json::to_string(&graph).unwrap(), before);
                }
            }
        }
    }
}
