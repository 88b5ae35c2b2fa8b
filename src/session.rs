//! An editing session: one graph plus the display positions of its tables.

use crate::error::{NotFound, SchemaError};
use crate::layout::{GridLayout, Placement};
use crate::model::{SchemaGraph, TableId};
use crate::sql::{self, ImportOptions};
use crate::suggestion::{SchemaSuggestion, SuggestionProvider};
use tracing::{info, warn};

/// Owns the current graph. Import and suggestion results replace it whole;
/// on failure the previous graph and placements are kept.
///
/// The session has no interior mutability. Hosts that share it between
/// threads wrap it in a single `Mutex`.
#[derive(Debug, Default)]
pub struct Session {
    graph: SchemaGraph,
    placements: Vec<Placement>,
    options: ImportOptions,
}

impl Session {
    pub fn new(options: ImportOptions) -> Self {
        Self {
            graph: SchemaGraph::new(),
            placements: Vec::new(),
            options,
        }
    }

    /// A session opened on the starter schema.
    pub fn with_sample(options: ImportOptions) -> Self {
        let mut session = Self::new(options);
        session.replace(SchemaGraph::starter());
        session
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    /// Engine access for edits. Tables added this way get no placement
    /// until [`Session::relayout`] or [`Session::place`] is called.
    pub fn graph_mut(&mut self) -> &mut SchemaGraph {
        &mut self.graph
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn placement(&self, table: &TableId) -> Option<&Placement> {
        self.placements.iter().find(|p| &p.table_id == table)
    }

    /// Parse `source` and, on success, replace the graph and placements.
    pub fn import_ddl(&mut self, source: &str) -> Result<(), SchemaError> {
        match sql::import_ddl(source, &self.options) {
            Ok(import) => {
                info!(
                    tables = import.graph.tables().len(),
                    relations = import.graph.relations().len(),
                    "imported DDL"
                );
                self.graph = import.graph;
                self.placements = import.placements;
                Ok(())
            }
            Err(e) => {
                warn!(kind = %e.kind(), "import failed: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn export_ddl(&self) -> Result<String, SchemaError> {
        let ddl = sql::generate(&self.graph)?;
        info!(
            tables = self.graph.tables().len(),
            relations = self.graph.relations().len(),
            "exported DDL"
        );
        Ok(ddl)
    }

    /// Replace the graph with a suggested one laid out on the grid.
    pub fn apply_suggestion(&mut self, suggestion: &SchemaSuggestion) -> Result<(), SchemaError> {
        let graph = SchemaGraph::from_suggestion(suggestion)?;
        info!(
            tables = graph.tables().len(),
            relations = graph.relations().len(),
            "applied suggestion"
        );
        self.replace(graph);
        Ok(())
    }

    /// Ask `provider` for a suggestion and apply it.
    pub fn request_suggestion<P: SuggestionProvider + ?Sized>(
        &mut self,
        provider: &P,
        prompt: &str,
    ) -> Result<(), SchemaError> {
        let suggestion = provider.suggest(prompt).map_err(|e| {
            warn!("suggestion failed: {}", e);
            e
        })?;
        self.apply_suggestion(&suggestion)
    }

    fn grid_layout(&self) -> GridLayout {
        GridLayout::new(self.options.grid)
    }

    /// Recompute every placement on the grid.
    pub fn relayout(&mut self) {
        self.placements = self.grid_layout().layout(&self.graph);
    }

    /// Move a table, adding a placement if it has none.
    pub fn place(&mut self, table: &TableId, x: f64, y: f64) -> Result<(), NotFound> {
        let t = self
            .graph
            .table(table)
            .ok_or_else(|| NotFound::Table(table.clone()))?;
        match self.placements.iter_mut().find(|p| &p.table_id == table) {
            Some(p) => {
                p.x = x;
                p.y = y;
            }
            None => {
                let (width, height) = self.grid_layout().metrics().node_size(t);
                self.placements.push(Placement {
                    table_id: table.clone(),
                    x,
                    y,
                    width,
                    height,
                });
            }
        }
        Ok(())
    }

    /// Resize a placed table; sizes below the node minimum are raised to it.
    pub fn resize(&mut self, table: &TableId, width: f64, height: f64) -> Result<(), NotFound> {
        let layout = self.grid_layout();
        let p = self
            .placements
            .iter_mut()
            .find(|p| &p.table_id == table)
            .ok_or_else(|| NotFound::Table(table.clone()))?;
        (p.width, p.height) = layout.metrics().clamp_size(width, height);
        Ok(())
    }

    /// Drop placements whose table no longer exists.
    pub fn prune_placements(&mut self) {
        let graph = &self.graph;
        self.placements.retain(|p| graph.table(&p.table_id).is_some());
    }

    fn replace(&mut self, graph: SchemaGraph) {
        self.graph = graph;
        self.relayout();
    }
}
