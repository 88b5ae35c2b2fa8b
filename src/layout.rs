//! Initial display positions for tables.
//!
//! Positions only matter to the canvas; the codec and the engine never read
//! them.

use crate::measure::TextMetrics;
use crate::model::{SchemaGraph, TableId};
use serde::{Deserialize, Serialize};

/// Row-major grid used for freshly imported tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    pub columns: usize,
    pub origin_x: f64,
    pub origin_y: f64,
    pub spacing_x: f64,
    pub spacing_y: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            origin_x: 100.0,
            origin_y: 100.0,
            spacing_x: 300.0,
            spacing_y: 250.0,
        }
    }
}

impl GridConfig {
    /// Top-left corner of the `index`-th cell. A column count of zero is
    /// treated as one.
    pub fn cell(&self, index: usize) -> (f64, f64) {
        let columns = self.columns.max(1);
        let col = index % columns;
        let row = index / columns;
        (
            self.origin_x + col as f64 * self.spacing_x,
            self.origin_y + row as f64 * self.spacing_y,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub table_id: TableId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub struct GridLayout {
    pub grid: GridConfig,
    metrics: TextMetrics,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridLayout {
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            metrics: TextMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &TextMetrics {
        &self.metrics
    }

    /// One placement per table, in table order.
    pub fn layout(&self, graph: &SchemaGraph) -> Vec<Placement> {
        graph
            .tables()
            .iter()
            .enumerate()
            .map(|(i, table)| {
                let (x, y) = self.grid.cell(i);
                let (width, height) = self.metrics.node_size(table);
                Placement {
                    table_id: table.id.clone(),
                    x,
                    y,
                    width,
                    height,
                }
            })
            .collect()
    }
}
