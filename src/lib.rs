pub mod engine;
pub mod error;
pub mod layout;
pub mod measure;
pub mod model;
pub mod session;
pub mod sql;
pub mod suggestion;

use wasm_bindgen::prelude::*;

pub use engine::{ColumnPatch, ColumnSpec};
pub use error::{ErrorKind, NotFound, SchemaError};
pub use model::{Cardinality, Column, ColumnId, ColumnType, Relation, RelationId, SchemaGraph, Table, TableId};
pub use session::Session;

use layout::{GridConfig, GridLayout};
use sql::{Import, ImportOptions};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Error thrown to JavaScript: `name` is the error kind, `message` the text.
fn js_error(err: SchemaError) -> JsValue {
    let js = js_sys::Error::new(&err.to_string());
    js.set_name(err.kind().as_str());
    js.into()
}

fn import_options(columns: Option<u32>) -> ImportOptions {
    let mut options = ImportOptions::default();
    if let Some(columns) = columns {
        options.grid = GridConfig {
            columns: columns as usize,
            ..options.grid
        };
    }
    options
}

/// Parse DDL into `{ graph, placements }` JSON
#[wasm_bindgen(js_name = "ddlToGraph")]
pub fn ddl_to_graph(source: &str, columns: Option<u32>) -> Result<String, JsValue> {
    ddl_to_json(source, &import_options(columns)).map_err(js_error)
}

/// Generate DDL from graph JSON
#[wasm_bindgen(js_name = "graphToDdl")]
pub fn graph_to_ddl(json: &str) -> Result<String, JsValue> {
    json_to_ddl(json).map_err(js_error)
}

/// The starter schema as `{ graph, placements }` JSON
#[wasm_bindgen(js_name = "starterGraph")]
pub fn starter_graph() -> Result<String, JsValue> {
    let graph = SchemaGraph::starter();
    let placements = GridLayout::default().layout(&graph);
    serde_json::to_string(&Import { graph, placements }).map_err(|e| js_error(e.into()))
}

pub fn ddl_to_json(source: &str, options: &ImportOptions) -> Result<String, SchemaError> {
    let import = sql::import_ddl(source, options)?;
    Ok(serde_json::to_string(&import)?)
}

/// Generate DDL from a graph serialized by this crate. The graph is checked
/// for consistency first since it may have been edited outside the engine.
pub fn json_to_ddl(json: &str) -> Result<String, SchemaError> {
    let graph: SchemaGraph = serde_json::from_str(json)?;
    graph.check_invariants()?;
    Ok(sql::generate(&graph)?)
}
