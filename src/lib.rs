//! # Nestify - nested records from flat join results
//!
//! A join across one-to-many relationships repeats the parent columns on every
//! child row. Nestify folds such rows back into one nested record per root
//! entity, deduplicating children at every level by their identity column.
//!
//! ## Modules
//!
//! - **nest**: structure compiler, tree builder, result tree and writer
//! - **error**: the error type shared by all operations
//!
//! ## Quick Start
//!
//! ```rust
//! use nestify::nest::{KeyMode, NestConfig, PivotTable, Structure, StructureCompiler, TreeBuilder};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let structure = Structure::new()
//!     .column("userId")
//!     .column("userName")
//!     .level("toys", Structure::new().column("toyId").column("toyName"));
//!
//! let pivots = PivotTable::new()
//!     .with_root("userId")
//!     .with_level("toys", "toyId");
//!
//! let config = NestConfig::default().with_key_mode(KeyMode::Dense);
//! let compiled = StructureCompiler::new(config.clone()).compile(&structure, &pivots)?;
//!
//! let rows: Vec<_> = [
//!     json!({"userId": 3, "userName": "Alice", "toyId": 7, "toyName": "Rover"}),
//!     json!({"userId": 3, "userName": "Alice", "toyId": 14, "toyName": "Squidily"}),
//! ]
//! .into_iter()
//! .filter_map(|row| row.as_object().cloned())
//! .collect();
//!
//! let tree = TreeBuilder::new(config).map_data(&rows, &compiled)?;
//!
//! assert_eq!(
//!     tree.to_value(),
//!     json!([{
//!         "userId": 3,
//!         "userName": "Alice",
//!         "toys": [
//!             {"toyId": 7, "toyName": "Rover"},
//!             {"toyId": 14, "toyName": "Squidily"}
//!         ]
//!     }])
//! );
//! # Ok(())
//! # }
//! ```

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::io::BufRead;

pub mod error;
pub mod nest;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, NestError};
pub use nest::{
    CompiledStructure, KeyMode, NestConfig, Node, PivotTable, Row, ShapeConfig, Structure,
    StructureCompiler, TreeBuilder,
};

/// Compile the shape and map `rows` in one go
pub fn nest_rows(rows: &[Row], shape: &ShapeConfig) -> Result<Node, NestError> {
    let config = shape.config();
    let compiled = StructureCompiler::new(config.clone()).compile(&shape.structure, &shape.pivots)?;
    TreeBuilder::new(config).map_data(rows, &compiled)
}

/// Main entry point: read newline-delimited JSON rows and nest them
pub fn nest_json<R: BufRead>(reader: R, shape: &ShapeConfig) -> Result<Node> {
    let rows = read_rows(reader)?;
    let tree = nest_rows(&rows, shape)?;
    Ok(tree)
}

/// Read one JSON object per line, skipping blank lines
pub fn read_rows<R: BufRead>(reader: R) -> Result<Vec<Row>> {
    let mut rows = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", number + 1))?;
        match value {
            Value::Object(row) => rows.push(row),
            _ => bail!("Line {} is not a JSON object", number + 1),
        }
    }

    Ok(rows)
}
