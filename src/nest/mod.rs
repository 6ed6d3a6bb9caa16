//! Result-set nesting - fold flat joined rows back into nested records
//!
//! Compile a [`Structure`] and its pivot points once with [`StructureCompiler`],
//! then feed row batches to [`TreeBuilder`].

pub mod types;
pub mod structure;
pub mod path;
pub mod compiler;
pub mod tree;
pub mod builder;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use types::{KeyMode, NestConfig, PivotTable, Row, Separator, ShapeConfig, ROOT_PIVOT};
pub use structure::{Entry, Structure};
pub use path::{CompiledPath, Segment};
pub use compiler::{CompiledStructure, StructureCompiler};
pub use tree::{IdentityKey, Node};
pub use builder::TreeBuilder;
pub use writer::TreeWriter;
