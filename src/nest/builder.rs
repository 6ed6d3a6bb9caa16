//! Build the nested result tree from flat rows
//!
//! Every row is routed through each compiled path. Identity segments pick (or
//! create) the entity a row belongs to at that level, so rows repeating the same
//! parent columns fold into one record with deduplicated children.

use crate::error::{NestError, Result};
use crate::nest::compiler::CompiledStructure;
use crate::nest::path::{CompiledPath, Segment};
use crate::nest::tree::{IdentityKey, Node};
use crate::nest::types::{KeyMode, NestConfig, Row};
use serde_json::Value;

/// Applies a [`CompiledStructure`] to batches of rows
pub struct TreeBuilder {
    config: NestConfig,
}

impl TreeBuilder {
    pub fn new(config: NestConfig) -> Self {
        TreeBuilder { config }
    }

    /// Map `rows` into a tree shaped by `compiled`
    ///
    /// With [`KeyMode::Identity`] the result is keyed by root identity and rows
    /// are folded in arrival order. With [`KeyMode::Dense`] rows are first stably
    /// sorted by root identity, and each collection becomes a dense list. Sibling
    /// order below the root follows the order rows arrive in after that sort.
    pub fn map_data(&self, rows: &[Row], compiled: &CompiledStructure) -> Result<Node> {
        if rows.is_empty() {
            return Err(NestError::EmptyRows);
        }
        if compiled.is_empty() {
            return Err(NestError::EmptyMapping);
        }

        let root = Self::detect_root(compiled)?;
        Self::check_columns(rows, compiled)?;

        let root_keys: Vec<Option<IdentityKey>> = rows
            .iter()
            .map(|row| row.get(root).and_then(IdentityKey::from_value))
            .collect();

        let mut order: Vec<usize> = (0..rows.len()).collect();
        let dense = self.config.key_mode == KeyMode::Dense;
        if dense {
            order.sort_by(|&a, &b| root_keys[a].cmp(&root_keys[b]));
        }

        let mut tree = Node::keyed();
        let mut previous: Option<&IdentityKey> = None;

        for index in order {
            let Some(current) = root_keys[index].as_ref() else {
                tracing::trace!(row = index, root = %root, "row has no root identity, skipping");
                continue;
            };

            if dense {
                if let Some(previous) = previous.filter(|previous| *previous != current) {
                    Self::finalize_entity(&mut tree, previous);
                }
            }

            let row = &rows[index];
            for (column, path) in compiled.iter() {
                Self::set_value(&mut tree, path, column, row)?;
            }

            previous = Some(current);
        }

        if dense {
            if let Some(previous) = previous {
                Self::finalize_entity(&mut tree, previous);
            }
            tree = match tree {
                Node::Keyed(entries) => Node::List(entries.into_values().collect()),
                other => other,
            };
        }

        tracing::debug!(
            rows = rows.len(),
            entities = tree.len(),
            key_mode = ?self.config.key_mode,
            "mapped rows"
        );

        Ok(tree)
    }

    /// Root identity column, taken from the first path and required of all others
    fn detect_root(compiled: &CompiledStructure) -> Result<&str> {
        let mut paths = compiled.iter();

        let Some((first_column, first_path)) = paths.next() else {
            return Err(NestError::EmptyMapping);
        };
        let root = first_path
            .root_column()
            .ok_or_else(|| NestError::MissingRootElement {
                column: first_column.to_string(),
            })?;

        for (column, path) in paths {
            if path.root_column() != Some(root) {
                return Err(NestError::InconsistentRoot {
                    column: column.to_string(),
                    expected: root.to_string(),
                    found: path
                        .segments()
                        .first()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                });
            }
        }

        Ok(root)
    }

    fn check_columns(rows: &[Row], compiled: &CompiledStructure) -> Result<()> {
        let required = compiled.required_columns();

        for (index, row) in rows.iter().enumerate() {
            let missing: Vec<String> = required
                .iter()
                .filter(|column| !row.contains_key(**column))
                .map(|column| column.to_string())
                .collect();

            if !missing.is_empty() {
                return Err(NestError::MissingColumns { row: index, missing });
            }
        }

        Ok(())
    }

    /// Write `row[column]` at `path`, creating containers along the way.
    ///
    /// A null or absent identity cell ends the walk without writing: the row
    /// simply has no entity at that level.
    fn set_value(tree: &mut Node, path: &CompiledPath, column: &str, row: &Row) -> Result<()> {
        let Some((leaf, steps)) = path.segments().split_last() else {
            return Ok(());
        };

        let conflict = |segment: &Segment| NestError::PathConflict {
            column: column.to_string(),
            segment: segment.to_string(),
        };

        let mut node = tree;
        for (position, segment) in steps.iter().enumerate() {
            let next_is_identity = steps
                .get(position + 1)
                .is_some_and(Segment::is_identity);
            let container = || if next_is_identity { Node::keyed() } else { Node::record() };

            node = match (segment, node) {
                (Segment::Identity(identity), Node::Keyed(entries)) => {
                    let Some(key) = row.get(identity).and_then(IdentityKey::from_value) else {
                        return Ok(());
                    };
                    entries.entry(key).or_insert_with(container)
                }
                (Segment::Literal(name), Node::Record(fields)) => {
                    fields.entry(name.clone()).or_insert_with(container)
                }
                _ => return Err(conflict(segment)),
            };
        }

        let Node::Record(fields) = node else {
            return Err(conflict(leaf));
        };
        if let Some(existing) = fields.get(leaf.name()) {
            if !matches!(existing, Node::Value(_)) {
                return Err(conflict(leaf));
            }
        }

        let value = row.get(column).cloned().unwrap_or(Value::Null);
        fields.insert(leaf.name().to_string(), Node::Value(value));
        Ok(())
    }

    /// Strip identity keys inside one root entity once all of its rows are in
    fn finalize_entity(tree: &mut Node, key: &IdentityKey) {
        if let Node::Keyed(entries) = tree {
            if let Some(entity) = entries.get_mut(key) {
                let built = std::mem::replace(entity, Node::record());
                *entity = built.strip_identity_keys();
            }
        }
    }
}
