//! Compile a nested structure description into flat column paths
//!
//! Compilation happens once per result shape. The [`CompiledStructure`] it
//! produces is immutable and can be reused for any number of row batches.

use crate::error::{NestError, Result};
use crate::nest::path::{CompiledPath, Segment};
use crate::nest::structure::{Entry, Structure};
use crate::nest::types::{NestConfig, PivotTable, Separator};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

/// Source column → path of the field it fills
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStructure {
    fields: IndexMap<String, CompiledPath>,
    separator: Separator,
}

impl CompiledStructure {
    /// Build a mapping from already rendered paths
    ///
    /// # Example
    /// ```rust
    /// use nestify::nest::{CompiledStructure, Separator};
    ///
    /// let compiled = CompiledStructure::from_paths(
    ///     [
    ///         ("userId", "[userId].userId"),
    ///         ("placeId", "[userId].toys.[toyId].placesToyVisited.[placeId].placeId"),
    ///     ],
    ///     Separator::default(),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(compiled.len(), 2);
    /// ```
    pub fn from_paths<I, K, V>(paths: I, separator: Separator) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut fields = IndexMap::new();

        for (column, path) in paths {
            let column = column.into();
            let path = CompiledPath::parse(path.as_ref(), &separator, &column)?;
            if fields.insert(column.clone(), path).is_some() {
                return Err(NestError::DuplicateColumn { column });
            }
        }

        Ok(CompiledStructure { fields, separator })
    }

    pub fn get(&self, column: &str) -> Option<&CompiledPath> {
        self.fields.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompiledPath)> {
        self.fields.iter().map(|(column, path)| (column.as_str(), path))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn separator(&self) -> &Separator {
        &self.separator
    }

    /// Rendered path for a column, e.g. `[userId].toys.[toyId].toyName`
    pub fn rendered(&self, column: &str) -> Option<String> {
        self.get(column).map(|path| path.render(&self.separator))
    }

    /// Every column a row must carry: mapped columns, then identity columns
    pub fn required_columns(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut required = Vec::new();

        let mapped = self.fields.keys().map(String::as_str);
        let identities = self.fields.values().flat_map(CompiledPath::identity_columns);

        for column in mapped.chain(identities) {
            if seen.insert(column) {
                required.push(column);
            }
        }

        required
    }
}

impl Serialize for CompiledStructure {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, path) in &self.fields {
            map.serialize_entry(column, &path.render(&self.separator))?;
        }
        map.end()
    }
}

/// Turns a [`Structure`] plus its pivot points into a [`CompiledStructure`]
pub struct StructureCompiler {
    config: NestConfig,
}

impl StructureCompiler {
    pub fn new(config: NestConfig) -> Self {
        StructureCompiler { config }
    }

    /// Compile `structure` against `pivots`
    ///
    /// Fails when the root pivot is absent, or when a nested level has no
    /// pivot entry for its path (reported for the first such level reached).
    pub fn compile(&self, structure: &Structure, pivots: &PivotTable) -> Result<CompiledStructure> {
        let root = pivots.root().ok_or(NestError::MissingRootPivot)?;

        let mut fields = IndexMap::new();
        let mut clean_path = Vec::new();
        let prefix = vec![Segment::Identity(root.to_string())];

        self.compile_level(structure, &prefix, &mut clean_path, pivots, &mut fields)?;

        tracing::debug!(
            root = %root,
            fields = fields.len(),
            "compiled structure"
        );

        Ok(CompiledStructure {
            fields,
            separator: self.config.separator.clone(),
        })
    }

    fn compile_level(
        &self,
        structure: &Structure,
        prefix: &[Segment],
        clean_path: &mut Vec<String>,
        pivots: &PivotTable,
        fields: &mut IndexMap<String, CompiledPath>,
    ) -> Result<()> {
        let mut levels = HashSet::new();
        let mut outputs = HashSet::new();

        for entry in structure.entries() {
            let name = entry.output_name();
            self.warn_if_ambiguous(name);

            if let Entry::Level { .. } = entry {
                if !levels.insert(name) {
                    return Err(NestError::DuplicateLevel {
                        name: name.to_string(),
                    });
                }
            }
            if !outputs.insert(name) {
                return Err(NestError::FieldCollision {
                    name: name.to_string(),
                });
            }

            match entry {
                Entry::Column(column) => {
                    Self::insert_leaf(fields, prefix, column, column)?;
                }
                Entry::Renamed { column, field } => {
                    self.warn_if_ambiguous(column);
                    Self::insert_leaf(fields, prefix, column, field)?;
                }
                Entry::Level { name, structure } => {
                    clean_path.push(name.clone());
                    let point = clean_path.join(self.config.separator.as_str());

                    let pivot = pivots
                        .get(&point)
                        .ok_or_else(|| NestError::MissingPivot { path: point.clone() })?;

                    let mut nested = prefix.to_vec();
                    nested.push(Segment::Literal(name.clone()));
                    nested.push(Segment::Identity(pivot.to_string()));

                    self.compile_level(structure, &nested, clean_path, pivots, fields)?;
                    clean_path.pop();
                }
            }
        }

        Ok(())
    }

    fn insert_leaf(
        fields: &mut IndexMap<String, CompiledPath>,
        prefix: &[Segment],
        column: &str,
        field: &str,
    ) -> Result<()> {
        if fields.contains_key(column) {
            return Err(NestError::DuplicateColumn {
                column: column.to_string(),
            });
        }

        let mut segments = prefix.to_vec();
        segments.push(Segment::Literal(field.to_string()));
        fields.insert(column.to_string(), CompiledPath::new(segments));
        Ok(())
    }

    fn warn_if_ambiguous(&self, name: &str) {
        let separator = self.config.separator.as_str();
        if name.contains(separator) {
            tracing::warn!(
                name = %name,
                separator = %separator,
                "name contains the path separator; rendered paths will not parse back"
            );
        }
    }
}
