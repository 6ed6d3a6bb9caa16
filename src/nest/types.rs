use crate::error::{NestError, Result};
use crate::nest::structure::Structure;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Key under which the root level's identity column is registered in a [`PivotTable`]
pub const ROOT_PIVOT: &str = "[root]";

/// One denormalized row of a joined result set
pub type Row = Map<String, Value>;

/// Token joining path segments and level names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Separator(String);

impl Separator {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() || token.contains('[') || token.contains(']') {
            return Err(NestError::InvalidSeparator(token));
        }
        Ok(Separator(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Separator {
    fn default() -> Self {
        Separator(String::from("."))
    }
}

impl TryFrom<String> for Separator {
    type Error = NestError;

    fn try_from(token: String) -> Result<Self> {
        Separator::new(token)
    }
}

impl From<Separator> for String {
    fn from(separator: Separator) -> Self {
        separator.0
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How collection levels are keyed in the result tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// Collections are keyed by their identity column value
    #[default]
    Identity,
    /// Identity keys are stripped; collections become dense lists
    Dense,
}

/// Configuration shared by the compiler and the tree builder
#[derive(Debug, Clone, Default)]
pub struct NestConfig {
    /// Separator used to join level names and render compiled paths
    pub separator: Separator,

    /// Whether collections keep their identity keys
    pub key_mode: KeyMode,
}

impl NestConfig {
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }
}

/// Identity column per nesting level, keyed by level path
///
/// The root level lives under [`ROOT_PIVOT`]; nested levels under their names
/// joined by the separator, e.g. `toys` and `toys.placesToyVisited`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PivotTable {
    entries: IndexMap<String, String>,
}

impl PivotTable {
    pub fn new() -> Self {
        PivotTable::default()
    }

    pub fn with_root(self, column: impl Into<String>) -> Self {
        self.with_level(ROOT_PIVOT, column)
    }

    pub fn with_level(mut self, path: impl Into<String>, column: impl Into<String>) -> Self {
        self.insert(path, column);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, column: impl Into<String>) {
        self.entries.insert(path.into(), column.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.entries.shift_remove(path)
    }

    pub fn root(&self) -> Option<&str> {
        self.get(ROOT_PIVOT)
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PivotTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        PivotTable {
            entries: iter
                .into_iter()
                .map(|(path, column)| (path.into(), column.into()))
                .collect(),
        }
    }
}

/// A shape file: structure, pivots and optional settings in one document
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeConfig {
    pub structure: Structure,

    pub pivots: PivotTable,

    #[serde(default)]
    pub separator: Option<Separator>,

    #[serde(default)]
    pub key_mode: Option<KeyMode>,
}

impl ShapeConfig {
    /// Build a [`NestConfig`] from the file's settings, falling back to defaults
    pub fn config(&self) -> NestConfig {
        NestConfig {
            separator: self.separator.clone().unwrap_or_default(),
            key_mode: self.key_mode.unwrap_or_default(),
        }
    }
}
