//! Declarative description of the nested output shape
//!
//! A [`Structure`] lists, per level, which columns to copy (optionally under a new
//! field name) and which named sub-levels hold one-to-many children.
//!
//! Its JSON form mirrors the nesting directly:
//!
//! ```json
//! ["userId", {"age": "leeftijd"}, {"toys": ["toyId", "toyName"]}]
//! ```
//!
//! A string is a column, an object member with a string value renames a column,
//! and an object member with an array value opens a sub-level.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One entry of a structure level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Copy the column under its own name
    Column(String),
    /// Copy the column under a different output field name
    Renamed { column: String, field: String },
    /// A nested one-to-many level
    Level { name: String, structure: Structure },
}

impl Entry {
    /// Name this entry occupies in the output record
    pub fn output_name(&self) -> &str {
        match self {
            Entry::Column(column) => column,
            Entry::Renamed { field, .. } => field,
            Entry::Level { name, .. } => name,
        }
    }
}

/// Ordered entries of one nesting level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RawItem>", into = "Vec<RawItem>")]
pub struct Structure {
    entries: Vec<Entry>,
}

impl Structure {
    pub fn new() -> Self {
        Structure::default()
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.entries.push(Entry::Column(column.into()));
        self
    }

    pub fn renamed(mut self, column: impl Into<String>, field: impl Into<String>) -> Self {
        self.entries.push(Entry::Renamed {
            column: column.into(),
            field: field.into(),
        });
        self
    }

    pub fn level(mut self, name: impl Into<String>, structure: Structure) -> Self {
        self.entries.push(Entry::Level {
            name: name.into(),
            structure,
        });
        self
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of leaf fields in this level and all levels below it
    pub fn leaf_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Level { structure, .. } => structure.leaf_count(),
                _ => 1,
            })
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawItem {
    Column(String),
    Members(IndexMap<String, RawMember>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawMember {
    Renamed(String),
    Level(Structure),
}

impl From<Vec<RawItem>> for Structure {
    fn from(items: Vec<RawItem>) -> Self {
        let mut entries = Vec::new();

        for item in items {
            match item {
                RawItem::Column(column) => entries.push(Entry::Column(column)),
                RawItem::Members(members) => {
                    for (key, member) in members {
                        entries.push(match member {
                            RawMember::Renamed(field) => Entry::Renamed { column: key, field },
                            RawMember::Level(structure) => Entry::Level { name: key, structure },
                        });
                    }
                }
            }
        }

        Structure { entries }
    }
}

impl From<Structure> for Vec<RawItem> {
    fn from(structure: Structure) -> Self {
        structure
            .entries
            .into_iter()
            .map(|entry| match entry {
                Entry::Column(column) => RawItem::Column(column),
                Entry::Renamed { column, field } => {
                    RawItem::Members(IndexMap::from([(column, RawMember::Renamed(field))]))
                }
                Entry::Level { name, structure } => {
                    RawItem::Members(IndexMap::from([(name, RawMember::Level(structure))]))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structure_from_json() {
        let structure: Structure = serde_json::from_value(json!([
            "userId",
            {"age": "leeftijd"},
            {"toys": ["toyId", {"toyType": "soort"}, {"placesToyVisited": ["placeId"]}]}
        ]))
        .unwrap();

        let expected = Structure::new()
            .column("userId")
            .renamed("age", "leeftijd")
            .level(
                "toys",
                Structure::new()
                    .column("toyId")
                    .renamed("toyType", "soort")
                    .level("placesToyVisited", Structure::new().column("placeId")),
            );

        assert_eq!(structure, expected);
        assert_eq!(structure.leaf_count(), 5);
    }

    #[test]
    fn test_object_with_several_members() {
        let structure: Structure = serde_json::from_value(json!([
            {"age": "leeftijd", "name": "naam", "pets": ["petId"]}
        ]))
        .unwrap();

        let names: Vec<&str> = structure.entries().iter().map(Entry::output_name).collect();
        assert_eq!(names, vec!["leeftijd", "naam", "pets"]);
    }

    #[test]
    fn test_structure_serializes_back() {
        let structure = Structure::new()
            .column("userId")
            .renamed("age", "leeftijd")
            .level("toys", Structure::new().column("toyId"));

        let value = serde_json::to_value(&structure).unwrap();
        assert_eq!(
            value,
            json!(["userId", {"age": "leeftijd"}, {"toys": ["toyId"]}])
        );
    }

    #[test]
    fn test_rejects_non_string_column() {
        let result: Result<Structure, _> = serde_json::from_value(json!([42]));
        assert!(result.is_err());
    }
}
