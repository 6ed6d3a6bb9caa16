//! The nested result tree
//!
//! Collection levels and record levels are distinct node kinds, so stripping
//! identity keys never has to infer a level's role from its depth.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity value of one entity, used as its collection key
///
/// Keys are canonical: two cells land in the same bucket exactly when their
/// keys render the same, so a keyed collection never serializes duplicate
/// object keys. Booleans key as `1` / `0`, numeric strings as the number they
/// spell.
#[derive(Debug, Clone)]
pub enum IdentityKey {
    Int(i64),
    Float(f64),
    Str(String),
}

impl IdentityKey {
    /// Key for a row cell; `None` for null and non-scalar values
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(IdentityKey::Int(i64::from(*b))),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(IdentityKey::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Some(IdentityKey::Str(u.to_string()))
                } else {
                    n.as_f64().map(IdentityKey::from_float)
                }
            }
            Value::String(s) => Some(IdentityKey::from_text(s)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn from_text(s: &str) -> Self {
        if let Ok(i) = s.parse::<i64>() {
            if i.to_string() == s {
                return IdentityKey::Int(i);
            }
        }

        // only strings that are exactly a number's rendering join its bucket
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() && f.to_string() == s {
                return IdentityKey::from_float(f);
            }
        }

        IdentityKey::Str(s.to_string())
    }

    fn from_float(f: f64) -> Self {
        // i64::MAX as f64 rounds up to 2^63, so `<` keeps the cast below from saturating
        let in_i64 = f >= i64::MIN as f64 && f < i64::MAX as f64;
        // u64::MAX as f64 rounds up to 2^64 likewise
        let in_u64 = f >= 0.0 && f < u64::MAX as f64;

        if f.fract() != 0.0 {
            IdentityKey::Float(f)
        } else if in_i64 {
            IdentityKey::Int(f as i64)
        } else if in_u64 {
            // rendered like the u64 cell of the same value
            IdentityKey::Str((f as u64).to_string())
        } else {
            IdentityKey::Float(f)
        }
    }

    fn rank(&self) -> u8 {
        match self {
            IdentityKey::Int(_) | IdentityKey::Float(_) => 0,
            IdentityKey::Str(_) => 1,
        }
    }
}

impl PartialEq for IdentityKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IdentityKey {}

impl PartialOrd for IdentityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numbers sort before strings and compare by value.
impl Ord for IdentityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IdentityKey::Int(a), IdentityKey::Int(b)) => a.cmp(b),
            (IdentityKey::Float(a), IdentityKey::Float(b)) => a.total_cmp(b),
            // a Float never holds a value an Int can, so the two are never equal
            (IdentityKey::Int(a), IdentityKey::Float(b)) => match (*a as f64).total_cmp(b) {
                Ordering::Equal => Ordering::Less,
                ordering => ordering,
            },
            (IdentityKey::Float(a), IdentityKey::Int(b)) => match a.total_cmp(&(*b as f64)) {
                Ordering::Equal => Ordering::Greater,
                ordering => ordering,
            },
            (IdentityKey::Str(a), IdentityKey::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for IdentityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            IdentityKey::Int(i) => (1u8, i).hash(state),
            IdentityKey::Float(f) => (2u8, f.to_bits()).hash(state),
            IdentityKey::Str(s) => (3u8, s).hash(state),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Int(i) => write!(f, "{}", i),
            IdentityKey::Float(x) => write!(f, "{}", x),
            IdentityKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for IdentityKey {
    fn from(i: i64) -> Self {
        IdentityKey::Int(i)
    }
}

impl From<i32> for IdentityKey {
    fn from(i: i32) -> Self {
        IdentityKey::Int(i.into())
    }
}

impl From<bool> for IdentityKey {
    fn from(b: bool) -> Self {
        IdentityKey::Int(i64::from(b))
    }
}

impl From<&str> for IdentityKey {
    fn from(s: &str) -> Self {
        IdentityKey::from_text(s)
    }
}

impl From<String> for IdentityKey {
    fn from(s: String) -> Self {
        IdentityKey::from_text(&s)
    }
}

/// A node of the result tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A leaf value copied from a row
    Value(Value),
    /// The fields of one entity
    Record(IndexMap<String, Node>),
    /// A collection of entities keyed by identity, in first-seen order
    Keyed(IndexMap<IdentityKey, Node>),
    /// A collection of entities with identity keys stripped
    List(Vec<Node>),
}

impl Node {
    pub(crate) fn record() -> Self {
        Node::Record(IndexMap::new())
    }

    pub(crate) fn keyed() -> Self {
        Node::Keyed(IndexMap::new())
    }

    /// Field of a record
    pub fn field(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Entity of a keyed collection
    pub fn entry(&self, key: impl Into<IdentityKey>) -> Option<&Node> {
        match self {
            Node::Keyed(entries) => entries.get(&key.into()),
            _ => None,
        }
    }

    /// Entity of a dense list
    pub fn index(&self, index: usize) -> Option<&Node> {
        match self {
            Node::List(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Identity keys of a keyed collection
    pub fn keys(&self) -> Vec<&IdentityKey> {
        match self {
            Node::Keyed(entries) => entries.keys().collect(),
            _ => Vec::new(),
        }
    }

    /// Children of a collection, whichever way it is keyed
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Keyed(entries) => entries.values().collect(),
            Node::List(items) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Number of children of a collection or fields of a record
    pub fn len(&self) -> usize {
        match self {
            Node::Value(_) => 0,
            Node::Record(fields) => fields.len(),
            Node::Keyed(entries) => entries.len(),
            Node::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace every keyed collection below this node with a dense list.
    ///
    /// When called on a keyed collection the collection itself is listed too;
    /// on a record only the collections under its fields are.
    pub fn strip_identity_keys(self) -> Node {
        match self {
            Node::Value(value) => Node::Value(value),
            Node::Record(fields) => Node::Record(
                fields
                    .into_iter()
                    .map(|(name, node)| (name, node.strip_identity_keys()))
                    .collect(),
            ),
            Node::Keyed(entries) => Node::List(
                entries
                    .into_values()
                    .map(Node::strip_identity_keys)
                    .collect(),
            ),
            Node::List(items) => {
                Node::List(items.into_iter().map(Node::strip_identity_keys).collect())
            }
        }
    }

    /// Convert to a JSON value; identity keys become object keys
    ///
    /// Field and entity order is kept (`serde_json` is built with `preserve_order`).
    pub fn to_value(&self) -> Value {
        match self {
            Node::Value(value) => value.clone(),
            Node::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
            Node::Keyed(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, node)| (key.to_string(), node.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
            Node::List(items) => Value::Array(items.iter().map(Node::to_value).collect()),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Value(value) => value.serialize(serializer),
            Node::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, node) in fields {
                    map.serialize_entry(name, node)?;
                }
                map.end()
            }
            Node::Keyed(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, node) in entries {
                    map.serialize_entry(&key.to_string(), node)?;
                }
                map.end()
            }
            Node::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for node in items {
                    seq.serialize_element(node)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keyed(entries: Vec<(IdentityKey, Node)>) -> Node {
        Node::Keyed(entries.into_iter().collect())
    }

    fn record(fields: Vec<(&str, Node)>) -> Node {
        Node::Record(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn test_identity_key_from_value() {
        assert_eq!(IdentityKey::from_value(&json!(3)), Some(IdentityKey::Int(3)));
        assert_eq!(IdentityKey::from_value(&json!(3.0)), Some(IdentityKey::Int(3)));
        assert_eq!(IdentityKey::from_value(&json!("a")), Some(IdentityKey::from("a")));
        assert_eq!(IdentityKey::from_value(&json!(true)), Some(IdentityKey::Int(1)));
        assert_eq!(IdentityKey::from_value(&json!(null)), None);
        assert_eq!(IdentityKey::from_value(&json!([1])), None);
        assert!(matches!(
            IdentityKey::from_value(&json!(2.5)),
            Some(IdentityKey::Float(_))
        ));
    }

    #[test]
    fn test_identity_key_ordering() {
        let mut keys = vec![
            IdentityKey::from("b"),
            IdentityKey::Int(66),
            IdentityKey::Float(3.5),
            IdentityKey::from(false),
            IdentityKey::Int(3),
            IdentityKey::from("a"),
        ];
        keys.sort();

        assert_eq!(
            keys,
            vec![
                IdentityKey::Int(0),
                IdentityKey::Int(3),
                IdentityKey::Float(3.5),
                IdentityKey::Int(66),
                IdentityKey::from("a"),
                IdentityKey::from("b"),
            ]
        );
    }

    #[test]
    fn test_numeric_strings_share_the_number_key() {
        assert_eq!(IdentityKey::from_value(&json!("1")), Some(IdentityKey::Int(1)));
        assert_eq!(IdentityKey::from_value(&json!("-7")), Some(IdentityKey::Int(-7)));
        assert_eq!(IdentityKey::from_value(&json!("2.5")), Some(IdentityKey::Float(2.5)));

        // not the canonical rendering of a number
        assert_eq!(IdentityKey::from_value(&json!("01")), Some(IdentityKey::Str("01".into())));
        assert_eq!(IdentityKey::from_value(&json!("1.0")), Some(IdentityKey::Str("1.0".into())));
        assert_eq!(IdentityKey::from_value(&json!(" 1")), Some(IdentityKey::Str(" 1".into())));
    }

    #[test]
    fn test_large_integers_share_one_key() {
        let big = u64::MAX;
        let from_number = IdentityKey::from_value(&json!(big)).unwrap();
        let from_string = IdentityKey::from_value(&json!(big.to_string())).unwrap();
        assert_eq!(from_number, from_string);

        // 2^63 is the first value past i64::MAX
        let edge = IdentityKey::from_value(&json!(9_223_372_036_854_775_808u64)).unwrap();
        assert_eq!(IdentityKey::from_value(&json!(9_223_372_036_854_775_808.0)), Some(edge.clone()));
        assert_eq!(IdentityKey::from_value(&json!("9223372036854775808")), Some(edge));
    }

    #[test]
    fn test_distinct_keys_render_distinctly() {
        let cells = [
            json!(1),
            json!("1"),
            json!(1.0),
            json!(true),
            json!(2.5),
            json!("2.5"),
            json!(u64::MAX),
            json!(u64::MAX.to_string()),
            json!(9_223_372_036_854_775_808.0),
            json!("x"),
        ];
        let keys: Vec<IdentityKey> = cells.iter().filter_map(IdentityKey::from_value).collect();

        for a in &keys {
            for b in &keys {
                assert_eq!(a == b, a.to_string() == b.to_string(), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_strip_keeps_record_level() {
        let entity = record(vec![
            ("userId", Node::Value(json!(3))),
            (
                "toys",
                keyed(vec![
                    (
                        IdentityKey::Int(14),
                        record(vec![
                            ("toyId", Node::Value(json!(14))),
                            (
                                "places",
                                keyed(vec![(
                                    IdentityKey::Int(33),
                                    record(vec![("placeId", Node::Value(json!(33)))]),
                                )]),
                            ),
                        ]),
                    ),
                    (
                        IdentityKey::Int(7),
                        record(vec![("toyId", Node::Value(json!(7)))]),
                    ),
                ]),
            ),
        ]);

        let stripped = entity.strip_identity_keys();

        assert_eq!(
            stripped.to_value(),
            json!({
                "userId": 3,
                "toys": [
                    {"toyId": 14, "places": [{"placeId": 33}]},
                    {"toyId": 7}
                ]
            })
        );
    }

    #[test]
    fn test_keyed_serializes_as_object() {
        let tree = keyed(vec![(
            IdentityKey::Int(3),
            record(vec![("userId", Node::Value(json!(3)))]),
        )]);

        assert_eq!(serde_json::to_value(&tree).unwrap(), json!({"3": {"userId": 3}}));
        assert_eq!(serde_json::to_value(&tree).unwrap(), tree.to_value());
        assert_eq!(tree.entry(3).and_then(|n| n.field("userId")).and_then(Node::as_value), Some(&json!(3)));
    }

    #[test]
    fn test_to_value_keeps_first_seen_order() {
        let tree = keyed(vec![
            (
                IdentityKey::Int(7),
                record(vec![("toyName", Node::Value(json!("Rover"))), ("toyId", Node::Value(json!(7)))]),
            ),
            (IdentityKey::Int(14), record(vec![("toyId", Node::Value(json!(14)))])),
        ]);

        assert_eq!(
            serde_json::to_string(&tree.to_value()).unwrap(),
            r#"{"7":{"toyName":"Rover","toyId":7},"14":{"toyId":14}}"#
        );
        assert_eq!(
            serde_json::to_string(&tree.to_value()).unwrap(),
            serde_json::to_string(&tree).unwrap()
        );
    }
}
