//! Shared test data: two users with their toys and the places those toys visited

use crate::nest::structure::Structure;
use crate::nest::types::{PivotTable, Row};
use serde_json::{json, Value};

pub fn structure() -> Structure {
    Structure::new()
        .column("userId")
        .column("userName")
        .column("age")
        .level(
            "toys",
            Structure::new()
                .column("toyId")
                .column("toyType")
                .column("toyName")
                .level(
                    "placesToyVisited",
                    Structure::new().column("placeId").column("placeName"),
                ),
        )
}

pub fn renamed_structure() -> Structure {
    Structure::new()
        .column("userId")
        .column("userName")
        .renamed("age", "leeftijd")
        .level(
            "toys",
            Structure::new()
                .column("toyId")
                .renamed("toyType", "soort")
                .column("toyName")
                .level(
                    "placesToyVisited",
                    Structure::new().column("placeId").column("placeName"),
                ),
        )
}

pub fn pivots() -> PivotTable {
    PivotTable::new()
        .with_root("userId")
        .with_level("toys", "toyId")
        .with_level("toys.placesToyVisited", "placeId")
}

fn to_rows(values: Vec<Value>) -> Vec<Row> {
    values
        .into_iter()
        .map(|value| match value {
            Value::Object(row) => row,
            other => panic!("fixture row is not an object: {other}"),
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn row(
    user_id: i64,
    user_name: &str,
    age: i64,
    toy_id: i64,
    toy_type: &str,
    toy_name: &str,
    place_id: Option<i64>,
    place_name: Option<&str>,
) -> Value {
    json!({
        "userId": user_id,
        "userName": user_name,
        "age": age,
        "toyId": toy_id,
        "toyType": toy_type,
        "toyName": toy_name,
        "placeId": place_id,
        "placeName": place_name,
    })
}

pub fn dataset() -> Vec<Row> {
    to_rows(vec![
        row(3, "MoròSwitie", 37, 7, "car", "Rover", Some(33), Some("Australia")),
        row(3, "MoròSwitie", 37, 7, "car", "Rover", Some(34), Some("New Zealand")),
        row(3, "MoròSwitie", 37, 14, "car", "squidily", Some(33), Some("Australia")),
        row(3, "MoròSwitie", 37, 14, "car", "squidily", Some(34), Some("New Zealand")),
        row(3, "MoròSwitie", 37, 14, "car", "squidily", Some(35), Some("Japan")),
        row(66, "Angie", 32, 114, "guitar", "Lucille", None, None),
        row(66, "Angie", 32, 115, "guitar", "Lucy", Some(35), Some("Japan")),
    ])
}

/// The same rows as [`dataset`], with the two users interleaved
pub fn dataset_unordered() -> Vec<Row> {
    to_rows(vec![
        row(66, "Angie", 32, 115, "guitar", "Lucy", Some(35), Some("Japan")),
        row(3, "MoròSwitie", 37, 7, "car", "Rover", Some(33), Some("Australia")),
        row(3, "MoròSwitie", 37, 14, "car", "squidily", Some(33), Some("Australia")),
        row(66, "Angie", 32, 114, "guitar", "Lucille", None, None),
        row(3, "MoròSwitie", 37, 7, "car", "Rover", Some(34), Some("New Zealand")),
        row(3, "MoròSwitie", 37, 14, "car", "squidily", Some(34), Some("New Zealand")),
        row(3, "MoròSwitie", 37, 14, "car", "squidily", Some(35), Some("Japan")),
    ])
}

/// Second row lacks the toy columns
pub fn dataset_invalid() -> Vec<Row> {
    to_rows(vec![
        row(3, "MoròSwitie", 37, 7, "car", "Rover", Some(33), Some("Australia")),
        json!({
            "userId": 3,
            "userName": "MoròSwitie",
            "age": 37,
            "placeId": 34,
            "placeName": "New Zealand",
        }),
    ])
}

/// Two bad rows, each lacking different columns
pub fn dataset_invalid_twice() -> Vec<Row> {
    to_rows(vec![
        row(3, "MoròSwitie", 37, 7, "car", "Rover", Some(33), Some("Australia")),
        json!({
            "userId": 3,
            "userName": "MoròSwitie",
            "age": 37,
            "placeId": 34,
            "placeName": "New Zealand",
        }),
        json!({
            "userId": 66,
            "userName": "Angie",
            "age": 22,
            "toyId": 114,
            "toyType": "doll",
            "toyName": "Barbie",
        }),
    ])
}
