//! Benchmark nesting of synthetic join rows in both key modes
//!
//! Generates users × toys × places rows the way a three-table join returns
//! them, then times compilation and tree building.

use nestify::nest::{KeyMode, NestConfig, PivotTable, Row, Structure, StructureCompiler, TreeBuilder};
use serde_json::json;
use std::time::Instant;

const USERS: i64 = 2000;
const TOYS_PER_USER: i64 = 5;
const PLACES_PER_TOY: i64 = 4;

fn main() -> anyhow::Result<()> {
    println!("=== Nestify Benchmark ===\n");

    let mut rows: Vec<Row> = Vec::new();
    for user in 0..USERS {
        for toy in 0..TOYS_PER_USER {
            for place in 0..PLACES_PER_TOY {
                let row = json!({
                    "userId": user,
                    "userName": format!("user{}", user),
                    "age": 20 + user % 50,
                    "toyId": user * 100 + toy,
                    "toyName": format!("toy {}", toy),
                    "placeId": place,
                    "placeName": format!("place {}", place),
                });
                if let serde_json::Value::Object(row) = row {
                    rows.push(row);
                }
            }
        }
    }

    // interleave users so dense mode has real sorting to do
    let shuffled: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, _)| rows[(i * 7919) % rows.len()].clone())
        .collect();

    println!("Generated {} rows for {} users\n", rows.len(), USERS);

    let structure = Structure::new()
        .column("userId")
        .column("userName")
        .column("age")
        .level(
            "toys",
            Structure::new().column("toyId").column("toyName").level(
                "places",
                Structure::new().column("placeId").column("placeName"),
            ),
        );
    let pivots = PivotTable::new()
        .with_root("userId")
        .with_level("toys", "toyId")
        .with_level("toys.places", "placeId");

    let compile_start = Instant::now();
    let compiled = StructureCompiler::new(NestConfig::default()).compile(&structure, &pivots)?;
    println!("Compile time: {:?}\n", compile_start.elapsed());

    for (label, key_mode, input) in [
        ("identity keys, ordered rows", KeyMode::Identity, &rows),
        ("identity keys, shuffled rows", KeyMode::Identity, &shuffled),
        ("dense lists, ordered rows", KeyMode::Dense, &rows),
        ("dense lists, shuffled rows", KeyMode::Dense, &shuffled),
    ] {
        let builder = TreeBuilder::new(NestConfig::default().with_key_mode(key_mode));

        let start = Instant::now();
        let tree = builder.map_data(input, &compiled)?;
        let duration = start.elapsed();

        println!("=== {} ===", label);
        println!("Time: {:?}", duration);
        println!("Root entities: {}", tree.len());
        println!(
            "Average per row: {:.2}μs\n",
            duration.as_micros() as f64 / input.len() as f64
        );
    }

    Ok(())
}
