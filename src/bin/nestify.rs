//! nestify: Fold flat join rows into nested JSON
//!
//! Usage:
//!   # Rows as a JSON array, shape from a file
//!   nestify rows.json --shape shape.json
//!
//!   # NDJSON rows from stdin, dense lists instead of identity keys
//!   cat rows.jsonl | nestify --ndjson --shape shape.json --dense
//!
//!   # Show the compiled column paths for a shape
//!   nestify --shape shape.json --print-paths
//!
//!   # Use a hand-written column -> path map instead of a shape
//!   nestify rows.json --paths paths.json
//!
//! A shape file looks like:
//!
//!   {
//!     "structure": ["userId", "userName", {"toys": ["toyId", {"toyType": "kind"}]}],
//!     "pivots": {"[root]": "userId", "toys": "toyId"},
//!     "separator": ".",
//!     "key_mode": "dense"
//!   }

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use indexmap::IndexMap;
use nestify::nest::{
    CompiledStructure, KeyMode, NestConfig, Row, Separator, ShapeConfig, StructureCompiler,
    TreeBuilder, TreeWriter,
};
use std::fs::File;
use std::io::{BufReader, Read};

#[derive(Parser, Debug)]
#[command(name = "nestify")]
#[command(about = "Fold flat join rows into nested JSON", long_about = None)]
struct Args {
    /// Input file with rows (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Shape file: structure, pivots and optional settings
    #[arg(long, required_unless_present = "paths", conflicts_with = "paths")]
    shape: Option<String>,

    /// Pre-compiled column -> path map (JSON object)
    #[arg(long)]
    paths: Option<String>,

    /// Rows are newline-delimited JSON (one object per line)
    #[arg(long)]
    ndjson: bool,

    /// Strip identity keys; collections become lists
    #[arg(long)]
    dense: bool,

    /// Path separator (default: shape file setting, else ".")
    #[arg(long)]
    separator: Option<String>,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,

    /// Write one root entity per line
    #[arg(long)]
    lines: bool,

    /// Print the compiled column paths and exit
    #[arg(long, requires = "shape")]
    print_paths: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let (compiled, config) = load_mapping(&args)?;

    if args.print_paths {
        let json = if args.compact {
            serde_json::to_string(&compiled)?
        } else {
            serde_json::to_string_pretty(&compiled)?
        };
        println!("{}", json);
        return Ok(());
    }

    let rows = read_input(args.input.as_deref(), args.ndjson)?;
    tracing::info!(rows = rows.len(), fields = compiled.len(), "nesting rows");

    let tree = TreeBuilder::new(config)
        .map_data(&rows, &compiled)
        .context("Failed to nest rows")?;

    let stdout = std::io::stdout();
    let mut writer = TreeWriter::new(stdout.lock()).pretty(!args.compact);
    if args.lines {
        let count = writer.write_entities(&tree)?;
        tracing::info!(entities = count, "wrote entities");
    } else {
        writer.write_tree(&tree)?;
        tracing::info!(entities = tree.len(), "wrote tree");
    }

    writer.flush()
}

/// Build the compiled mapping and the config, applying flag overrides
fn load_mapping(args: &Args) -> Result<(CompiledStructure, NestConfig)> {
    let mut config = NestConfig::default();
    let mut shape = None;

    if let Some(shape_path) = &args.shape {
        let file = File::open(shape_path)
            .with_context(|| format!("Failed to open shape file: {}", shape_path))?;
        let parsed: ShapeConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse shape file: {}", shape_path))?;
        config = parsed.config();
        shape = Some(parsed);
    }

    if let Some(separator) = &args.separator {
        config.separator = Separator::new(separator.as_str())?;
    }
    if args.dense {
        config.key_mode = KeyMode::Dense;
    }

    let compiled = match (shape, &args.paths) {
        (Some(shape), _) => StructureCompiler::new(config.clone())
            .compile(&shape.structure, &shape.pivots)
            .context("Failed to compile shape")?,
        (None, Some(paths_path)) => {
            let file = File::open(paths_path)
                .with_context(|| format!("Failed to open paths file: {}", paths_path))?;
            let paths: IndexMap<String, String> = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse paths file: {}", paths_path))?;
            CompiledStructure::from_paths(paths, config.separator.clone())?
        }
        (None, None) => anyhow::bail!("either --shape or --paths is required"),
    };

    Ok((compiled, config))
}

/// Read rows from a file or stdin, using SIMD parsing for JSON arrays
fn read_input(input: Option<&str>, ndjson: bool) -> Result<Vec<Row>> {
    let reader = if let Some(file_path) = input {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open input file: {}", file_path))?;
        Box::new(file) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    if ndjson {
        return nestify::read_rows(BufReader::new(reader));
    }

    let mut content = Vec::new();
    BufReader::new(reader)
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    let rows: Vec<Row> = simd_json::serde::from_slice(&mut content)
        .context("Failed to parse rows; expected a JSON array of objects")?;
    Ok(rows)
}
