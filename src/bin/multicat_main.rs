//! Multicat CLI
//!
//! Usage:
//!   multicat --input data.json --category cat_x,cat_y --value v --agg sum,count
//!
//! Reads a table (JSON array of objects, or newline-delimited JSON objects),
//! aggregates it over the given non-exclusive indicator columns, and writes
//! the result as JSON to stdout or to --output.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;

use multicat::{
    AggError, AggregateFunc, Aggregation, AggregationOptions, EmptyPolicy, Row, Table,
};

#[derive(Parser, Debug)]
#[command(name = "multicat")]
#[command(about = "Aggregate a table over non-exclusive indicator categories")]
#[command(version)]
struct Args {
    /// Input table: JSON array of objects, or one JSON object per line
    #[arg(short, long)]
    input: PathBuf,

    /// Indicator columns defining the categories, in output order
    #[arg(short, long, required = true, value_delimiter = ',')]
    category: Vec<String>,

    /// Numeric columns to aggregate
    #[arg(short, long, value_delimiter = ',')]
    value: Vec<String>,

    /// Aggregate functions: count, sum, mean (or avg), min, max
    #[arg(short, long, value_delimiter = ',', default_value = "count")]
    agg: Vec<String>,

    /// Output path; defaults to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail when a declared column is absent from a record
    #[arg(long)]
    strict_schema: bool,

    /// Treat any non-zero number or non-empty string as a set flag
    #[arg(long)]
    coerce_flags: bool,

    /// Fail on null values instead of excluding them from the aggregate
    #[arg(long)]
    no_skip_null: bool,

    /// Fail on empty categories for mean/min/max instead of emitting null
    #[arg(long)]
    empty_error: bool,

    /// Reduce categories in parallel
    #[arg(long)]
    parallel: bool,

    /// Sort result rows by category name instead of declaration order
    #[arg(long)]
    sort: bool,
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> multicat::Result<()> {
    let table = load_table(&args.input)?;
    log::debug!("loaded {} rows from {}", table.len(), args.input.display());

    let mut request = Aggregation::new(args.category.clone())
        .values(args.value.clone())
        .options(
            AggregationOptions::default()
                .strict_schema(args.strict_schema)
                .coerce_flags(args.coerce_flags)
                .skip_null(!args.no_skip_null)
                .empty_policy(if args.empty_error {
                    EmptyPolicy::Error
                } else {
                    EmptyPolicy::Null
                })
                .parallel(args.parallel),
        );
    for name in &args.agg {
        let func = AggregateFunc::parse(name).ok_or_else(|| {
            AggError::Configuration(format!("unknown aggregate function '{}'", name))
        })?;
        request = request.aggregate(func);
    }

    let mut result = request.run(&table)?;
    if args.sort {
        result.sort_by_category();
    }

    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| AggError::Serialization(e.to_string()))?;
    match &args.output {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}

/// Load a table from a JSON array, falling back to newline-delimited JSON
fn load_table(path: &PathBuf) -> multicat::Result<Table> {
    let text = fs::read_to_string(path)?;
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| AggError::Serialization(e.to_string()))
    } else {
        let mut table = Table::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row: Row = serde_json::from_str(line)
                .map_err(|e| AggError::Serialization(e.to_string()))?;
            table.push(row);
        }
        Ok(table)
    }
}
