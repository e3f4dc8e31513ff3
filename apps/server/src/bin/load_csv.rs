//! CLI tool to load CSV files from disk into the warehouse.
//!
//! Usage:
//!   cargo run --bin load-csv -- departments.csv jobs.csv hired_employees.csv
//!   cargo run --bin load-csv -- --dry-run hired_employees.csv

use std::env;
use std::path::PathBuf;

use hiring_warehouse_lib::config::Config;
use hiring_warehouse_lib::db::Warehouse;
use hiring_warehouse_lib::models::SchemaRegistry;
use hiring_warehouse_lib::services;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    let mut dry_run = false;
    let mut paths: Vec<PathBuf> = Vec::new();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--dry-run" | "-n" => dry_run = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                std::process::exit(1);
            }
            other => paths.push(PathBuf::from(other)),
        }
    }

    if paths.is_empty() {
        eprintln!("Error: at least one CSV file is required");
        print_usage();
        std::process::exit(1);
    }

    let registry = SchemaRegistry::standard();

    let warehouse = if dry_run {
        None
    } else {
        let config = match Config::from_env() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        };
        Some(Warehouse::new(&config.warehouse))
    };

    for path in &paths {
        let (file_name, content) = match services::read_upload_file(&registry, path).await {
            Ok(read) => read,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                std::process::exit(1);
            }
        };

        let (schema, dataset) = match services::prepare_upload(&registry, &file_name, &content) {
            Ok(prepared) => prepared,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                std::process::exit(1);
            }
        };

        let Some(warehouse) = warehouse.as_ref() else {
            println!(
                "  {:<24} -> {:<16} {} rows (dry run)",
                file_name,
                schema.table,
                dataset.len()
            );
            continue;
        };

        match warehouse.bulk_insert(schema, &dataset).await {
            Ok(summary) => println!(
                "  {:<24} -> {:<16} {} rows inserted ({} statements)",
                file_name, summary.table, summary.rows_inserted, summary.statements
            ),
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: load-csv [--dry-run] <file.csv> [<file.csv> ...]");
    eprintln!();
    eprintln!("Accepted files: departments.csv, jobs.csv, hired_employees.csv");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --dry-run, -n  Parse and normalize only; do not connect to the warehouse");
    eprintln!("  --help, -h     Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_ENV, DATABASE_URL, HW_MAX_ROWS_PER_INSERT (see server configuration)");
    eprintln!();
}
