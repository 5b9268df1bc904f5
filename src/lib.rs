pub mod canon;
pub mod cli;
pub mod compact;
pub mod dedup;
pub mod dictionary;
pub mod error;
pub mod io_utils;
pub mod process;
pub mod schema;
pub mod value;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("rowforge", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Process(args) => process::execute(&args),
        Commands::Schema(args) => handle_schema(&args),
    }
}

fn handle_schema(args: &cli::SchemaArgs) -> Result<()> {
    let schema = args.kind.schema();
    let width = schema
        .fields
        .iter()
        .map(|field| field.name.len())
        .max()
        .unwrap_or(0);
    println!("{} schema ({} columns):", args.kind, schema.fields.len());
    for field in &schema.fields {
        println!("  {:width$}  {}", field.name, field.datatype.describe());
    }
    println!();
    println!("identity: {}", args.kind.identity_fields().join(", "));
    println!("rank by:  {}", args.kind.value_field());
    println!("sort by:  {}", args.kind.default_sort_keys().join(", "));
    Ok(())
}
