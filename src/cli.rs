use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::schema::RecordKind;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Canonicalize and deduplicate flattened person/asset financial extracts",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the pipeline: canonicalize, deduplicate, compact, write
    Process(ProcessArgs),
    /// Print the fixed target schema for a record kind
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input CSV file of raw rows ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Record kind of the input rows (person or asset)
    #[arg(short = 'k', long = "kind", value_parser = parse_record_kind)]
    pub kind: RecordKind,
    /// Abort on the first decimal overflow instead of skipping the row
    #[arg(long)]
    pub strict: bool,
    /// Keep duplicate identity keys instead of resolving them
    #[arg(long = "no-dedup")]
    pub no_dedup: bool,
    /// Skip the final storage-locality sort
    #[arg(long = "no-compact")]
    pub no_compact: bool,
    /// Override compaction sort keys, e.g. `personName,date`
    #[arg(long = "sort-by", action = clap::ArgAction::Append)]
    pub sort_by: Vec<String>,
    /// Limit number of input rows processed
    #[arg(long)]
    pub limit: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Also write the run summary as JSON to this path
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Record kind to describe (person or asset)
    #[arg(short = 'k', long = "kind", value_parser = parse_record_kind)]
    pub kind: RecordKind,
}

pub fn parse_record_kind(value: &str) -> Result<RecordKind, String> {
    value.parse()
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_tokens_parse() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("pipe").unwrap(), b'|');
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn record_kind_tokens_parse() {
        assert_eq!(parse_record_kind("person").unwrap(), RecordKind::Person);
        assert!(parse_record_kind("sharePrice").is_err());
    }
}
