//! Pipeline driver: raw rows in, canonical deduplicated dataset out.
//!
//! Canonicalization → deduplication → compaction is a pure batch
//! transform; all I/O lives at the edges of this module. Row-local
//! problems degrade to nulls, decimal overflow skips the row (or aborts
//! the run under `--strict`), and everything is tallied into a
//! [`RunSummary`] reported at the end.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::{
    canon::{CanonDiagnostics, Canonicalizer},
    cli::ProcessArgs,
    compact, dedup,
    dictionary::DictionarySet,
    error::{RowSkip, RunError},
    io_utils,
    value::render_cell,
};

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub kind: String,
    pub rows_read: usize,
    pub rows_canonicalized: usize,
    pub rows_skipped: Vec<SkippedRow>,
    pub date_parse_nulls: usize,
    pub dropped_unnamed: usize,
    pub dedup_before: usize,
    pub dedup_after: usize,
    pub rows_written: usize,
}

#[derive(Debug, Serialize)]
pub struct SkippedRow {
    pub line: usize,
    pub column: String,
    pub error: String,
}

impl From<&RowSkip> for SkippedRow {
    fn from(skip: &RowSkip) -> Self {
        Self {
            line: skip.line,
            column: skip.column.clone(),
            error: skip.error.to_string(),
        }
    }
}

impl RunSummary {
    fn log(&self) {
        info!(
            "Read {} {} row(s): {} canonicalized, {} skipped for decimal overflow, {} date value(s) nulled",
            self.rows_read,
            self.kind,
            self.rows_canonicalized,
            self.rows_skipped.len(),
            self.date_parse_nulls
        );
        for skipped in &self.rows_skipped {
            warn!(
                "Skipped line {}, column '{}': {}",
                skipped.line, skipped.column, skipped.error
            );
        }
        info!(
            "Deduplicated {} -> {} record(s) ({} unnamed row(s) dropped)",
            self.dedup_before, self.dedup_after, self.dropped_unnamed
        );
        info!("Wrote {} record(s)", self.rows_written);
    }
}

pub fn execute(args: &ProcessArgs) -> Result<()> {
    if !io_utils::is_dash(&args.input) && !args.input.exists() {
        return Err(RunError::MissingInputFile(args.input.clone()).into());
    }
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let input_encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let schema = args.kind.schema();
    info!(
        "Processing '{}' as {} records",
        args.input.display(),
        args.kind
    );

    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, input_encoding)?;
    let canonicalizer = Canonicalizer::new(&schema, &headers);
    let missing = canonicalizer.missing_columns();
    if !missing.is_empty() {
        info!(
            "Input lacks {} schema column(s) ({}); they will be null",
            missing.len(),
            missing.join(", ")
        );
    }

    let mut dicts = DictionarySet::default();
    let mut diagnostics = CanonDiagnostics::default();
    let mut skipped: Vec<RowSkip> = Vec::new();
    let mut records = Vec::new();
    let mut rows_read = 0;

    for (row_idx, byte_record) in reader.byte_records().enumerate() {
        if let Some(limit) = args.limit
            && row_idx >= limit
        {
            break;
        }
        let byte_record = byte_record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&byte_record, input_encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows_read += 1;
        match canonicalizer.canonicalize(&decoded, row_idx, &mut dicts, &mut diagnostics) {
            Ok(record) => records.push(record),
            Err(skip) => {
                if args.strict {
                    return Err(skip).context("Aborting on decimal overflow (--strict)");
                }
                skipped.push(skip);
            }
        }
    }

    let rows_canonicalized = records.len();
    let (records, dedup_before, dedup_after, dropped_unnamed) = if args.no_dedup {
        let count = records.len();
        (records, count, count, 0)
    } else {
        let outcome = dedup::deduplicate(records, &schema, &dicts);
        (
            outcome.records,
            outcome.before,
            outcome.after,
            outcome.dropped_unnamed,
        )
    };

    let mut records = records;
    if !args.no_compact {
        let sort_keys = resolve_sort_keys(args);
        compact::compact(&mut records, &schema, &dicts, &sort_keys)?;
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("-"));
    let output_delimiter = io_utils::resolve_input_delimiter(&output_path, args.delimiter);
    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), output_delimiter)?;
    let write_failure = |source: std::io::Error| RunError::OutputWrite {
        path: output_path.clone(),
        source,
    };
    writer
        .write_record(schema.headers())
        .map_err(|err| write_failure(std::io::Error::other(err)))?;
    for record in &records {
        let row: Vec<String> = schema
            .fields
            .iter()
            .zip(&record.values)
            .map(|(field, value)| render_cell(value, field.name, &dicts))
            .collect();
        writer
            .write_record(&row)
            .map_err(|err| write_failure(std::io::Error::other(err)))?;
    }
    writer.flush().map_err(write_failure)?;

    let summary = RunSummary {
        kind: args.kind.to_string(),
        rows_read,
        rows_canonicalized,
        rows_skipped: skipped.iter().map(SkippedRow::from).collect(),
        date_parse_nulls: diagnostics.date_parse_nulls,
        dropped_unnamed,
        dedup_before,
        dedup_after,
        rows_written: records.len(),
    };
    summary.log();

    if let Some(path) = &args.summary_json {
        let json = serde_json::to_string_pretty(&summary).context("Serializing run summary")?;
        fs::write(path, json).with_context(|| format!("Writing run summary to {path:?}"))?;
    }
    Ok(())
}

fn resolve_sort_keys(args: &ProcessArgs) -> Vec<String> {
    let requested: Vec<String> = args
        .sort_by
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    if requested.is_empty() {
        args.kind
            .default_sort_keys()
            .iter()
            .map(|key| key.to_string())
            .collect()
    } else {
        requested
    }
}
