//! Error kinds for the canonicalization pipeline.
//!
//! Decimal overflow is never silently truncated: a literal that does not fit
//! the target precision/scale fails its row, either aborting the run
//! (`--strict`) or landing in the end-of-run skip report. Date parse
//! failures, by contrast, resolve to a typed null and are only counted.

use std::path::PathBuf;

use thiserror::Error;

/// Rejection reasons for a decimal literal checked against a
/// [`DecimalSpec`](crate::schema::DecimalSpec).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    /// More significant fractional digits than the column's scale allows.
    #[error("'{literal}' carries {fraction_digits} fractional digit(s) but scale is {scale}")]
    PrecisionOverflow {
        literal: String,
        fraction_digits: usize,
        scale: u32,
    },
    /// The value needs more total digits than the column's precision allows.
    #[error("'{literal}' requires {digits} digit(s) at scale but precision is {precision}")]
    RangeOverflow {
        literal: String,
        digits: usize,
        precision: u32,
    },
    /// Not a plain sign/digits/point/digits literal (exponent forms,
    /// grouping separators, and stray characters are all rejected).
    #[error("'{literal}' is not a plain decimal literal")]
    Malformed { literal: String },
}

/// A row rejected during canonicalization. Only decimal overflow fails a
/// row; every other per-field problem degrades to a null.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column '{column}': {error}")]
pub struct RowSkip {
    /// 1-based line number in the input file, counting the header line.
    pub line: usize,
    pub column: String,
    pub error: DecimalError,
}

/// Fatal run-level failures.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("input file {0:?} does not exist")]
    MissingInputFile(PathBuf),
    #[error("failed to write output {path:?}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
