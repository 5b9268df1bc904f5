//! Schema registry: the two fixed target schemas and their per-kind
//! deduplication/compaction constants.
//!
//! Unlike the raw extracts, which arrive as loosely typed text columns in
//! whatever order the extractor produced, the registry pins down for each
//! record kind the canonical column order and each column's semantic type.
//! The registry is deliberately not user-configurable at runtime; consumers
//! that need the layout can print it with the `schema` subcommand.

use std::fmt;

use anyhow::{Result, ensure};

pub const DECIMAL_MAX_PRECISION: u32 = 28;

/// Total significant decimal digits and fractional digits for an
/// exact-decimal column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalSpec {
    pub precision: u32,
    pub scale: u32,
}

impl DecimalSpec {
    pub fn new(precision: u32, scale: u32) -> Result<Self> {
        let spec = Self { precision, scale };
        spec.ensure_valid()?;
        Ok(spec)
    }

    pub fn ensure_valid(&self) -> Result<()> {
        ensure!(self.precision > 0, "Decimal precision must be positive");
        ensure!(
            self.precision <= DECIMAL_MAX_PRECISION,
            "Decimal precision must be <= {}",
            DECIMAL_MAX_PRECISION
        );
        ensure!(
            self.scale <= self.precision,
            "Decimal scale ({}) cannot exceed precision ({})",
            self.scale,
            self.precision
        );
        Ok(())
    }

    pub fn describe(&self) -> String {
        format!("decimal(precision={},scale={})", self.precision, self.scale)
    }
}

/// How a date column is encoded in the raw extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEncoding {
    /// Strict 8-digit `YYYYMMDD` (the snapshot date); an invalid calendar
    /// date is a counted parse failure.
    CompactYmd,
    /// All-digit values are epoch milliseconds, anything else is tried as
    /// `YYYY-MM-DD`; unparsable values degrade to null (best effort).
    EpochMillisOrIso,
    /// Plain `YYYY-MM-DD`, best effort.
    Iso,
}

/// Closed set of semantic column types. Parsing dispatches on this once
/// per field at canonicalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Decimal(DecimalSpec),
    Date(DateEncoding),
    Boolean,
    Categorical,
    Text,
}

impl FieldType {
    pub fn describe(&self) -> String {
        match self {
            FieldType::Decimal(spec) => spec.describe(),
            FieldType::Date(DateEncoding::CompactYmd) => "date(yyyymmdd)".to_string(),
            FieldType::Date(DateEncoding::EpochMillisOrIso) => "date(epoch-ms|iso)".to_string(),
            FieldType::Date(DateEncoding::Iso) => "date(iso)".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Categorical => "categorical".to_string(),
            FieldType::Text => "text".to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub datatype: FieldType,
}

/// Ordered field list for one record kind; defines canonical column order.
#[derive(Debug, Clone)]
pub struct Schema {
    pub kind: RecordKind,
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Person,
    Asset,
}

const WORTH: FieldType = FieldType::Decimal(DecimalSpec {
    precision: 18,
    scale: 8,
});
const SHARES: FieldType = FieldType::Decimal(DecimalSpec {
    precision: 18,
    scale: 2,
});
const PRICE: FieldType = FieldType::Decimal(DecimalSpec {
    precision: 18,
    scale: 11,
});
const RATE: FieldType = FieldType::Decimal(DecimalSpec {
    precision: 18,
    scale: 8,
});

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Person => "person",
            RecordKind::Asset => "asset",
        }
    }

    /// The fixed target schema for this kind, in canonical column order.
    pub fn schema(self) -> Schema {
        let fields = match self {
            RecordKind::Person => vec![
                field("date", FieldType::Date(DateEncoding::CompactYmd)),
                field("personName", FieldType::Categorical),
                field("lastName", FieldType::Categorical),
                field("birthDate", FieldType::Date(DateEncoding::EpochMillisOrIso)),
                field("gender", FieldType::Categorical),
                field("countryOfCitizenship", FieldType::Categorical),
                field("city", FieldType::Categorical),
                field("state", FieldType::Categorical),
                field("source", FieldType::Categorical),
                field("industries", FieldType::Categorical),
                field("finalWorth", WORTH),
                field("estWorthPrev", WORTH),
                field("archivedWorth", WORTH),
                field("privateAssetsWorth", WORTH),
            ],
            RecordKind::Asset => vec![
                field("date", FieldType::Date(DateEncoding::CompactYmd)),
                field("personName", FieldType::Categorical),
                field("companyName", FieldType::Categorical),
                field("currencyCode", FieldType::Categorical),
                field("currentPrice", PRICE),
                field("exchange", FieldType::Categorical),
                field("exchangeRate", RATE),
                field("exerciseOptionPrice", PRICE),
                field("interactive", FieldType::Boolean),
                field("numberOfShares", SHARES),
                field("sharePrice", PRICE),
                field("ticker", FieldType::Categorical),
            ],
        };
        Schema { kind: self, fields }
    }

    /// Columns whose concatenation identifies one logical record.
    pub fn identity_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Person => &["date", "personName", "lastName"],
            RecordKind::Asset => &[
                "date",
                "personName",
                "ticker",
                "companyName",
                "currencyCode",
                "exchange",
                "interactive",
                "exchangeRate",
            ],
        }
    }

    /// Columns that must not all be empty for a record to be addressable;
    /// rows failing this are dropped before deduplication.
    pub fn name_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Person => &["personName", "lastName"],
            RecordKind::Asset => &["personName"],
        }
    }

    /// Column used to rank duplicate candidates (highest value wins).
    pub fn value_field(self) -> &'static str {
        match self {
            RecordKind::Person => "finalWorth",
            RecordKind::Asset => "numberOfShares",
        }
    }

    /// Default compaction sort keys for storage locality.
    pub fn default_sort_keys(self) -> &'static [&'static str] {
        match self {
            RecordKind::Person => &["personName", "date"],
            RecordKind::Asset => &["personName", "companyName", "interactive", "date"],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "person" | "billionaire" => Ok(RecordKind::Person),
            "asset" => Ok(RecordKind::Asset),
            other => Err(format!(
                "Unknown record kind '{other}'. Supported kinds: person, asset"
            )),
        }
    }
}

fn field(name: &'static str, datatype: FieldType) -> FieldSpec {
    FieldSpec { name, datatype }
}
