//! Record canonicalizer: one raw text row in, one schema-aligned typed
//! record out.
//!
//! The canonicalizer walks the target schema in declared order, locating
//! each field in the input header by name. Input columns the schema does
//! not know are silently ignored; schema columns the input lacks produce
//! typed nulls. Output column order therefore always matches the schema,
//! independent of input column order.

use crate::dictionary::DictionarySet;
use crate::error::{DecimalError, RowSkip};
use crate::schema::{DateEncoding, FieldType, Schema};
use crate::value::{
    TypedValue, FixedDecimal, parse_boolean, parse_compact_date, parse_epoch_or_iso_date,
    parse_iso_date,
};

/// A typed row aligned to its schema, tagged with the 0-based input row
/// index it came from. The index is what makes duplicate resolution's
/// first-seen tie-break deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub values: Vec<TypedValue>,
    pub input_index: usize,
}

/// Per-run canonicalization counters for the end-of-run report.
#[derive(Debug, Clone, Default)]
pub struct CanonDiagnostics {
    /// Non-empty date fields that failed to parse and became null.
    pub date_parse_nulls: usize,
}

pub struct Canonicalizer<'a> {
    schema: &'a Schema,
    /// For each schema field, the input column position it reads from.
    lookup: Vec<Option<usize>>,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(schema: &'a Schema, headers: &[String]) -> Self {
        let lookup = schema
            .fields
            .iter()
            .map(|field| headers.iter().position(|h| h == field.name))
            .collect();
        Self { schema, lookup }
    }

    /// Schema fields absent from the input header; these columns will be
    /// all-null in the output.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        self.schema
            .fields
            .iter()
            .zip(&self.lookup)
            .filter(|(_, position)| position.is_none())
            .map(|(field, _)| field.name)
            .collect()
    }

    /// Converts one raw row. Decimal overflow fails the whole row; every
    /// other per-field problem degrades to a null (dates counted in
    /// `diagnostics`).
    pub fn canonicalize(
        &self,
        row: &[String],
        input_index: usize,
        dicts: &mut DictionarySet,
        diagnostics: &mut CanonDiagnostics,
    ) -> Result<CanonicalRecord, RowSkip> {
        let mut values = Vec::with_capacity(self.schema.fields.len());
        for (field, position) in self.schema.fields.iter().zip(&self.lookup) {
            let raw = position.and_then(|idx| row.get(idx)).map(String::as_str);
            let value = match field.datatype {
                FieldType::Decimal(spec) => match raw.unwrap_or("") {
                    "" => TypedValue::Null,
                    literal => FixedDecimal::from_literal(literal, &spec)
                        .map(TypedValue::Decimal)
                        .map_err(|error| self.skip(input_index, field.name, error))?,
                },
                FieldType::Date(encoding) => {
                    let raw = raw.unwrap_or("");
                    if raw.is_empty() {
                        TypedValue::Null
                    } else {
                        let parsed = match encoding {
                            DateEncoding::CompactYmd => parse_compact_date(raw),
                            DateEncoding::EpochMillisOrIso => parse_epoch_or_iso_date(raw),
                            DateEncoding::Iso => parse_iso_date(raw),
                        };
                        match parsed {
                            Some(date) => TypedValue::Date(date),
                            None => {
                                diagnostics.date_parse_nulls += 1;
                                TypedValue::Null
                            }
                        }
                    }
                }
                FieldType::Boolean => parse_boolean(raw.unwrap_or(""))
                    .map(TypedValue::Boolean)
                    .unwrap_or(TypedValue::Null),
                FieldType::Categorical => match raw.unwrap_or("") {
                    "" => TypedValue::Null,
                    value => TypedValue::Category(dicts.intern(field.name, value)),
                },
                // An absent text column is null, but a present empty string
                // is a valid empty text.
                FieldType::Text => match raw {
                    Some(text) => TypedValue::Text(text.to_string()),
                    None => TypedValue::Null,
                },
            };
            values.push(value);
        }
        Ok(CanonicalRecord {
            values,
            input_index,
        })
    }

    fn skip(&self, input_index: usize, column: &str, error: DecimalError) -> RowSkip {
        RowSkip {
            // 1-based file line, counting the header line.
            line: input_index + 2,
            column: column.to_string(),
            error,
        }
    }
}
