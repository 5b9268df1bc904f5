//! Typed cell values and the per-type parsing functions.
//!
//! Every raw field is read as text before any typed interpretation, and
//! decimal parsing never passes through a binary float: literals go
//! straight from digit strings into [`rust_decimal::Decimal`] significands
//! validated against the column's [`DecimalSpec`].

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::dictionary::DictionarySet;
use crate::error::DecimalError;
use crate::schema::DecimalSpec;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// An exact decimal pinned to a column's precision/scale. The stored
/// value always carries exactly `scale` fractional digits, so formatting
/// round-trips the canonical zero-padded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDecimal {
    value: Decimal,
    precision: u32,
    scale: u32,
}

impl FixedDecimal {
    /// Parses a plain decimal literal (sign, integer digits, optional
    /// fractional digits; no exponent form) against `spec`.
    ///
    /// Trailing fractional zeros are trimmed before the scale check, so
    /// `1.2300000000` fits scale 8 while `1.123456789` does not. Leading
    /// integer zeros never count toward precision.
    pub fn from_literal(raw: &str, spec: &DecimalSpec) -> Result<Self, DecimalError> {
        let malformed = || DecimalError::Malformed {
            literal: raw.to_string(),
        };
        let negative = raw.starts_with('-');
        let unsigned = raw.strip_prefix(['-', '+']).unwrap_or(raw);
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }

        let significant_frac = frac_part.trim_end_matches('0');
        if significant_frac.len() > spec.scale as usize {
            return Err(DecimalError::PrecisionOverflow {
                literal: raw.to_string(),
                fraction_digits: significant_frac.len(),
                scale: spec.scale,
            });
        }
        let int_trimmed = int_part.trim_start_matches('0');
        let digits = int_trimmed.len() + spec.scale as usize;
        if digits > spec.precision as usize {
            return Err(DecimalError::RangeOverflow {
                literal: raw.to_string(),
                digits,
                precision: spec.precision,
            });
        }

        let mut normalized = String::with_capacity(unsigned.len() + 2);
        if negative {
            normalized.push('-');
        }
        normalized.push_str(if int_trimmed.is_empty() { "0" } else { int_trimmed });
        if !significant_frac.is_empty() {
            normalized.push('.');
            normalized.push_str(significant_frac);
        }
        let mut value = Decimal::from_str(&normalized).map_err(|_| malformed())?;
        // Only pads fractional zeros: the scale check above guarantees no
        // rounding can occur here.
        value.rescale(spec.scale);
        Ok(Self {
            value,
            precision: spec.precision,
            scale: spec.scale,
        })
    }

    /// Renders the value with exactly `scale` fractional digits.
    pub fn to_string_fixed(&self) -> String {
        self.value.to_string()
    }

    pub fn amount(&self) -> &Decimal {
        &self.value
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl Ord for FixedDecimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl PartialOrd for FixedDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One canonical cell. `Null` is a first-class value: a missing source
/// column or an unparsable best-effort field lands here instead of
/// failing the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Decimal(FixedDecimal),
    Date(NaiveDate),
    Boolean(bool),
    Category(u32),
    Text(String),
    Null,
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }
}

/// Strict 8-digit `YYYYMMDD` snapshot date.
pub fn parse_compact_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = raw[..4].parse().ok()?;
    let month = raw[4..6].parse().ok()?;
    let day = raw[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Strict `YYYY-MM-DD`.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Dual-encoded birth date: an all-digit value is an epoch-millisecond
/// timestamp (floor-divided to a UTC calendar day, no timezone
/// adjustment), anything else is tried as `YYYY-MM-DD`.
pub fn parse_epoch_or_iso_date(raw: &str) -> Option<NaiveDate> {
    if raw.bytes().all(|b| b.is_ascii_digit()) && !raw.is_empty() {
        let millis: i64 = raw.parse().ok()?;
        let days = millis.div_euclid(MILLIS_PER_DAY);
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
        return epoch.checked_add_signed(Duration::try_days(days)?);
    }
    parse_iso_date(raw)
}

/// Case-sensitive boolean literal sets; anything else is null.
pub fn parse_boolean(raw: &str) -> Option<bool> {
    match raw {
        "True" | "true" | "1" | "TRUE" => Some(true),
        "False" | "false" | "0" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Serializes one cell for output or dedup-key construction. Categorical
/// codes resolve back to their dictionary string; nulls render empty.
pub fn render_cell(value: &TypedValue, field_name: &str, dicts: &DictionarySet) -> String {
    match value {
        TypedValue::Decimal(decimal) => decimal.to_string_fixed(),
        TypedValue::Date(date) => date.format("%Y-%m-%d").to_string(),
        TypedValue::Boolean(flag) => flag.to_string(),
        TypedValue::Category(code) => dicts
            .resolve(field_name, *code)
            .unwrap_or_default()
            .to_string(),
        TypedValue::Text(text) => text.clone(),
        TypedValue::Null => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(precision: u32, scale: u32) -> DecimalSpec {
        DecimalSpec { precision, scale }
    }

    #[test]
    fn decimal_round_trips_with_zero_padding() {
        let parsed = FixedDecimal::from_literal("5000000000.00000000", &spec(18, 8))
            .expect("in-spec literal");
        assert_eq!(parsed.to_string_fixed(), "5000000000.00000000");

        let padded = FixedDecimal::from_literal("0.5", &spec(18, 8)).expect("short literal");
        assert_eq!(padded.to_string_fixed(), "0.50000000");

        let trimmed =
            FixedDecimal::from_literal("1.2300000000", &spec(18, 8)).expect("over-long zeros");
        assert_eq!(trimmed.to_string_fixed(), "1.23000000");
    }

    #[test]
    fn decimal_detects_range_overflow() {
        let err = FixedDecimal::from_literal("123456789012345678.9", &spec(18, 8)).unwrap_err();
        assert!(matches!(err, DecimalError::RangeOverflow { .. }));
    }

    #[test]
    fn decimal_detects_precision_overflow() {
        let err = FixedDecimal::from_literal("1.123456789", &spec(18, 8)).unwrap_err();
        assert!(matches!(
            err,
            DecimalError::PrecisionOverflow {
                fraction_digits: 9,
                scale: 8,
                ..
            }
        ));
    }

    #[test]
    fn decimal_rejects_exponents_and_garbage() {
        for bad in ["1e5", "12a.3", "1.2.3", "", ".", "+-3", "1_000"] {
            assert!(
                matches!(
                    FixedDecimal::from_literal(bad, &spec(18, 8)),
                    Err(DecimalError::Malformed { .. })
                ),
                "expected malformed: {bad:?}"
            );
        }
    }

    #[test]
    fn decimal_accepts_signs_and_bare_fractions() {
        let negative =
            FixedDecimal::from_literal("-0.00000001", &spec(18, 8)).expect("tiny negative");
        assert_eq!(negative.to_string_fixed(), "-0.00000001");

        let positive = FixedDecimal::from_literal("+7.25", &spec(18, 2)).expect("plus sign");
        assert_eq!(positive.to_string_fixed(), "7.25");

        let bare = FixedDecimal::from_literal(".5", &spec(18, 2)).expect("bare fraction");
        assert_eq!(bare.to_string_fixed(), "0.50");
    }

    #[test]
    fn decimal_leading_zeros_do_not_count_toward_precision() {
        let parsed = FixedDecimal::from_literal("0000000000000000000001.25", &spec(18, 2))
            .expect("leading zeros");
        assert_eq!(parsed.to_string_fixed(), "1.25");
    }

    #[test]
    fn fixed_decimal_orders_numerically() {
        let five = FixedDecimal::from_literal("5000000000.00000000", &spec(18, 8)).unwrap();
        let three = FixedDecimal::from_literal("3000000000.00000000", &spec(18, 8)).unwrap();
        assert!(five > three);
    }

    #[test]
    fn compact_date_requires_valid_calendar() {
        assert_eq!(
            parse_compact_date("20240506"),
            NaiveDate::from_ymd_opt(2024, 5, 6)
        );
        assert_eq!(parse_compact_date("20240230"), None);
        assert_eq!(parse_compact_date("2024-05"), None);
        assert_eq!(parse_compact_date("202405067"), None);
    }

    #[test]
    fn birth_date_disambiguates_epoch_and_iso() {
        assert_eq!(
            parse_epoch_or_iso_date("946684800000"),
            NaiveDate::from_ymd_opt(2000, 1, 1)
        );
        assert_eq!(
            parse_epoch_or_iso_date("1975-06-12"),
            NaiveDate::from_ymd_opt(1975, 6, 12)
        );
        assert_eq!(parse_epoch_or_iso_date("not-a-date"), None);
        // Mid-day timestamps floor to the same UTC day.
        assert_eq!(
            parse_epoch_or_iso_date("946728000000"),
            NaiveDate::from_ymd_opt(2000, 1, 1)
        );
    }

    #[test]
    fn boolean_literals_are_case_sensitive() {
        assert_eq!(parse_boolean("True"), Some(true));
        assert_eq!(parse_boolean("TRUE"), Some(true));
        assert_eq!(parse_boolean("1"), Some(true));
        assert_eq!(parse_boolean("false"), Some(false));
        assert_eq!(parse_boolean("0"), Some(false));
        assert_eq!(parse_boolean("tRue"), None);
        assert_eq!(parse_boolean("yes"), None);
        assert_eq!(parse_boolean(""), None);
    }

    #[test]
    fn render_cell_serializes_each_variant() {
        let mut dicts = DictionarySet::default();
        let code = dicts.intern("ticker", "AAPL");
        let decimal = FixedDecimal::from_literal("42.5", &spec(18, 2)).unwrap();

        assert_eq!(
            render_cell(&TypedValue::Decimal(decimal), "sharePrice", &dicts),
            "42.50"
        );
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(
            render_cell(&TypedValue::Date(date), "date", &dicts),
            "2024-05-06"
        );
        assert_eq!(
            render_cell(&TypedValue::Boolean(true), "interactive", &dicts),
            "true"
        );
        assert_eq!(
            render_cell(&TypedValue::Category(code), "ticker", &dicts),
            "AAPL"
        );
        assert_eq!(
            render_cell(&TypedValue::Text(String::new()), "note", &dicts),
            ""
        );
        assert_eq!(render_cell(&TypedValue::Null, "state", &dicts), "");
    }
}
