//! Compactor: stable multi-key sort of the deduplicated dataset for
//! storage locality.
//!
//! Sorting never changes dataset content, only row order: ascending by
//! the configured key columns, nulls last. The sort is stable so rows
//! with equal keys keep their deduplication output order, which keeps
//! repeated runs byte-identical.

use std::cmp::Ordering;

use anyhow::{Result, bail};

use crate::canon::CanonicalRecord;
use crate::dictionary::DictionarySet;
use crate::schema::{FieldSpec, Schema};
use crate::value::TypedValue;

pub fn compact(
    records: &mut [CanonicalRecord],
    schema: &Schema,
    dicts: &DictionarySet,
    sort_keys: &[String],
) -> Result<()> {
    let mut key_indices = Vec::with_capacity(sort_keys.len());
    for name in sort_keys {
        match schema.field_index(name) {
            Some(idx) => key_indices.push(idx),
            None => bail!(
                "Unknown sort column '{name}' for {} records",
                schema.kind
            ),
        }
    }

    records.sort_by(|a, b| {
        key_indices
            .iter()
            .map(|&idx| {
                compare_cells(
                    &a.values[idx],
                    &b.values[idx],
                    &schema.fields[idx],
                    dicts,
                )
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    Ok(())
}

/// Ascending cell comparison with nulls ordered after every value.
/// Categorical codes compare by their resolved text, not their
/// run-dependent dictionary ids.
fn compare_cells(
    a: &TypedValue,
    b: &TypedValue,
    field: &FieldSpec,
    dicts: &DictionarySet,
) -> Ordering {
    match (a, b) {
        (TypedValue::Null, TypedValue::Null) => Ordering::Equal,
        (TypedValue::Null, _) => Ordering::Greater,
        (_, TypedValue::Null) => Ordering::Less,
        (TypedValue::Decimal(x), TypedValue::Decimal(y)) => x.cmp(y),
        (TypedValue::Date(x), TypedValue::Date(y)) => x.cmp(y),
        (TypedValue::Boolean(x), TypedValue::Boolean(y)) => x.cmp(y),
        (TypedValue::Text(x), TypedValue::Text(y)) => x.cmp(y),
        (TypedValue::Category(x), TypedValue::Category(y)) => {
            let left = dicts.resolve(field.name, *x).unwrap_or_default();
            let right = dicts.resolve(field.name, *y).unwrap_or_default();
            left.cmp(right)
        }
        _ => panic!("mismatched cell types in column '{}'", field.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::{CanonDiagnostics, Canonicalizer};
    use crate::schema::RecordKind;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn person_records(rows: &[&[&str]]) -> (Schema, DictionarySet, Vec<CanonicalRecord>) {
        let schema = RecordKind::Person.schema();
        let headers: Vec<String> = ["date", "personName", "lastName", "finalWorth"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let canonicalizer = Canonicalizer::new(&schema, &headers);
        let mut dicts = DictionarySet::default();
        let mut diags = CanonDiagnostics::default();
        let records = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let row: Vec<String> = row.iter().map(|s| s.to_string()).collect();
                canonicalizer
                    .canonicalize(&row, idx, &mut dicts, &mut diags)
                    .expect("fixture rows canonicalize")
            })
            .collect();
        (schema, dicts, records)
    }

    #[test]
    fn sorts_ascending_by_resolved_category_then_date() {
        let (schema, dicts, mut records) = person_records(&[
            &["20240507", "Bob Flint", "Flint", "1.00000000"],
            &["20240506", "Alice Quartz", "Quartz", "2.00000000"],
            &["20240505", "Bob Flint", "Flint", "3.00000000"],
        ]);
        compact(&mut records, &schema, &dicts, &keys(&["personName", "date"])).unwrap();
        let order: Vec<usize> = records.iter().map(|r| r.input_index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn nulls_sort_last() {
        let (schema, dicts, mut records) = person_records(&[
            &["", "Alice Quartz", "Quartz", "1.00000000"],
            &["20240506", "Bob Flint", "Flint", "2.00000000"],
        ]);
        compact(&mut records, &schema, &dicts, &keys(&["date"])).unwrap();
        let order: Vec<usize> = records.iter().map(|r| r.input_index).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn repeated_compaction_is_byte_stable() {
        let (schema, dicts, mut records) = person_records(&[
            &["20240506", "Alice Quartz", "Quartz", "1.00000000"],
            &["20240506", "Alice Quartz", "Quartz", "2.00000000"],
            &["20240505", "Bob Flint", "Flint", "3.00000000"],
        ]);
        compact(&mut records, &schema, &dicts, &keys(&["personName", "date"])).unwrap();
        let first: Vec<usize> = records.iter().map(|r| r.input_index).collect();
        compact(&mut records, &schema, &dicts, &keys(&["personName", "date"])).unwrap();
        let second: Vec<usize> = records.iter().map(|r| r.input_index).collect();
        assert_eq!(first, second);
        // Equal keys keep their incoming relative order (stable sort).
        assert_eq!(first, vec![2, 0, 1]);
    }

    #[test]
    fn unknown_sort_column_is_an_error() {
        let (schema, dicts, mut records) =
            person_records(&[&["20240506", "Alice Quartz", "Quartz", "1.00000000"]]);
        let err = compact(&mut records, &schema, &dicts, &keys(&["netWorth"])).unwrap_err();
        assert!(err.to_string().contains("netWorth"));
    }
}
