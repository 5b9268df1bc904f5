//! Deduplication engine: collapse records sharing an identity key into a
//! single authoritative record.
//!
//! Records first pass a garbage filter (no addressable name means no
//! identity), then group by a delimiter-joined key over the kind's
//! identity fields. Within a group the candidate with the highest value
//! field wins; nulls rank lowest, and exact ties fall back to the record
//! seen earliest in the input. Grouping is a by-key reduction over a hash
//! partition, so nothing depends on input order except that explicit
//! tie-break.

use std::cmp::Ordering;
use std::collections::HashMap;

use itertools::Itertools;

use crate::canon::CanonicalRecord;
use crate::dictionary::DictionarySet;
use crate::schema::Schema;
use crate::value::{TypedValue, render_cell};

/// Joins identity fields into the grouping key. The raw extracts never
/// contain this character inside a field value.
pub const KEY_DELIMITER: &str = "|";

#[derive(Debug)]
pub struct DedupOutcome {
    pub records: Vec<CanonicalRecord>,
    /// Records entering the engine, before the garbage filter.
    pub before: usize,
    pub after: usize,
    /// Records dropped because every name field was null or empty.
    pub dropped_unnamed: usize,
}

pub fn deduplicate(
    records: Vec<CanonicalRecord>,
    schema: &Schema,
    dicts: &DictionarySet,
) -> DedupOutcome {
    let kind = schema.kind;
    let identity_indices = field_indices(schema, kind.identity_fields());
    let name_indices = field_indices(schema, kind.name_fields());
    let value_index = schema
        .field_index(kind.value_field())
        .expect("registry value field exists in its schema");

    let before = records.len();
    let mut dropped_unnamed = 0;
    let mut keyed = Vec::with_capacity(records.len());
    for record in records {
        if !has_identity(&record, &name_indices, schema, dicts) {
            dropped_unnamed += 1;
            continue;
        }
        let key = dedup_key(&record, &identity_indices, schema, dicts);
        keyed.push((key, record));
    }

    let groups: HashMap<String, Vec<CanonicalRecord>> = keyed.into_iter().into_group_map();
    let mut winners: Vec<CanonicalRecord> = groups
        .into_values()
        .map(|group| resolve_group(group, value_index))
        .collect();
    // Inter-group order carries no meaning, but pinning it to input order
    // keeps runs reproducible and makes deduplication idempotent.
    winners.sort_by_key(|record| record.input_index);

    let after = winners.len();
    DedupOutcome {
        records: winners,
        before,
        after,
        dropped_unnamed,
    }
}

/// Builds the opaque grouping key for one record. Nulls contribute empty
/// segments so records missing an identity field still group together.
pub fn dedup_key(
    record: &CanonicalRecord,
    identity_indices: &[usize],
    schema: &Schema,
    dicts: &DictionarySet,
) -> String {
    identity_indices
        .iter()
        .map(|&idx| render_cell(&record.values[idx], schema.fields[idx].name, dicts))
        .join(KEY_DELIMITER)
}

pub fn field_indices(schema: &Schema, names: &[&str]) -> Vec<usize> {
    names
        .iter()
        .map(|name| {
            schema
                .field_index(name)
                .expect("registry field lists reference schema columns")
        })
        .collect()
}

fn has_identity(
    record: &CanonicalRecord,
    name_indices: &[usize],
    schema: &Schema,
    dicts: &DictionarySet,
) -> bool {
    name_indices.iter().any(|&idx| {
        !render_cell(&record.values[idx], schema.fields[idx].name, dicts).is_empty()
    })
}

fn resolve_group(group: Vec<CanonicalRecord>, value_index: usize) -> CanonicalRecord {
    let mut candidates = group.into_iter();
    let mut best = candidates.next().expect("groups are never empty");
    for candidate in candidates {
        match rank(&candidate.values[value_index], &best.values[value_index]) {
            Ordering::Greater => best = candidate,
            Ordering::Equal if candidate.input_index < best.input_index => best = candidate,
            _ => {}
        }
    }
    best
}

/// Ranks duplicate candidates by their value field; null is the weakest
/// candidate.
fn rank(a: &TypedValue, b: &TypedValue) -> Ordering {
    match (a, b) {
        (TypedValue::Null, TypedValue::Null) => Ordering::Equal,
        (TypedValue::Null, _) => Ordering::Less,
        (_, TypedValue::Null) => Ordering::Greater,
        (TypedValue::Decimal(x), TypedValue::Decimal(y)) => x.cmp(y),
        _ => unreachable!("value fields are always decimal columns"),
    }
}
