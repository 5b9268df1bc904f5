//! Category dictionaries: string ↔ small-integer interning for
//! low-cardinality text columns.
//!
//! One dictionary exists per categorical field and grows monotonically
//! during a canonicalization run: the same string always yields the same
//! code within a run, but codes are not stable across runs. Dictionaries
//! built in parallel partitions can be folded together with [`merge`],
//! which returns the code remap to apply to the absorbed partition's
//! records.
//!
//! [`merge`]: CategoryDictionary::merge

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDictionary {
    codes: HashMap<String, u32>,
    entries: Vec<String>,
}

impl CategoryDictionary {
    /// Returns the code for `value`, inserting it if unseen. Lookup is
    /// case-sensitive and exact.
    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(code) = self.codes.get(value) {
            return *code;
        }
        let code = self.entries.len() as u32;
        self.entries.push(value.to_string());
        self.codes.insert(value.to_string(), code);
        code
    }

    pub fn resolve(&self, code: u32) -> Option<&str> {
        self.entries.get(code as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Absorbs `other` into `self` by string identity. Returns a remap
    /// table indexed by `other`'s codes: `remap[old as usize]` is the code
    /// the same string carries in the merged dictionary.
    pub fn merge(&mut self, other: &CategoryDictionary) -> Vec<u32> {
        other
            .entries
            .iter()
            .map(|entry| self.intern(entry))
            .collect()
    }
}

/// The per-field dictionaries of one canonicalization run.
#[derive(Debug, Clone, Default)]
pub struct DictionarySet {
    by_field: HashMap<String, CategoryDictionary>,
}

impl DictionarySet {
    pub fn intern(&mut self, field: &str, value: &str) -> u32 {
        self.by_field.entry(field.to_string()).or_default().intern(value)
    }

    pub fn dictionary(&self, field: &str) -> Option<&CategoryDictionary> {
        self.by_field.get(field)
    }

    pub fn resolve(&self, field: &str, code: u32) -> Option<&str> {
        self.by_field.get(field).and_then(|dict| dict.resolve(code))
    }
}
