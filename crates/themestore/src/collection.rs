//! Ordered sequence of hydrated records.
//!
//! Order is whatever the datasource returned. Nothing here deduplicates or sorts
//! implicitly.

use crate::record::{Field, Record};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    /// Find a record by its exact file name.
    pub fn find(&self, file_name: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|record| record.file_name() == Some(file_name))
    }

    /// Collect one field from every record, `null` where it is unset.
    pub fn pluck(&self, field: Field) -> Vec<Value> {
        self.records
            .iter()
            .map(|record| record.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub fn filter<F>(&self, mut predicate: F) -> Collection
    where
        F: FnMut(&Record) -> bool,
    {
        self.records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    pub fn sort_by_file_name(mut self) -> Collection {
        self.records
            .sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        self
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl IntoIterator for Collection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<Record> for Collection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
