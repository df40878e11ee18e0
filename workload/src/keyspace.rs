use std::{
    ops::RangeInclusive,
    sync::atomic::{AtomicU64, Ordering},
};

use database::Document;
use serde_json::Value;
use uuid::Uuid;

use crate::error::WorkloadError;

const KEY_SLICE_LEN: usize = 10;
const FILLER_SOURCE: &str = "x";

/// Hex digest of a record's sequence number. Sequence numbers start at 1.
pub fn hash_key(sequence: u64) -> String {
    Uuid::new_v3(&Uuid::NAMESPACE_OID, sequence.to_string().as_bytes())
        .simple()
        .to_string()
}

/// Tracks which sequence numbers are still alive. Records are removed oldest
/// first, so the live set is always the contiguous range `(deleted, records]`.
#[derive(Debug, Default)]
pub struct Keyspace {
    deleted: AtomicU64,
}

impl Keyspace {
    pub fn deleted(&self) -> u64 {
        self.deleted.load(Ordering::Acquire)
    }

    pub fn live(&self, record_count: u64) -> Result<RangeInclusive<u64>, WorkloadError> {
        let deleted = self.deleted();
        if record_count <= deleted {
            return Err(WorkloadError::EmptyKeyspace);
        }
        Ok(deleted + 1..=record_count)
    }

    /// Claims the oldest live sequence number, never one past `record_count`.
    pub fn remove_oldest(&self, record_count: u64) -> Result<u64, WorkloadError> {
        self.deleted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |deleted| {
                (deleted < record_count).then_some(deleted + 1)
            })
            .map(|previous| previous + 1)
            .map_err(|_| WorkloadError::EmptyKeyspace)
    }
}

fn field_name(index: usize) -> String {
    format!("field{index}")
}

// Ten characters of the key starting at `index`, wrapping around short keys.
fn field_value(index: usize, key: &str) -> String {
    let slice: String = key.chars().cycle().skip(index).take(KEY_SLICE_LEN).collect();
    format!("{}-{}", field_name(index), slice)
}

/// Builds a document with `indexable_fields` queryable fields plus one filler
/// field that pads the content to roughly `size` bytes.
pub fn build_value(key: &str, indexable_fields: usize, size: usize) -> Document {
    let mut value = Document::new();
    let mut used = 0;
    for index in 0..indexable_fields {
        let name = field_name(index);
        let content = field_value(index, key);
        used += name.len() + content.len();
        value.insert(name, Value::String(content));
    }

    let filler_name = field_name(indexable_fields);
    let filler_len = size.saturating_sub(used + filler_name.len());
    let source = if key.is_empty() { FILLER_SOURCE } else { key };
    let filler: String = source.chars().cycle().take(filler_len).collect();
    value.insert(filler_name, Value::String(filler));
    value
}

/// The predicate matching field `index` of the document stored under `key`.
pub fn query_predicate(index: usize, key: &str) -> (String, Value) {
    (field_name(index), Value::String(field_value(index, key)))
}
