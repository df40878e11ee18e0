use database::Document;
use rand::Rng;

use crate::{
    MAX_INDEXABLE_FIELDS, QUERY_LIMIT, Query, Workload,
    error::WorkloadError,
    keyspace::{Keyspace, build_value, hash_key, query_predicate},
};

/// Uniform reads over the live records, oldest-first removal.
#[derive(Debug, Default)]
pub struct DefaultWorkload {
    keyspace: Keyspace,
}

impl DefaultWorkload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deleted(&self) -> u64 {
        self.keyspace.deleted()
    }
}

/// Shared by every workload: checks the field count, then builds the predicate
/// for a key the caller already picked.
pub(crate) fn query_for_key(
    keyspace: &Keyspace,
    indexable_fields: usize,
    record_count: u64,
    key: &str,
) -> Result<Query, WorkloadError> {
    check_fields(indexable_fields)?;
    let live = keyspace.live(record_count)?;
    let live_records = usize::try_from(live.end() - live.start() + 1).unwrap_or(usize::MAX);
    let index = rand::rng().random_range(0..indexable_fields);
    let (field, value) = query_predicate(index, key);
    Ok(Query {
        field,
        value,
        limit: QUERY_LIMIT.min(live_records),
    })
}

fn check_fields(indexable_fields: usize) -> Result<(), WorkloadError> {
    if indexable_fields == 0 {
        return Err(WorkloadError::NoIndexableFields);
    }
    if indexable_fields > MAX_INDEXABLE_FIELDS {
        return Err(WorkloadError::TooManyFields(indexable_fields));
    }
    Ok(())
}

impl Workload for DefaultWorkload {
    fn generate_new_key(&self, sequence: u64) -> String {
        hash_key(sequence)
    }

    fn generate_existing_key(&self, record_count: u64) -> Result<String, WorkloadError> {
        let live = self.keyspace.live(record_count)?;
        Ok(hash_key(rand::rng().random_range(live)))
    }

    fn generate_key_for_removal(&self, record_count: u64) -> Result<String, WorkloadError> {
        self.keyspace.remove_oldest(record_count).map(hash_key)
    }

    fn generate_value(&self, key: &str, indexable_fields: usize, size: usize) -> Document {
        build_value(key, indexable_fields, size)
    }

    fn generate_query(
        &self,
        indexable_fields: usize,
        record_count: u64,
    ) -> Result<Query, WorkloadError> {
        let key = self.generate_existing_key(record_count)?;
        query_for_key(&self.keyspace, indexable_fields, record_count, &key)
    }
}
