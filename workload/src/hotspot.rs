use database::Document;
use rand::Rng;

use crate::{
    Query, Workload,
    default::query_for_key,
    error::WorkloadError,
    keyspace::{Keyspace, build_value, hash_key},
};

/// Share of existing-key draws that land in the hot set.
pub const HOT_ACCESS_RATIO: f64 = 0.8;

/// Skews reads, updates and queries toward the newest records: the newest
/// `hot_percentage`% of live records take `HOT_ACCESS_RATIO` of the draws.
#[derive(Debug)]
pub struct HotSpotWorkload {
    keyspace: Keyspace,
    hot_percentage: u32,
}

impl HotSpotWorkload {
    pub fn new(hot_percentage: u32) -> Result<Self, WorkloadError> {
        if !(1..=100).contains(&hot_percentage) {
            return Err(WorkloadError::InvalidHotPercentage(hot_percentage));
        }
        Ok(Self {
            keyspace: Keyspace::default(),
            hot_percentage,
        })
    }

    fn hot_len(&self, live_records: u64) -> u64 {
        (live_records * u64::from(self.hot_percentage) / 100).max(1)
    }
}

impl Workload for HotSpotWorkload {
    fn generate_new_key(&self, sequence: u64) -> String {
        hash_key(sequence)
    }

    fn generate_existing_key(&self, record_count: u64) -> Result<String, WorkloadError> {
        let live = self.keyspace.live(record_count)?;
        let mut rng = rand::rng();
        let sequence = if rng.random_bool(HOT_ACCESS_RATIO) {
            let live_records = live.end() - live.start() + 1;
            let hot_start = live.end() + 1 - self.hot_len(live_records);
            rng.random_range(hot_start..=*live.end())
        } else {
            rng.random_range(live)
        };
        Ok(hash_key(sequence))
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
