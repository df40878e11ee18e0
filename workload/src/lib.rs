pub mod default;
pub mod error;
pub mod hotspot;
pub mod keyspace;

use std::{fmt, sync::Arc};

use clap::ValueEnum;
use database::Document;
use serde::Deserialize;
use serde_json::Value;

use default::DefaultWorkload;
use error::WorkloadError;
use hotspot::HotSpotWorkload;

/// Keys are 32 hex digits and every indexable field copies ten of them.
pub const MAX_INDEXABLE_FIELDS: usize = 20;
pub const QUERY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub field: String,
    pub value: Value,
    pub limit: usize,
}

/// Decides which keys, values and predicates the harness sends. Shared by
/// every worker, so implementations keep their state behind atomics.
pub trait Workload: Send + Sync + fmt::Debug {
    fn generate_new_key(&self, sequence: u64) -> String;

    fn generate_existing_key(&self, record_count: u64) -> Result<String, WorkloadError>;

    fn generate_key_for_removal(&self, record_count: u64) -> Result<String, WorkloadError>;

    fn generate_value(&self, key: &str, indexable_fields: usize, size: usize) -> Document;

    fn generate_query(
        &self,
        indexable_fields: usize,
        record_count: u64,
    ) -> Result<Query, WorkloadError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    #[default]
    Default,
    Hotspot,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadKind::Default => write!(f, "default"),
            WorkloadKind::Hotspot => write!(f, "hotspot"),
        }
    }
}

pub fn open(kind: WorkloadKind, hot_percentage: u32) -> Result<Arc<dyn Workload>, WorkloadError> {
    let workload: Arc<dyn Workload> = match kind {
        WorkloadKind::Default => Arc::new(DefaultWorkload::new()),
        WorkloadKind::Hotspot => Arc::new(HotSpotWorkload::new(hot_percentage)?),
    };
    Ok(workload)
}
