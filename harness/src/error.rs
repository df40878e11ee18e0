use thiserror::Error;

use crate::operation::OperationKind;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Database error: {0}")]
    Database(#[from] database::error::DatabaseError),

    #[error("Workload error: {0}")]
    Workload(#[from] workload::error::WorkloadError),

    #[error("Sketch error: {0}")]
    Sketch(#[from] sketch::error::SketchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("{0} attempted against an empty keyspace")]
    EmptyKeyspace(OperationKind),

    #[error("Preload failed at record {sequence}: {source}")]
    Preload {
        sequence: u64,
        source: database::error::DatabaseError,
    },

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
