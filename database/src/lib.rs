pub mod error;
pub mod memory;
pub mod null;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value;

use error::DatabaseError;
use memory::MemoryDatabase;
use null::NullDatabase;

/// A stored value: a flat JSON object whose fields may be queried.
pub type Document = serde_json::Map<String, Value>;

/// The capability every backend exposes to the load harness. Calls may be
/// slow or fail; the harness only times them and counts failures.
#[async_trait]
pub trait Database: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    async fn create(&self, key: &str, value: &Document) -> Result<(), DatabaseError>;
    async fn read(&self, key: &str) -> Result<Document, DatabaseError>;
    async fn update(&self, key: &str, value: &Document) -> Result<(), DatabaseError>;
    async fn delete(&self, key: &str) -> Result<(), DatabaseError>;
    async fn query(
        &self,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> Result<Vec<Document>, DatabaseError>;

    async fn shutdown(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Memory,
    Null,
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Memory => write!(f, "memory"),
            Driver::Null => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub driver: Driver,
}

/// Opens the backend named by `config`. Runs before any worker starts, so an
/// error here aborts the whole run.
pub async fn open(config: &DatabaseConfig) -> Result<Arc<dyn Database>, DatabaseError> {
    let database: Arc<dyn Database> = match config.driver {
        Driver::Memory => Arc::new(MemoryDatabase::new()),
        Driver::Null => Arc::new(NullDatabase),
    };
    tracing::info!("Opened {} database", database.name());
    Ok(database)
}
