use async_trait::async_trait;
use serde_json::Value;

use crate::{Database, Document, error::DatabaseError};

/// Accepts every call and stores nothing. Running against it measures the
/// harness overhead alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDatabase;

#[async_trait]
impl Database for NullDatabase {
    fn name(&self) -> &str {
        "null"
    }

    async fn create(&self, _key: &str, _value: &Document) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn read(&self, _key: &str) -> Result<Document, DatabaseError> {
        Ok(Document::new())
    }

    async fn update(&self, _key: &str, _value: &Document) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn query(
        &self,
        _field: &str,
        _value: &Value,
        _limit: usize,
    ) -> Result<Vec<Document>, DatabaseError> {
        Ok(Vec::new())
    }
}
