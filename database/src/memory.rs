use async_trait::async_trait;
use crossbeam_skiplist::SkipMap;
use serde_json::Value;

use crate::{Database, Document, error::DatabaseError};

/// In-process backend on a lock-free ordered map. Workers never wait on each
/// other, which keeps the harness itself out of the latency numbers.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    inner: SkipMap<String, Document>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        MemoryDatabase {
            inner: SkipMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, key: &str, value: &Document) -> Result<(), DatabaseError> {
        let mut inserted = false;
        self.inner.get_or_insert_with(key.to_string(), || {
            inserted = true;
            value.clone()
        });
        if inserted {
            Ok(())
        } else {
            Err(DatabaseError::KeyExists(key.to_string()))
        }
    }

    async fn read(&self, key: &str) -> Result<Document, DatabaseError> {
        self.inner
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DatabaseError::KeyNotFound(key.to_string()))
    }

    // A delete racing this update may win; the update then resurrects the key.
    async fn update(&self, key: &str, value: &Document) -> Result<(), DatabaseError> {
        if !self.inner.contains_key(key) {
            return Err(DatabaseError::KeyNotFound(key.to_string()));
        }
        self.inner.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.inner
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::KeyNotFound(key.to_string()))
    }

    async fn query(
        &self,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> Result<Vec<Document>, DatabaseError> {
        let results = self
            .inner
            .iter()
            .filter(|entry| entry.value().get(field) == Some(value))
            .take(limit)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(results)
    }
}
