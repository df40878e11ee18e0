use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use database::{Database, Document, error::DatabaseError};
use parking_lot::Mutex;
use serde_json::Value;

use crate::operation::OperationKind;

/// Accepts every call like the null backend, remembering the call order.
/// Kinds listed in `failing` return an error after being logged, and the
/// `panicking` kind brings its worker down.
#[derive(Debug, Default)]
pub struct RecordingDatabase {
    calls: Mutex<Vec<OperationKind>>,
    failing: Vec<OperationKind>,
    panicking: Option<OperationKind>,
    shut_down: AtomicBool,
}

impl RecordingDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(kinds: &[OperationKind]) -> Self {
        Self {
            failing: kinds.to_vec(),
            ..Self::default()
        }
    }

    pub fn panicking(kind: OperationKind) -> Self {
        Self {
            panicking: Some(kind),
            ..Self::default()
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<OperationKind> {
        self.calls.lock().clone()
    }

    pub fn count(&self, kind: OperationKind) -> usize {
        self.calls.lock().iter().filter(|call| **call == kind).count()
    }

    fn log(&self, kind: OperationKind) -> Result<(), DatabaseError> {
        self.calls.lock().push(kind);
        if self.panicking == Some(kind) {
            panic!("injected {kind} panic");
        }
        if self.failing.contains(&kind) {
            return Err(DatabaseError::Other(format!("injected {kind} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl Database for RecordingDatabase {
    fn name(&self) -> &str {
        "recording"
    }

    async fn create(&self, _key: &str, _value: &Document) -> Result<(), DatabaseError> {
        self.log(OperationKind::Create)
    }

    async fn read(&self, _key: &str) -> Result<Document, DatabaseError> {
        self.log(OperationKind::Read).map(|_| Document::new())
    }

    async fn update(&self, _key: &str, _value: &Document) -> Result<(), DatabaseError> {
        self.log(OperationKind::Update)
    }

    async fn delete(&self, _key: &str) -> Result<(), DatabaseError> {
        self.log(OperationKind::Delete)
    }

    async fn query(
        &self,
        _field: &str,
        _value: &Value,
        _limit: usize,
    ) -> Result<Vec<Document>, DatabaseError> {
        self.log(OperationKind::Query).map(|_| Vec::new())
    }

    async fn shutdown(&self) -> Result<(), DatabaseError> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}
