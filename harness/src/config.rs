use std::{fs, path::Path};

use database::DatabaseConfig;
use serde::Deserialize;
use workload::{MAX_INDEXABLE_FIELDS, WorkloadKind};

use crate::{error::BenchError, operation::OperationKind};

/// Run parameters. Each `*_percentage` only gates whether its kind runs:
/// any nonzero value includes the kind once in every iteration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub operations: u64,
    pub create_percentage: u32,
    pub read_percentage: u32,
    pub update_percentage: u32,
    pub delete_percentage: u32,
    pub query_percentage: u32,
    pub indexable_fields: usize,
    pub value_size: usize,
    pub workers: usize,
    /// Records created before the clock starts; not counted as operations.
    pub initial_records: u64,
    #[serde(rename = "type")]
    pub workload: WorkloadKind,
    pub hot_percentage: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            create_percentage: 100,
            read_percentage: 0,
            update_percentage: 0,
            delete_percentage: 0,
            query_percentage: 0,
            indexable_fields: 3,
            value_size: 512,
            workers: 1,
            initial_records: 0,
            workload: WorkloadKind::Default,
            hot_percentage: 20,
        }
    }
}

impl BenchConfig {
    pub fn percentage(&self, kind: OperationKind) -> u32 {
        match kind {
            OperationKind::Create => self.create_percentage,
            OperationKind::Read => self.read_percentage,
            OperationKind::Update => self.update_percentage,
            OperationKind::Delete => self.delete_percentage,
            OperationKind::Query => self.query_percentage,
        }
    }

    pub fn is_enabled(&self, kind: OperationKind) -> bool {
        self.percentage(kind) > 0
    }

    /// Enabled kinds in the fixed per-iteration order.
    pub fn enabled_kinds(&self) -> impl Iterator<Item = OperationKind> + '_ {
        OperationKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.workers == 0 {
            return Err(invalid("workers must be at least 1"));
        }
        if self.enabled_kinds().next().is_none() {
            return Err(invalid("at least one operation kind must be enabled"));
        }
        if self.indexable_fields > MAX_INDEXABLE_FIELDS {
            return Err(invalid(format!(
                "indexable_fields is {}, must be at most {}",
                self.indexable_fields, MAX_INDEXABLE_FIELDS
            )));
        }
        if !(1..=100).contains(&self.hot_percentage) {
            return Err(invalid(format!(
                "hot_percentage is {}, must be between 1 and 100",
                self.hot_percentage
            )));
        }
        if self.is_enabled(OperationKind::Query) && self.indexable_fields == 0 {
            return Err(invalid("queries need at least one indexable field"));
        }
        let needs_keys = self.enabled_kinds().any(OperationKind::needs_existing_key);
        if needs_keys && !self.is_enabled(OperationKind::Create) && self.initial_records == 0 {
            return Err(invalid(
                "reads, updates, deletes and queries need creates or initial_records",
            ));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> BenchError {
    BenchError::InvalidConfig(reason.into())
}

/// On-disk layout: `{"database": {...}, "workload": {...}}`, both optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub database: DatabaseConfig,
    pub workload: BenchConfig,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
