use std::{future::Future, time::Duration};

use database::{Database, error::DatabaseError};
use tokio::time::{Instant, sleep};
use workload::{Workload, error::WorkloadError};

use crate::{config::BenchConfig, error::BenchError, operation::OperationKind, state::BenchState};

/// Pause between two iterations of one worker. With `n` workers the offered
/// load is about `n` iterations per pause.
pub const ITERATION_PAUSE: Duration = Duration::from_secs(1);

impl BenchState {
    /// One worker's loop: every iteration attempts each enabled kind once, in
    /// `OperationKind::ALL` order, then pauses.
    ///
    /// The target is only checked at the top of an iteration, so concurrent
    /// workers can overshoot `config.operations` by up to one iteration each.
    pub async fn execute_operation_mix(
        &self,
        database: &dyn Database,
        workload: &dyn Workload,
        config: &BenchConfig,
        pause: Duration,
    ) -> Result<(), BenchError> {
        if config.enabled_kinds().next().is_none() {
            return Err(BenchError::InvalidConfig(
                "at least one operation kind must be enabled".to_string(),
            ));
        }

        while self.operations() < config.operations && !self.is_stopped() {
            for kind in config.enabled_kinds() {
                self.execute(kind, database, workload, config).await?;
            }
            tokio::select! {
                _ = sleep(pause) => {}
                _ = self.stopped() => break,
            }
        }
        Ok(())
    }

    async fn execute(
        &self,
        kind: OperationKind,
        database: &dyn Database,
        workload: &dyn Workload,
        config: &BenchConfig,
    ) -> Result<(), BenchError> {
        if kind.needs_existing_key() && self.records() == 0 {
            return Err(BenchError::EmptyKeyspace(kind));
        }
        self.begin_operation();

        let fields = config.indexable_fields;
        let outcome = match kind {
            OperationKind::Create => {
                let sequence = self.add_record();
                let key = workload.generate_new_key(sequence);
                let value = workload.generate_value(&key, fields, config.value_size);
                self.timed(kind, database.create(&key, &value)).await
            }
            OperationKind::Read => {
                let generated = workload.generate_existing_key(self.records());
                let Some(key) = self.generated(kind, generated) else {
                    return Ok(());
                };
                self.timed(kind, database.read(&key)).await.map(drop)
            }
            OperationKind::Update => {
                let generated = workload.generate_existing_key(self.records());
                let Some(key) = self.generated(kind, generated) else {
                    return Ok(());
                };
                let value = workload.generate_value(&key, fields, config.value_size);
                self.timed(kind, database.update(&key, &value)).await
            }
            OperationKind::Delete => {
                let generated = workload.generate_key_for_removal(self.records());
                let Some(key) = self.generated(kind, generated) else {
                    return Ok(());
                };
                self.timed(kind, database.delete(&key)).await
            }
            OperationKind::Query => {
                let generated = workload.generate_query(fields, self.records());
                let Some(query) = self.generated(kind, generated) else {
                    return Ok(());
                };
                self.timed(kind, database.query(&query.field, &query.value, query.limit))
                    .await
                    .map(drop)
            }
        };

        if let Err(e) = outcome {
            tracing::debug!("{} failed: {}", kind, e);
            self.record_error(kind);
        }
        Ok(())
    }

    /// Generator failures after the first record count as failed operations
    /// of that kind. They are not timed.
    fn generated<T>(&self, kind: OperationKind, generated: Result<T, WorkloadError>) -> Option<T> {
        match generated {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("{} skipped, no key generated: {}", kind, e);
                self.record_error(kind);
                None
            }
        }
    }

    // Successful and failed calls are both sampled.
    async fn timed<T>(
        &self,
        kind: OperationKind,
        call: impl Future<Output = Result<T, DatabaseError>>,
    ) -> Result<T, DatabaseError> {
        let started = Instant::now();
        let result = call.await;
        self.record_latency(kind, started.elapsed());
        result
    }
}
