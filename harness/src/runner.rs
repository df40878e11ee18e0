use std::{io::Write, sync::Arc, time::Duration};

use database::Database;
use tokio::task::JoinSet;
use workload::Workload;

use crate::{
    config::BenchConfig,
    error::BenchError,
    executor::ITERATION_PAUSE,
    report::REPORT_INTERVAL,
    state::{BenchState, Event},
};

pub struct RunnerBuilder {
    iteration_pause: Duration,
    report_interval: Duration,
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self {
            iteration_pause: ITERATION_PAUSE,
            report_interval: REPORT_INTERVAL,
        }
    }
}

impl RunnerBuilder {
    pub fn iteration_pause(mut self, iteration_pause: Duration) -> Self {
        self.iteration_pause = iteration_pause;
        self
    }

    pub fn report_interval(mut self, report_interval: Duration) -> Self {
        self.report_interval = report_interval;
        self
    }

    /// Validates `config` and allocates the shared state. Nothing touches the
    /// database until `Runner::run`.
    pub fn build(
        self,
        config: BenchConfig,
        database: Arc<dyn Database>,
        workload: Arc<dyn Workload>,
    ) -> Result<Runner, BenchError> {
        config.validate()?;
        Ok(Runner {
            config: Arc::new(config),
            database,
            workload,
            state: Arc::new(BenchState::new()?),
            iteration_pause: self.iteration_pause,
            report_interval: self.report_interval,
        })
    }
}

/// Launches the workers and the throughput reporter over one shared state and
/// joins them all before the run counts as finished.
#[derive(Debug)]
pub struct Runner {
    config: Arc<BenchConfig>,
    database: Arc<dyn Database>,
    workload: Arc<dyn Workload>,
    state: Arc<BenchState>,
    iteration_pause: Duration,
    report_interval: Duration,
}

impl Runner {
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::default()
    }

    /// Handle for reading results afterwards or stopping the run early.
    pub fn state(&self) -> Arc<BenchState> {
        self.state.clone()
    }

    /// Runs to completion, writing throughput lines to `output`, and hands
    /// `output` back for the summary. The first worker error stops every other
    /// task and is returned once they have all been joined. A failing
    /// `output` is reported only after the run has finished and the database
    /// is shut down, and never hides a worker error.
    pub async fn run<W>(self, output: W) -> Result<W, BenchError>
    where
        W: Write + Send + 'static,
    {
        self.preload().await?;

        self.state.mark(Event::Started);
        tracing::info!(
            "Starting {} workers against {} for {} operations",
            self.config.workers,
            self.database.name(),
            self.config.operations
        );

        let reporter = {
            let state = self.state.clone();
            let config = self.config.clone();
            let interval = self.report_interval;
            tokio::spawn(async move {
                let mut output = output;
                state
                    .report_throughput(&config, interval, &mut output)
                    .await
                    .map(|_| output)
            })
        };

        let mut workers = JoinSet::new();
        for worker in 0..self.config.workers {
            let state = self.state.clone();
            let database = self.database.clone();
            let workload = self.workload.clone();
            let config = self.config.clone();
            let pause = self.iteration_pause;
            workers.spawn(async move {
                tracing::debug!("Worker {} started", worker);
                let result = state
                    .execute_operation_mix(database.as_ref(), workload.as_ref(), &config, pause)
                    .await;
                if result.is_err() {
                    state.stop();
                }
                result
            });
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined.map_err(BenchError::from).and_then(|result| result) {
                tracing::error!("Worker failed: {}", e);
                self.state.stop();
                first_error.get_or_insert(e);
            }
        }

        // Workers are done; wake the reporter instead of waiting out its interval.
        self.state.stop();
        let reported = reporter
            .await
            .map_err(BenchError::from)
            .and_then(|result| result);
        if let Err(e) = &reported {
            tracing::error!("Throughput reporter failed: {}", e);
        }
        self.state.mark(Event::Finished);

        if let Err(e) = self.database.shutdown().await {
            tracing::warn!("Database shutdown failed: {}", e);
        }
        tracing::info!(
            "Finished after {} operations, {} errors",
            self.state.operations(),
            self.state.total_errors()
        );

        match first_error {
            Some(e) => Err(e),
            None => reported,
        }
    }

    /// Creates `initial_records` documents before the clock starts. They grow
    /// `records` but are neither counted as operations nor timed.
    async fn preload(&self) -> Result<(), BenchError> {
        let count = self.config.initial_records;
        if count == 0 {
            return Ok(());
        }
        tracing::info!("Preloading {} records", count);
        for _ in 0..count {
            let sequence = self.state.add_record();
            let key = self.workload.generate_new_key(sequence);
            let value = self.workload.generate_value(
                &key,
                self.config.indexable_fields,
                self.config.value_size,
            );
            self.database
                .create(&key, &value)
                .await
                .map_err(|source| BenchError::Preload { sequence, source })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{operation::OperationKind, testing::RecordingDatabase};
    use database::{error::DatabaseError, memory::MemoryDatabase};
    use std::io;
    use workload::{WorkloadKind, default::DefaultWorkload};

    struct BrokenOutput;

    impl Write for BrokenOutput {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn runner(config: BenchConfig, database: Arc<dyn Database>) -> Result<Runner, BenchError> {
        Runner::builder().build(config, database, Arc::new(DefaultWorkload::new()))
    }

    fn summary(state: &BenchState) -> Result<String, BenchError> {
        let mut out = Vec::new();
        state.report_summary(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_operations() -> Result<(), BenchError> {
        let database = Arc::new(RecordingDatabase::new());
        let config = BenchConfig {
            operations: 0,
            ..BenchConfig::default()
        };
        let runner = runner(config, database.clone())?;
        let state = runner.state();

        let output = runner.run(Vec::new()).await?;

        assert_eq!(String::from_utf8_lossy(&output), "Benchmark started:\n");
        assert_eq!(state.operations(), 0);
        assert_eq!(state.records(), 0);
        assert!(database.calls().is_empty());
        assert!(state.event(Event::Started).is_some());
        assert!(state.event(Event::Finished).is_some());

        let summary = summary(&state)?;
        assert_eq!(summary, "Time elapsed:\n\t0ns\n");

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_worker_create_only() -> Result<(), BenchError> {
        let database = Arc::new(RecordingDatabase::new());
        let config = BenchConfig {
            operations: 5,
            value_size: 100,
            ..BenchConfig::default()
        };
        let runner = runner(config, database.clone())?;
        let state = runner.state();

        runner.run(Vec::new()).await?;

        assert_eq!(database.count(OperationKind::Create), 5);
        assert_eq!(state.records(), 5);
        assert_eq!(state.latency(OperationKind::Create).count(), 5);
        assert!(state.elapsed().is_some_and(|elapsed| elapsed > Duration::ZERO));

        let summary = summary(&state)?;
        assert!(summary.starts_with("Create latency:\n"), "{summary}");
        assert!(!summary.contains("Errors:"));
        assert!(summary.ends_with("Time elapsed:\n\t5s\n"), "{summary}");

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_workers_bounded_overshoot() -> Result<(), BenchError> {
        let database = Arc::new(MemoryDatabase::new());
        let workers = 4;
        let config = BenchConfig {
            operations: 41,
            read_percentage: 10,
            workers,
            ..BenchConfig::default()
        };
        let runner = runner(config, database.clone())?;
        let state = runner.state();

        runner.run(Vec::new()).await?;

        let operations = state.operations();
        assert!(operations >= 41, "stopped early at {operations}");
        assert!(operations <= 41 + (workers as u64) * 2 - 1, "overshot to {operations}");
        assert_eq!(database.len() as u64, state.records());
        assert_eq!(state.latency(OperationKind::Create).count(), state.records());
        assert!(!state.has_errors());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_feeds_read_only_run() -> Result<(), BenchError> {
        let database = Arc::new(MemoryDatabase::new());
        let config = BenchConfig {
            operations: 6,
            create_percentage: 0,
            read_percentage: 100,
            update_percentage: 100,
            initial_records: 3,
            ..BenchConfig::default()
        };
        let runner = runner(config, database.clone())?;
        let state = runner.state();

        runner.run(Vec::new()).await?;

        assert_eq!(database.len(), 3);
        assert_eq!(state.records(), 3);
        assert_eq!(state.operations(), 6);
        assert_eq!(state.latency(OperationKind::Create).count(), 0);
        assert_eq!(state.latency(OperationKind::Read).count(), 3);
        assert_eq!(state.latency(OperationKind::Update).count(), 3);
        assert!(!state.has_errors());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_failure_is_fatal() -> Result<(), BenchError> {
        let database = Arc::new(RecordingDatabase::failing(&[OperationKind::Create]));
        let config = BenchConfig {
            initial_records: 2,
            ..BenchConfig::default()
        };
        let runner = runner(config, database.clone())?;
        let state = runner.state();

        let result = runner.run(Vec::new()).await;

        assert!(matches!(
            result,
            Err(BenchError::Preload {
                sequence: 1,
                source: DatabaseError::Other(_)
            })
        ));
        assert!(state.event(Event::Started).is_none());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_hotspot_queries_after_preload() -> Result<(), BenchError> {
        let database = Arc::new(MemoryDatabase::new());
        let config = BenchConfig {
            operations: 6,
            create_percentage: 0,
            query_percentage: 100,
            initial_records: 2,
            ..BenchConfig::default()
        };
        let runner = Runner::builder().build(
            config,
            database.clone(),
            workload::open(WorkloadKind::Hotspot, 50)?,
        )?;
        let state = runner.state();

        runner.run(Vec::new()).await?;

        assert_eq!(state.operations(), 6);
        assert_eq!(state.latency(OperationKind::Query).count(), 6);
        assert!(!state.has_errors());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_run_early() -> Result<(), BenchError> {
        let database = Arc::new(RecordingDatabase::new());
        let config = BenchConfig {
            operations: 1_000,
            workers: 2,
            ..BenchConfig::default()
        };
        let runner = runner(config, database.clone())?;
        let state = runner.state();

        let stopper = {
            let state = state.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(3_500)).await;
                state.stop();
            })
        };
        let output = runner.run(Vec::new()).await?;
        stopper.await?;

        // two workers, iterations at 0s, 1s, 2s and 3s
        assert_eq!(state.operations(), 8);
        assert_eq!(
            String::from_utf8_lossy(&output),
            "Benchmark started:\n     3 seconds:          2 ops/sec; total operations: 8; total errors: 0\n"
        );
        assert_eq!(state.elapsed(), Some(Duration::from_millis(3_500)));

        Ok(())
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = BenchConfig {
            create_percentage: 0,
            read_percentage: 100,
            ..BenchConfig::default()
        };
        let result = runner(config, Arc::new(RecordingDatabase::new()));
        assert!(matches!(result, Err(BenchError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_operations_show_in_summary() -> Result<(), BenchError> {
        let database = Arc::new(RecordingDatabase::failing(&[OperationKind::Read]));
        let config = BenchConfig {
            operations: 4,
            read_percentage: 50,
            ..BenchConfig::default()
        };
        let runner = runner(config, database.clone())?;
        let state = runner.state();

        runner.run(Vec::new()).await?;

        let summary = summary(&state)?;
        assert!(summary.contains("Read latency:\n"));
        assert!(summary.contains("\tRead   : 2\n"), "{summary}");
        assert!(summary.contains("\tTotal  : 2\n"), "{summary}");

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_output_still_finishes_run() -> Result<(), BenchError> {
        let database = Arc::new(RecordingDatabase::new());
        let config = BenchConfig {
            operations: 3,
            ..BenchConfig::default()
        };
        let runner = runner(config, database.clone())?;
        let state = runner.state();

        let result = runner.run(BrokenOutput).await;

        assert!(matches!(result, Err(BenchError::Io(_))));
        assert_eq!(state.operations(), 3);
        assert!(state.event(Event::Finished).is_some());
        assert!(database.is_shut_down());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_error_wins_over_output_error() -> Result<(), BenchError> {
        let database = Arc::new(RecordingDatabase::panicking(OperationKind::Read));
        let config = BenchConfig {
            operations: 10,
            read_percentage: 100,
            ..BenchConfig::default()
        };
        let runner = runner(config, database.clone())?;
        let state = runner.state();

        let result = runner.run(BrokenOutput).await;

        assert!(matches!(result, Err(BenchError::Join(_))));
        assert!(state.event(Event::Finished).is_some());
        assert!(database.is_shut_down());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_workers_bounded_overshoot() -> Result<(), BenchError> {
        let database = Arc::new(MemoryDatabase::new());
        let workers = 8;
        let target = 4_000;
        let config = BenchConfig {
            operations: target,
            read_percentage: 100,
            delete_percentage: 100,
            query_percentage: 100,
            workers,
            ..BenchConfig::default()
        };
        let enabled = config.enabled_kinds().count() as u64;
        let runner = Runner::builder()
            .iteration_pause(Duration::ZERO)
            .report_interval(Duration::from_millis(20))
            .build(config, database.clone(), Arc::new(DefaultWorkload::new()))?;
        let state = runner.state();

        runner.run(Vec::new()).await?;

        let operations = state.operations();
        assert!(operations >= target, "stopped early at {operations}");
        assert!(
            operations <= target + workers as u64 * enabled - 1,
            "overshot to {operations}"
        );
        assert_eq!(state.latency(OperationKind::Create).count(), state.records());
        assert!(state.records() >= target / enabled);
        assert!(state.event(Event::Finished).is_some());

        Ok(())
    }
}
