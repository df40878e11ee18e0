use std::{io::Write, time::Duration};

use tokio::time::{Instant, sleep};

use crate::{config::BenchConfig, error::BenchError, operation::OperationKind, state::BenchState};

/// Time between two throughput lines.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(10);

const SUMMARY_PERCENTILES: [(&str, f64); 3] = [("80th", 0.8), ("90th", 0.9), ("95th", 0.95)];

impl BenchState {
    /// Prints one progress line per `interval` until the operation target is
    /// reached or the run is stopped. A stop that arrives mid-interval still
    /// gets a last line covering the partial interval, unless nothing ran.
    pub async fn report_throughput<W: Write>(
        &self,
        config: &BenchConfig,
        interval: Duration,
        out: &mut W,
    ) -> Result<(), BenchError> {
        let started = Instant::now();
        let mut last_report = started;
        let mut ops_done = 0;
        let mut samples: u32 = 1;
        writeln!(out, "Benchmark started:")?;

        while self.operations() < config.operations && !self.is_stopped() {
            let stopped = tokio::select! {
                _ = sleep(interval) => false,
                _ = self.stopped() => true,
            };

            let operations = self.operations();
            if stopped && operations == ops_done {
                break;
            }

            let now = Instant::now();
            let seconds = now.duration_since(last_report).as_secs_f64();
            let throughput = if seconds > 0.0 {
                (operations - ops_done) as f64 / seconds
            } else {
                0.0
            };
            let label = if stopped {
                now.duration_since(started)
            } else {
                interval * samples
            };
            ops_done = operations;
            last_report = now;

            writeln!(
                out,
                "{:6} seconds: {:10.0} ops/sec; total operations: {}; total errors: {}",
                label.as_secs(),
                throughput,
                ops_done,
                self.total_errors()
            )?;
            out.flush()?;
            if stopped {
                break;
            }
            samples += 1;
        }
        Ok(())
    }

    /// Final report. Call only after every worker and the reporter returned.
    pub fn report_summary<W: Write>(&self, out: &mut W) -> Result<(), BenchError> {
        for kind in OperationKind::ALL {
            let latency = self.latency(kind);
            if latency.count() == 0 {
                continue;
            }
            writeln!(out, "{} latency:", kind)?;
            for (label, p) in SUMMARY_PERCENTILES {
                writeln!(out, "\t{} percentile: {:?}", label, latency.percentile(p))?;
            }
            writeln!(out, "\tMean: {:?}", latency.mean())?;
        }

        if self.has_errors() {
            writeln!(out, "Errors:")?;
            for kind in OperationKind::ALL {
                writeln!(out, "\t{:<7}: {}", kind.name(), self.errors(kind.code()))?;
            }
            writeln!(out, "\t{:<7}: {}", "Total", self.total_errors())?;
        }

        let elapsed = self.elapsed().unwrap_or_else(|| {
            tracing::warn!("Run was never started or finished, reporting zero elapsed time");
            Duration::ZERO
        });
        writeln!(out, "Time elapsed:\n\t{:?}", elapsed)?;
        out.flush()?;
        Ok(())
    }
}
