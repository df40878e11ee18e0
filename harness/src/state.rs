use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use parking_lot::Mutex;
use sketch::LatencySketch;
use tokio::{sync::watch, time::Instant};

use crate::{error::BenchError, operation::OperationKind};

/// Error label that aggregates every kind.
pub const TOTAL_ERRORS: &str = "total";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Started,
    Finished,
}

/// Everything the workers and the reporter share during a run.
///
/// Counters are relaxed atomics: they only ever grow and the reporter reads
/// them as approximate progress. Each latency sketch has its own lock so
/// workers recording different kinds never contend.
#[derive(Debug)]
pub struct BenchState {
    operations: AtomicU64,
    records: AtomicU64,
    errors: Mutex<HashMap<&'static str, u64>>,
    events: Mutex<HashMap<Event, Instant>>,
    latency: [Mutex<LatencySketch>; 5],
    stop: watch::Sender<bool>,
}

impl BenchState {
    pub fn new() -> Result<Self, BenchError> {
        let (stop, _) = watch::channel(false);
        Ok(Self {
            operations: AtomicU64::new(0),
            records: AtomicU64::new(0),
            errors: Mutex::new(HashMap::new()),
            events: Mutex::new(HashMap::new()),
            latency: [
                Mutex::new(LatencySketch::new()?),
                Mutex::new(LatencySketch::new()?),
                Mutex::new(LatencySketch::new()?),
                Mutex::new(LatencySketch::new()?),
                Mutex::new(LatencySketch::new()?),
            ],
            stop,
        })
    }

    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Counts an attempt before it runs. Returns the new total.
    pub(crate) fn begin_operation(&self) -> u64 {
        self.operations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the sequence number of the new record.
    pub(crate) fn add_record(&self) -> u64 {
        self.records.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_error(&self, kind: OperationKind) {
        let mut errors = self.errors.lock();
        *errors.entry(kind.code()).or_insert(0) += 1;
        *errors.entry(TOTAL_ERRORS).or_insert(0) += 1;
    }

    /// Count under a label: a kind's code or `TOTAL_ERRORS`.
    pub fn errors(&self, label: &str) -> u64 {
        self.errors.lock().get(label).copied().unwrap_or(0)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors(TOTAL_ERRORS)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.lock().is_empty()
    }

    pub fn record_latency(&self, kind: OperationKind, sample: Duration) {
        self.latency[kind.index()].lock().add_sample(sample);
    }

    /// A copy of the kind's sketch, taken under its lock.
    pub fn latency(&self, kind: OperationKind) -> LatencySketch {
        self.latency[kind.index()].lock().clone()
    }

    /// Stamps `event` with the current time. Only the first mark counts.
    pub fn mark(&self, event: Event) -> bool {
        let mut events = self.events.lock();
        if events.contains_key(&event) {
            tracing::warn!("Event {:?} already marked, keeping the first timestamp", event);
            return false;
        }
        events.insert(event, Instant::now());
        true
    }

    pub fn event(&self, event: Event) -> Option<Instant> {
        self.events.lock().get(&event).copied()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        let started = self.event(Event::Started)?;
        let finished = self.event(Event::Finished)?;
        Some(finished.saturating_duration_since(started))
    }

    /// Asks every worker and the reporter to finish their current iteration
    /// and return.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Resolves once `stop` has been called, immediately if it already was.
    pub async fn stopped(&self) {
        let mut receiver = self.stop.subscribe();
        // the sender lives as long as `self`, so this cannot fail
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}
