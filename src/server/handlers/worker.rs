//! Module implementing the worker that performs image operations.
//! This is used by the operation request handlers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use pixl::{Call, Operation, Processor};
use serde_json::Value as Json;
use thiserror::Error;
use tokio::task;
use tokio::time;


/// Performs operation calls on the blocking thread pool of the runtime.
pub struct Worker {
    processor: Processor,
    timeout: Option<Duration>,
    stats: BTreeMap<Operation, Counters>,
}

impl Worker {
    /// Create the worker.
    /// Zero `timeout` means calls may take arbitrarily long.
    pub fn new(processor: Processor, timeout: Duration) -> Self {
        let timeout = if timeout.as_secs() > 0 { Some(timeout) } else { None };
        match timeout {
            Some(t) => trace!("Operation request timeout set to {} secs", t.as_secs()),
            None => trace!("Operation request timeout disabled"),
        }
        let stats = Operation::iter_variants().map(|op| (op, Counters::default())).collect();
        Worker{processor, timeout, stats}
    }

    #[inline]
    pub fn processor(&self) -> &Processor {
        &self.processor
    }
}

impl Worker {
    /// Perform the call in a separate thread, returning the URL of the result.
    pub async fn perform(&self, call: Call) -> Result<String, WorkError> {
        let op = call.operation();
        let counters = &self.stats[&op];
        counters.calls.fetch_add(1, Ordering::Relaxed);

        let start = Instant::now();
        let task = task::spawn_blocking({
            let processor = self.processor.clone();
            move || processor.call(call)
        });

        let joined = match self.timeout {
            Some(max_duration) => match time::timeout(max_duration, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    // The blocking thread keeps running until the operation finishes,
                    // only its result is discarded.
                    counters.timeouts.fetch_add(1, Ordering::Relaxed);
                    warn!("{} did not finish within {} secs", op, max_duration.as_secs());
                    return Err(WorkError::Timeout(max_duration));
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(url)) => {
                debug!("Performed {} in {:.3} secs", op, start.elapsed().as_secs_f64());
                Ok(url)
            }
            Ok(Err(e)) => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
                error!("Failed to perform {} ({} stage): {}", op, e.stage(), e);
                Err(WorkError::Operation(e))
            }
            Err(e) => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
                error!("Worker thread for {} has crashed: {}", op, e);
                Err(WorkError::Unavailable)
            }
        }
    }

    /// Per-operation statistics as JSON.
    pub fn stats(&self) -> Json {
        let ops: serde_json::Map<String, Json> = self.stats.iter()
            .map(|(op, counters)| (op.name().to_owned(), counters.to_json()))
            .collect();
        Json::Object(ops)
    }
}


/// Counters of calls to a single operation.
#[derive(Debug, Default)]
struct Counters {
    calls: AtomicUsize,
    failures: AtomicUsize,
    timeouts: AtomicUsize,
}

impl Counters {
    fn to_json(&self) -> Json {
        json!({
            "calls": self.calls.load(Ordering::Relaxed),
            "failures": self.failures.load(Ordering::Relaxed),
            "timeouts": self.timeouts.load(Ordering::Relaxed),
        })
    }
}


/// Error that can occur while performing an operation call.
#[derive(Debug, Error)]
pub enum WorkError {
    /// Error during the operation itself.
    #[error("{0}")]
    Operation(#[from] pixl::Error),
    /// Timeout while performing the call.
    #[error("operation did not finish within {} secs", .0.as_secs())]
    Timeout(Duration),
    /// Worker temporarily unavailable.
    #[error("worker unavailable")]
    Unavailable,
}
