//! Execution engine for running independent tasks with configurable parallelism.
//!
//! Both halves of the core fan out over independent units of work: an
//! [`crate::enrichment::EnrichmentPlan`] runs one task per nested join, a
//! [`crate::validation::ValidationEngine`] one task per column spec and per dataframe-wide check.
//! This module provides:
//!
//! - A dedicated rayon thread pool sized by [`ExecutionOptions`]
//! - Order-stable fan-out: results come back in input order no matter which task finishes first
//! - Real-time metrics + observer hooks for monitoring

mod observer;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{FlowError, FlowResult};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, Stage, StdErrExecutionObserver,
};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self { num_threads: Some(n) }
    }
}

impl ExecutionOptions {
    /// Run every task on a single worker thread.
    pub fn sequential() -> Self {
        Self { num_threads: Some(1) }
    }
}

/// A configurable execution engine for the enrichment and validation fan-out.
pub struct ExecutionEngine {
    pool: ThreadPool,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("num_threads", &self.pool.current_num_threads())
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails if `num_threads == Some(0)` or the thread pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> FlowResult<Self> {
        if opts.num_threads == Some(0) {
            return Err(FlowError::Execution {
                message: "num_threads must be > 0 when set".to_string(),
            });
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| FlowError::Execution {
                message: format!("failed to build thread pool: {e}"),
            })?;

        Ok(Self {
            pool,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run `task` over every item on the pool and return the results in `items` order.
    ///
    /// `label` names each task in [`ExecutionEvent::TaskStarted`]/[`ExecutionEvent::TaskFinished`].
    /// The call blocks until every task is done; no partial results are observable.
    pub fn run_ordered<I, T, L, F>(&self, stage: Stage, items: &[I], label: L, task: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        L: Fn(&I) -> String + Sync,
        F: Fn(&I) -> T + Sync,
    {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            stage,
            tasks: items.len(),
        });

        let out: Vec<T> = self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let name = label(item);
                    self.metrics.on_task_start();
                    self.emit(ExecutionEvent::TaskStarted {
                        stage,
                        label: name.clone(),
                    });

                    let task_start = Instant::now();
                    let result = task(item);

                    self.emit(ExecutionEvent::TaskFinished {
                        stage,
                        label: name,
                        elapsed: task_start.elapsed(),
                    });
                    self.metrics.on_task_end();
                    result
                })
                .collect()
        });

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            stage,
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        out
    }

    pub(crate) fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
