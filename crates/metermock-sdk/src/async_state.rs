//! Asynchronous instrument registry and runner model.
//!
//! A runner is a callback invoked once per collection pass. Single runners
//! report values for the one instrument they were registered with; batch
//! runners report for any number of instruments sharing them. The registry
//! buffers what one invocation reports and hands it to an `AsyncCollector` in
//! arrival order, merging consecutive observations that share a label set, so
//! an invocation that uses one label set becomes exactly one batch.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metermock_core::{Context, KeyValue, Number};

use crate::instrument::{AsyncInstrument, Observation};

type SingleFn = dyn Fn(&Context, &mut SingleObserverResult<'_>) + Send + Sync;
type BatchFn = dyn Fn(&Context, &mut BatchObserverResult<'_>) + Send + Sync;

/// Callback attached to asynchronous instruments.
///
/// Cloning shares the callback; clones are the same runner for registration
/// purposes.
#[derive(Clone)]
pub enum AsyncRunner {
    Single(Arc<SingleFn>),
    Batch(Arc<BatchFn>),
}

impl AsyncRunner {
    pub fn single<F>(f: F) -> Self
    where
        F: Fn(&Context, &mut SingleObserverResult<'_>) + Send + Sync + 'static,
    {
        AsyncRunner::Single(Arc::new(f))
    }

    pub fn batch<F>(f: F) -> Self
    where
        F: Fn(&Context, &mut BatchObserverResult<'_>) + Send + Sync + 'static,
    {
        AsyncRunner::Batch(Arc::new(f))
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, AsyncRunner::Batch(_))
    }

    fn same_runner(&self, other: &AsyncRunner) -> bool {
        match (self, other) {
            (AsyncRunner::Single(a), AsyncRunner::Single(b)) => Arc::ptr_eq(a, b),
            (AsyncRunner::Batch(a), AsyncRunner::Batch(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for AsyncRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsyncRunner::Single(_) => f.write_str("AsyncRunner::Single"),
            AsyncRunner::Batch(_) => f.write_str("AsyncRunner::Batch"),
        }
    }
}

/// Sink for observations produced during a collection pass.
pub trait AsyncCollector {
    fn collect_async(&self, labels: &[KeyValue], observations: Vec<Observation>);
}

/// Owns async instruments and their runners, and drives collection passes.
pub trait AsyncRegistry {
    fn register(&self, instrument: Arc<AsyncInstrument>, runner: AsyncRunner);

    /// Invoke every distinct runner once and forward what it observed to
    /// `collector` before returning.
    fn run(&self, cx: &Context, collector: &dyn AsyncCollector);

    fn instruments(&self) -> Vec<Arc<AsyncInstrument>>;
}

/// Observations from one runner invocation in arrival order. Consecutive
/// observations with equal label sets share a group.
#[derive(Default)]
struct ObservationBuffer {
    groups: Vec<(Vec<KeyValue>, Vec<Observation>)>,
}

impl ObservationBuffer {
    fn push(&mut self, labels: &[KeyValue], observations: impl IntoIterator<Item = Observation>) {
        let observations: Vec<Observation> = observations.into_iter().collect();
        if observations.is_empty() {
            return;
        }
        if let Some((last, group)) = self.groups.last_mut() {
            if last.as_slice() == labels {
                group.extend(observations);
                return;
            }
        }
        self.groups.push((labels.to_vec(), observations));
    }

    fn flush(self, collector: &dyn AsyncCollector) {
        for (labels, observations) in self.groups {
            collector.collect_async(&labels, observations);
        }
    }
}

/// Handed to a single runner; observes its one instrument.
pub struct SingleObserverResult<'a> {
    instrument: &'a Arc<AsyncInstrument>,
    buffer: &'a mut ObservationBuffer,
}

impl SingleObserverResult<'_> {
    pub fn instrument(&self) -> &Arc<AsyncInstrument> {
        self.instrument
    }

    pub fn observe(&mut self, number: impl Into<Number>, labels: &[KeyValue]) {
        let obs = self.instrument.observation(number);
        self.buffer.push(labels, [obs]);
    }
}

/// Handed to a batch runner; observes any instruments sharing the runner.
pub struct BatchObserverResult<'a> {
    instruments: &'a [Arc<AsyncInstrument>],
    buffer: &'a mut ObservationBuffer,
}

impl BatchObserverResult<'_> {
    /// Instruments registered under this runner, in registration order.
    pub fn instruments(&self) -> &[Arc<AsyncInstrument>] {
        self.instruments
    }

    /// Look up a registered instrument by descriptor name.
    pub fn instrument(&self, name: &str) -> Option<&Arc<AsyncInstrument>> {
        self.instruments
            .iter()
            .find(|i| i.descriptor().name() == name)
    }

    pub fn observe(
        &mut self,
        labels: &[KeyValue],
        observations: impl IntoIterator<Item = Observation>,
    ) {
        self.buffer.push(labels, observations);
    }
}

#[derive(Clone)]
struct RunnerEntry {
    runner: AsyncRunner,
    instruments: Vec<Arc<AsyncInstrument>>,
}

#[derive(Default)]
struct StateInner {
    instruments: Vec<Arc<AsyncInstrument>>,
    runners: Vec<RunnerEntry>,
}

/// Default `AsyncRegistry`.
///
/// A batch runner is invoked once per pass no matter how many instruments
/// share it; a single runner is invoked once per (runner, instrument) pair.
#[derive(Default)]
pub struct AsyncInstrumentState {
    inner: Mutex<StateInner>,
}

impl AsyncInstrumentState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of distinct runner invocations per pass.
    pub fn runner_count(&self) -> usize {
        self.lock().runners.len()
    }
}

impl AsyncRegistry for AsyncInstrumentState {
    fn register(&self, instrument: Arc<AsyncInstrument>, runner: AsyncRunner) {
        let mut inner = self.lock();
        inner.instruments.push(Arc::clone(&instrument));

        let existing = inner.runners.iter().position(|e| {
            e.runner.same_runner(&runner)
                && (runner.is_batch()
                    || e.instruments.iter().any(|i| Arc::ptr_eq(i, &instrument)))
        });
        match existing {
            Some(idx) if runner.is_batch() => inner.runners[idx].instruments.push(instrument),
            Some(_) => {}
            None => inner.runners.push(RunnerEntry {
                runner,
                instruments: vec![instrument],
            }),
        }
    }

    fn run(&self, cx: &Context, collector: &dyn AsyncCollector) {
        let runners = self.lock().runners.clone();
        tracing::debug!(runners = runners.len(), "async collection pass");

        for entry in &runners {
            let mut buffer = ObservationBuffer::default();
            match &entry.runner {
                AsyncRunner::Single(f) => {
                    for instrument in &entry.instruments {
                        let mut result = SingleObserverResult {
                            instrument,
                            buffer: &mut buffer,
                        };
                        f(cx, &mut result);
                    }
                }
                AsyncRunner::Batch(f) => {
                    let mut result = BatchObserverResult {
                        instruments: &entry.instruments,
                        buffer: &mut buffer,
                    };
                    f(cx, &mut result);
                }
            }
            buffer.flush(collector);
        }
    }

    fn instruments(&self) -> Vec<Arc<AsyncInstrument>> {
        self.lock().instruments.clone()
    }
}
