//! The recording sink.
//!
//! Every recording path (direct, bound, batched, asynchronous) funnels into
//! `MeterImpl::collect`, which appends exactly one `Batch` under the meter
//! lock. Batches are never merged, reordered, or modified after append.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use metermock_core::{Context, Descriptor, KeyValue, Number};

use crate::async_state::{AsyncCollector, AsyncInstrumentState, AsyncRegistry, AsyncRunner};
use crate::inspect::BatchRecord;
use crate::instrument::{
    AsyncInstrument, InstrumentRef, Observation, SyncInstrument, SyncMeasurement,
};

/// One recorded value and the instrument that produced it.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub number: Number,
    pub instrument: InstrumentRef,
}

/// Measurements from a single logical recording call.
#[derive(Debug, Clone)]
pub struct Batch {
    pub measurements: Vec<Measurement>,
    pub ctx: Context,
    pub labels: Vec<KeyValue>,
    /// Instrumentation name of the first measurement's descriptor, if set.
    /// A batch mixing instruments from several named meters carries only the
    /// first one's name.
    pub library_name: Option<String>,
}

pub struct MeterImpl {
    self_ref: Weak<MeterImpl>,
    batches: Mutex<Vec<Batch>>,
    async_instruments: Box<dyn AsyncRegistry + Send + Sync>,
}

impl MeterImpl {
    /// Meter backed by the default `AsyncInstrumentState` registry.
    pub fn new() -> Arc<Self> {
        Self::with_registry(AsyncInstrumentState::new())
    }

    pub fn with_registry(registry: impl AsyncRegistry + Send + Sync + 'static) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            batches: Mutex::new(Vec::new()),
            async_instruments: Box::new(registry),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Batch>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Never fails; descriptors are not validated here.
    pub fn new_sync_instrument(
        &self,
        descriptor: Descriptor,
    ) -> metermock_core::Result<Arc<SyncInstrument>> {
        let _guard = self.lock();
        tracing::debug!(
            name = %descriptor.name(),
            kind = ?descriptor.instrument_kind(),
            "new sync instrument"
        );
        Ok(Arc::new(SyncInstrument::new(descriptor, self.self_ref.clone())))
    }

    /// Allocates the instrument and registers it under `runner`. Never fails.
    pub fn new_async_instrument(
        &self,
        descriptor: Descriptor,
        runner: AsyncRunner,
    ) -> metermock_core::Result<Arc<AsyncInstrument>> {
        let _guard = self.lock();
        tracing::debug!(
            name = %descriptor.name(),
            kind = ?descriptor.instrument_kind(),
            "new async instrument"
        );
        let instrument = Arc::new(AsyncInstrument::new(
            descriptor,
            self.self_ref.clone(),
            runner.clone(),
        ));
        self.async_instruments.register(Arc::clone(&instrument), runner);
        Ok(instrument)
    }

    /// Append all `measurements` as one batch.
    pub fn record_batch(
        &self,
        cx: &Context,
        labels: &[KeyValue],
        measurements: Vec<SyncMeasurement>,
    ) {
        let mm = measurements
            .into_iter()
            .map(|m| Measurement {
                number: m.number(),
                instrument: InstrumentRef::Sync(Arc::clone(m.instrument())),
            })
            .collect();
        self.collect(cx, labels, mm);
    }

    pub(crate) fn do_record_single(
        &self,
        cx: &Context,
        labels: &[KeyValue],
        instrument: InstrumentRef,
        number: Number,
    ) {
        self.collect(cx, labels, vec![Measurement { number, instrument }]);
    }

    /// Run one collection pass over every registered async runner.
    ///
    /// The meter lock is not held while runners execute, so a runner may
    /// record through synchronous instruments of this same meter.
    pub fn run_async_instruments(&self) {
        self.async_instruments.run(&Context::background(), self);
    }

    fn collect(&self, cx: &Context, labels: &[KeyValue], measurements: Vec<Measurement>) {
        let library_name = measurements
            .first()
            .map(|m| m.instrument.descriptor().instrumentation_name())
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let mut batches = self.lock();
        tracing::trace!(
            index = batches.len(),
            measurements = measurements.len(),
            "batch appended"
        );
        batches.push(Batch {
            measurements,
            ctx: cx.clone(),
            labels: labels.to_vec(),
            library_name,
        });
    }

    /// Snapshot of the batch log in append order.
    pub fn batches(&self) -> Vec<Batch> {
        self.lock().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.lock().len()
    }

    /// Drain the batch log, leaving it empty.
    pub fn take_batches(&self) -> Vec<Batch> {
        std::mem::take(&mut *self.lock())
    }

    /// Serializable view of the batch log for assertions.
    pub fn records(&self) -> Vec<BatchRecord> {
        self.lock().iter().map(BatchRecord::from).collect()
    }

    /// Async instruments in registration order.
    pub fn async_instruments(&self) -> Vec<Arc<AsyncInstrument>> {
        self.async_instruments.instruments()
    }
}

impl AsyncCollector for MeterImpl {
    fn collect_async(&self, labels: &[KeyValue], observations: Vec<Observation>) {
        let mm = observations
            .into_iter()
            .map(|o| Measurement {
                number: o.number(),
                instrument: InstrumentRef::Async(Arc::clone(o.instrument())),
            })
            .collect();
        self.collect(&Context::background(), labels, mm);
    }
}

impl fmt::Debug for MeterImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeterImpl")
            .field("batches", &self.batch_count())
            .finish_non_exhaustive()
    }
}
