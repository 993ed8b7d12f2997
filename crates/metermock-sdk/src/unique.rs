//! Instrument-name uniqueness on top of any `MeterCore`.
//!
//! The raw meter accepts any descriptor. This decorator remembers each
//! instrument by (instrumentation name, instrument name): a compatible
//! re-registration returns the instrument created first, an incompatible one
//! fails with `MetricError::KindMismatch`.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use metermock_core::error::{MetricError, Result};
use metermock_core::{Context, Descriptor, KeyValue};

use crate::async_state::AsyncRunner;
use crate::instrument::{AsyncInstrument, InstrumentRef, SyncInstrument, SyncMeasurement};
use crate::provider::MeterCore;

pub struct UniqueInstrumentMeterCore<C> {
    inner: C,
    state: DashMap<(String, String), InstrumentRef>,
}

impl<C: MeterCore> UniqueInstrumentMeterCore<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            state: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

fn key(descriptor: &Descriptor) -> (String, String) {
    (
        descriptor.instrumentation_name().to_string(),
        descriptor.name().to_string(),
    )
}

fn mismatch(requested: &Descriptor, existing: &InstrumentRef) -> MetricError {
    let d = existing.descriptor();
    let family = match existing {
        InstrumentRef::Sync(_) => "sync",
        InstrumentRef::Async(_) => "async",
    };
    tracing::warn!(
        name = %requested.name(),
        library = %requested.instrumentation_name(),
        "instrument re-registered with incompatible descriptor"
    );
    MetricError::KindMismatch {
        name: requested.name().to_string(),
        library: requested.instrumentation_name().to_string(),
        existing: format!("{family} {:?} {:?}", d.instrument_kind(), d.number_kind()),
    }
}

impl<C: MeterCore> MeterCore for UniqueInstrumentMeterCore<C> {
    fn new_sync_instrument(&self, descriptor: Descriptor) -> Result<Arc<SyncInstrument>> {
        match self.state.entry(key(&descriptor)) {
            Entry::Occupied(e) => match e.get() {
                InstrumentRef::Sync(s) if s.descriptor().is_compatible(&descriptor) => {
                    Ok(Arc::clone(s))
                }
                other => Err(mismatch(&descriptor, other)),
            },
            Entry::Vacant(v) => {
                let s = self.inner.new_sync_instrument(descriptor)?;
                v.insert(InstrumentRef::Sync(Arc::clone(&s)));
                Ok(s)
            }
        }
    }

    fn new_async_instrument(
        &self,
        descriptor: Descriptor,
        runner: AsyncRunner,
    ) -> Result<Arc<AsyncInstrument>> {
        match self.state.entry(key(&descriptor)) {
            // The existing instrument keeps the runner it was created with.
            Entry::Occupied(e) => match e.get() {
                InstrumentRef::Async(a) if a.descriptor().is_compatible(&descriptor) => {
                    Ok(Arc::clone(a))
                }
                other => Err(mismatch(&descriptor, other)),
            },
            Entry::Vacant(v) => {
                let a = self.inner.new_async_instrument(descriptor, runner)?;
                v.insert(InstrumentRef::Async(Arc::clone(&a)));
                Ok(a)
            }
        }
    }

    fn record_batch(&self, cx: &Context, labels: &[KeyValue], measurements: Vec<SyncMeasurement>) {
        self.inner.record_batch(cx, labels, measurements);
    }
}
