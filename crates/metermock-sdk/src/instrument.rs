//! Instruments, bound handles, and the typed values they produce.

use std::fmt;
use std::sync::{Arc, Weak};

use metermock_core::{Context, Descriptor, KeyValue, Number};

use crate::async_state::AsyncRunner;
use crate::meter::MeterImpl;

/// State shared by both instrument families.
///
/// The meter reference is weak: the meter owns the async registry, which owns
/// async instruments, so a strong back-reference would never be freed.
#[derive(Debug)]
pub(crate) struct InstrumentBase {
    pub(crate) descriptor: Descriptor,
    pub(crate) meter: Weak<MeterImpl>,
}

impl InstrumentBase {
    fn meter(&self) -> Option<Arc<MeterImpl>> {
        let meter = self.meter.upgrade();
        if meter.is_none() {
            tracing::warn!(
                instrument = %self.descriptor.name(),
                "meter dropped; measurement discarded"
            );
        }
        meter
    }
}

/// Instrument recorded by direct caller action.
#[derive(Debug)]
pub struct SyncInstrument {
    base: InstrumentBase,
}

impl SyncInstrument {
    pub(crate) fn new(descriptor: Descriptor, meter: Weak<MeterImpl>) -> Self {
        Self {
            base: InstrumentBase { descriptor, meter },
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.base.descriptor
    }

    /// Pre-bind `labels`. No lookup or deduplication happens here; binding the
    /// same labels twice yields two independent handles.
    pub fn bind(self: &Arc<Self>, labels: &[KeyValue]) -> Handle {
        Handle {
            instrument: Arc::clone(self),
            labels: labels.to_vec(),
        }
    }

    /// Record one value as its own batch. The number kind is not checked
    /// against the descriptor.
    pub fn record_one(self: &Arc<Self>, cx: &Context, number: Number, labels: &[KeyValue]) {
        if let Some(meter) = self.base.meter() {
            let instrument = InstrumentRef::Sync(Arc::clone(self));
            meter.do_record_single(cx, labels, instrument, number);
        }
    }

    /// Typed measurement for `record_batch`.
    pub fn measurement(self: &Arc<Self>, number: impl Into<Number>) -> SyncMeasurement {
        SyncMeasurement {
            instrument: Arc::clone(self),
            number: number.into(),
        }
    }
}

/// Instrument observed only while its runner executes in a collection pass.
pub struct AsyncInstrument {
    base: InstrumentBase,
    runner: AsyncRunner,
}

impl AsyncInstrument {
    pub(crate) fn new(descriptor: Descriptor, meter: Weak<MeterImpl>, runner: AsyncRunner) -> Self {
        Self {
            base: InstrumentBase { descriptor, meter },
            runner,
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.base.descriptor
    }

    pub fn runner(&self) -> &AsyncRunner {
        &self.runner
    }

    /// Typed observation for batch observer callbacks.
    pub fn observation(self: &Arc<Self>, number: impl Into<Number>) -> Observation {
        Observation {
            instrument: Arc::clone(self),
            number: number.into(),
        }
    }
}

impl fmt::Debug for AsyncInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncInstrument")
            .field("descriptor", &self.base.descriptor)
            .field("runner", &self.runner)
            .finish()
    }
}

/// A synchronous instrument bound to a fixed label set.
#[derive(Debug, Clone)]
pub struct Handle {
    instrument: Arc<SyncInstrument>,
    labels: Vec<KeyValue>,
}

impl Handle {
    pub fn record_one(&self, cx: &Context, number: Number) {
        self.instrument.record_one(cx, number, &self.labels);
    }

    /// Release the binding. Bindings hold no resources here, so this only
    /// consumes the handle.
    pub fn unbind(self) {}

    pub fn instrument(&self) -> &Arc<SyncInstrument> {
        &self.instrument
    }

    pub fn labels(&self) -> &[KeyValue] {
        &self.labels
    }
}

/// Reference to the instrument that produced a recorded measurement.
#[derive(Debug, Clone)]
pub enum InstrumentRef {
    Sync(Arc<SyncInstrument>),
    Async(Arc<AsyncInstrument>),
}

impl InstrumentRef {
    pub fn descriptor(&self) -> &Descriptor {
        match self {
            InstrumentRef::Sync(s) => s.descriptor(),
            InstrumentRef::Async(a) => a.descriptor(),
        }
    }

    /// Identity comparison; two instruments with equal descriptors are still
    /// different instruments.
    pub fn is_same(&self, other: &InstrumentRef) -> bool {
        match (self, other) {
            (InstrumentRef::Sync(a), InstrumentRef::Sync(b)) => Arc::ptr_eq(a, b),
            (InstrumentRef::Async(a), InstrumentRef::Async(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_sync_instrument(&self, instrument: &Arc<SyncInstrument>) -> bool {
        matches!(self, InstrumentRef::Sync(s) if Arc::ptr_eq(s, instrument))
    }

    pub fn is_async_instrument(&self, instrument: &Arc<AsyncInstrument>) -> bool {
        matches!(self, InstrumentRef::Async(a) if Arc::ptr_eq(a, instrument))
    }
}

/// Caller-side synchronous measurement passed to `record_batch`.
#[derive(Debug, Clone)]
pub struct SyncMeasurement {
    instrument: Arc<SyncInstrument>,
    number: Number,
}

impl SyncMeasurement {
    pub fn instrument(&self) -> &Arc<SyncInstrument> {
        &self.instrument
    }

    pub fn number(&self) -> Number {
        self.number
    }
}

/// Value reported by an async runner for one async instrument.
#[derive(Debug, Clone)]
pub struct Observation {
    instrument: Arc<AsyncInstrument>,
    number: Number,
}

impl Observation {
    pub fn instrument(&self) -> &Arc<AsyncInstrument> {
        &self.instrument
    }

    pub fn number(&self) -> Number {
        self.number
    }
}
