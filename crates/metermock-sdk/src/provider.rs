//! Meter provider and the named `Meter` view handed to application code.
//!
//! Test code keeps the `Arc<MeterImpl>` to read the batch log; application
//! code only sees `Meter`.

use std::sync::Arc;

use metermock_core::{Context, Descriptor, KeyValue, Result};

use crate::async_state::AsyncRunner;
use crate::config::MockConfig;
use crate::instrument::{AsyncInstrument, SyncInstrument, SyncMeasurement};
use crate::meter::MeterImpl;
use crate::unique::UniqueInstrumentMeterCore;

/// Name used by `new_meter`.
pub const DEFAULT_METER_NAME: &str = "mock";

/// Instrument creation and batch recording, as seen by a `Meter`.
pub trait MeterCore: Send + Sync {
    fn new_sync_instrument(&self, descriptor: Descriptor) -> Result<Arc<SyncInstrument>>;
    fn new_async_instrument(
        &self,
        descriptor: Descriptor,
        runner: AsyncRunner,
    ) -> Result<Arc<AsyncInstrument>>;
    fn record_batch(&self, cx: &Context, labels: &[KeyValue], measurements: Vec<SyncMeasurement>);
}

impl MeterCore for MeterImpl {
    fn new_sync_instrument(&self, descriptor: Descriptor) -> Result<Arc<SyncInstrument>> {
        MeterImpl::new_sync_instrument(self, descriptor)
    }

    fn new_async_instrument(
        &self,
        descriptor: Descriptor,
        runner: AsyncRunner,
    ) -> Result<Arc<AsyncInstrument>> {
        MeterImpl::new_async_instrument(self, descriptor, runner)
    }

    fn record_batch(&self, cx: &Context, labels: &[KeyValue], measurements: Vec<SyncMeasurement>) {
        MeterImpl::record_batch(self, cx, labels, measurements)
    }
}

impl<T: MeterCore + ?Sized> MeterCore for Arc<T> {
    fn new_sync_instrument(&self, descriptor: Descriptor) -> Result<Arc<SyncInstrument>> {
        (**self).new_sync_instrument(descriptor)
    }

    fn new_async_instrument(
        &self,
        descriptor: Descriptor,
        runner: AsyncRunner,
    ) -> Result<Arc<AsyncInstrument>> {
        (**self).new_async_instrument(descriptor, runner)
    }

    fn record_batch(&self, cx: &Context, labels: &[KeyValue], measurements: Vec<SyncMeasurement>) {
        (**self).record_batch(cx, labels, measurements)
    }
}

#[derive(Clone)]
pub struct MeterProvider {
    core: Arc<dyn MeterCore>,
}

impl MeterProvider {
    pub fn new(core: Arc<dyn MeterCore>) -> Self {
        Self { core }
    }

    pub fn meter(&self, instrumentation_name: &str) -> Meter {
        Meter {
            instrumentation_name: instrumentation_name.to_string(),
            core: Arc::clone(&self.core),
        }
    }
}

/// Named view over a `MeterCore`.
///
/// Descriptors without an instrumentation name are stamped with this meter's
/// name, so batches recorded through its instruments carry it as library name.
#[derive(Clone)]
pub struct Meter {
    instrumentation_name: String,
    core: Arc<dyn MeterCore>,
}

impl Meter {
    pub fn instrumentation_name(&self) -> &str {
        &self.instrumentation_name
    }

    fn stamp(&self, descriptor: Descriptor) -> Descriptor {
        if descriptor.instrumentation_name().is_empty() {
            descriptor.with_instrumentation_name(self.instrumentation_name.as_str())
        } else {
            descriptor
        }
    }

    pub fn new_sync_instrument(&self, descriptor: Descriptor) -> Result<Arc<SyncInstrument>> {
        self.core.new_sync_instrument(self.stamp(descriptor))
    }

    pub fn new_async_instrument(
        &self,
        descriptor: Descriptor,
        runner: AsyncRunner,
    ) -> Result<Arc<AsyncInstrument>> {
        self.core.new_async_instrument(self.stamp(descriptor), runner)
    }

    pub fn record_batch(
        &self,
        cx: &Context,
        labels: &[KeyValue],
        measurements: Vec<SyncMeasurement>,
    ) {
        self.core.record_batch(cx, labels, measurements);
    }
}

/// Core handle plus a provider whose meters enforce instrument-name
/// uniqueness.
pub fn new_meter_provider() -> (Arc<MeterImpl>, MeterProvider) {
    let core = MeterImpl::new();
    let unique = UniqueInstrumentMeterCore::new(Arc::clone(&core));
    let provider = MeterProvider::new(Arc::new(unique));
    (core, provider)
}

pub fn new_meter() -> (Arc<MeterImpl>, Meter) {
    let (core, provider) = new_meter_provider();
    (core, provider.meter(DEFAULT_METER_NAME))
}

/// Like `new_meter`, with the meter name and uniqueness checking taken from
/// `cfg`.
pub fn new_meter_from_config(cfg: &MockConfig) -> (Arc<MeterImpl>, Meter) {
    let core = MeterImpl::new();
    let view: Arc<dyn MeterCore> = if cfg.meter.unique_instruments {
        Arc::new(UniqueInstrumentMeterCore::new(Arc::clone(&core)))
    } else {
        Arc::clone(&core) as Arc<dyn MeterCore>
    };
    tracing::debug!(
        name = %cfg.meter.name,
        unique = cfg.meter.unique_instruments,
        "meter built from config"
    );
    (core, MeterProvider::new(view).meter(&cfg.meter.name))
}
