//! metermock SDK: an in-memory meter that records every measurement.
//!
//! `MeterImpl` is the recording sink. It hands out synchronous and
//! asynchronous instruments, accepts single and batched recordings, and
//! appends each logical recording call to an ordered batch log that test
//! harnesses read back. Nothing is aggregated or exported.
//!
//! The other modules wrap that sink the way an SDK pipeline would: a
//! pluggable async callback registry, a name-uniqueness decorator, a named
//! `Meter` view, and a strict YAML config.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod async_state;
pub mod config;
pub mod inspect;
pub mod instrument;
pub mod meter;
pub mod provider;
pub mod unique;

pub use async_state::{
    AsyncCollector, AsyncInstrumentState, AsyncRegistry, AsyncRunner, BatchObserverResult,
    SingleObserverResult,
};
pub use inspect::{BatchRecord, MeasurementRecord};
pub use instrument::{
    AsyncInstrument, Handle, InstrumentRef, Observation, SyncInstrument, SyncMeasurement,
};
pub use meter::{Batch, Measurement, MeterImpl};
pub use provider::{
    new_meter, new_meter_from_config, new_meter_provider, Meter, MeterCore, MeterProvider,
};
pub use unique::UniqueInstrumentMeterCore;
