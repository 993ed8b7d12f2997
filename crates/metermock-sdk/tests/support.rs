//! Helpers shared by the SDK integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use metermock_core::{Descriptor, InstrumentKind, NumberKind};

/// Route `tracing` output through the test writer when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn counter(name: &str) -> Descriptor {
    Descriptor::new(name, InstrumentKind::Counter, NumberKind::I64)
}

pub fn histogram(name: &str) -> Descriptor {
    Descriptor::new(name, InstrumentKind::Histogram, NumberKind::F64)
}

pub fn observer(name: &str) -> Descriptor {
    Descriptor::new(name, InstrumentKind::ValueObserver, NumberKind::I64)
}
