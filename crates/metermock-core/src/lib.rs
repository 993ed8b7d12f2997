//! metermock core: value primitives and the error type shared by the meter SDK.
//!
//! This crate defines what a measurement is made of (descriptor, number,
//! labels, context) without any recording machinery. It carries no runtime
//! dependencies so the SDK crate and test harnesses can share it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod context;
pub mod descriptor;
pub mod error;
pub mod label;
pub mod number;

pub use context::Context;
pub use descriptor::{Descriptor, InstrumentKind};
pub use error::{ErrorCode, MetricError, Result};
pub use label::{KeyValue, Value};
pub use number::{Number, NumberKind};
