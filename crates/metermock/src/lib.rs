//! Top-level facade crate for metermock.
//!
//! Re-exports the value primitives and the recording SDK so harnesses can
//! depend on a single crate.

pub mod core {
    pub use metermock_core::*;
}

pub mod sdk {
    pub use metermock_sdk::*;
}

pub use metermock_sdk::{new_meter, new_meter_provider, MeterImpl};
