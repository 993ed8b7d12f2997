//! Serializable view of the batch log.
//!
//! Instruments are reduced to their descriptor name and kind so harnesses can
//! compare a whole log against a `serde_json::json!` literal.

use serde::Serialize;

use metermock_core::{InstrumentKind, KeyValue, Number};

use crate::meter::{Batch, Measurement};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub instrument: String,
    pub kind: InstrumentKind,
    pub number: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,
    pub labels: Vec<KeyValue>,
    pub measurements: Vec<MeasurementRecord>,
}

impl From<&Measurement> for MeasurementRecord {
    fn from(m: &Measurement) -> Self {
        let d = m.instrument.descriptor();
        Self {
            instrument: d.name().to_string(),
            kind: d.instrument_kind(),
            number: m.number,
        }
    }
}

impl From<&Batch> for BatchRecord {
    fn from(b: &Batch) -> Self {
        Self {
            library_name: b.library_name.clone(),
            labels: b.labels.clone(),
            measurements: b.measurements.iter().map(MeasurementRecord::from).collect(),
        }
    }
}
