//! Instrument descriptors.

use serde::Serialize;

use crate::number::NumberKind;

/// Kind of instrument a descriptor names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Counter,
    UpDownCounter,
    Histogram,
    ValueObserver,
    SumObserver,
    UpDownSumObserver,
}

impl InstrumentKind {
    /// Whether instruments of this kind are observed by callbacks.
    pub fn is_async(self) -> bool {
        matches!(
            self,
            InstrumentKind::ValueObserver
                | InstrumentKind::SumObserver
                | InstrumentKind::UpDownSumObserver
        )
    }
}

/// Immutable identity of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    name: String,
    instrument_kind: InstrumentKind,
    number_kind: NumberKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    unit: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    instrumentation_name: String,
}

impl Descriptor {
    pub fn new(
        name: impl Into<String>,
        instrument_kind: InstrumentKind,
        number_kind: NumberKind,
    ) -> Self {
        Self {
            name: name.into(),
            instrument_kind,
            number_kind,
            description: String::new(),
            unit: String::new(),
            instrumentation_name: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_instrumentation_name(mut self, name: impl Into<String>) -> Self {
        self.instrumentation_name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instrument_kind(&self) -> InstrumentKind {
        self.instrument_kind
    }

    pub fn number_kind(&self) -> NumberKind {
        self.number_kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn instrumentation_name(&self) -> &str {
        &self.instrumentation_name
    }

    /// Same instrument kind and number kind. Name and metadata are ignored.
    pub fn is_compatible(&self, other: &Descriptor) -> bool {
        self.instrument_kind == other.instrument_kind && self.number_kind == other.number_kind
    }
}
