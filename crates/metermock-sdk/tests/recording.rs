//! Synchronous recording: direct, bound, and batched.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use serde_json::json;

use metermock_core::{Context, KeyValue, Number, Value};
use metermock_sdk::{new_meter, new_meter_provider, MeterImpl};

mod support;
use support::{counter, histogram, init_tracing};

#[test]
fn direct_records_become_one_batch_each() {
    init_tracing();
    let (core, _meter) = new_meter();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    let cx = Context::background();

    a.record_one(&cx, Number::I64(5), &[]);
    a.record_one(&cx, Number::I64(7), &[]);

    let batches = core.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].measurements.len(), 1);
    assert_eq!(batches[0].measurements[0].number, Number::I64(5));
    assert_eq!(batches[1].measurements[0].number, Number::I64(7));
    for b in &batches {
        assert!(b.measurements[0].instrument.is_sync_instrument(&a));
        assert!(b.labels.is_empty());
    }
}

#[test]
fn record_batch_keeps_contents_verbatim() {
    let core = MeterImpl::new();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    let b = core.new_sync_instrument(histogram("b")).unwrap();
    let labels = [KeyValue::new("host", "h1"), KeyValue::new("shard", 3i64)];

    core.record_batch(
        &Context::background(),
        &labels,
        vec![a.measurement(1i64), b.measurement(2.5f64), a.measurement(-4i64)],
    );

    let batches = core.batches();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.labels, labels.to_vec());
    assert_eq!(batch.measurements.len(), 3);
    assert!(batch.measurements[0].instrument.is_sync_instrument(&a));
    assert!(batch.measurements[1].instrument.is_sync_instrument(&b));
    assert!(batch.measurements[2].instrument.is_sync_instrument(&a));
    assert_eq!(batch.measurements[1].number, Number::F64(2.5));
    assert_eq!(batch.measurements[2].number, Number::I64(-4));
    assert!(batch.library_name.is_none());
}

#[test]
fn empty_record_batch_still_appends() {
    let core = MeterImpl::new();
    core.record_batch(&Context::background(), &[], Vec::new());
    assert_eq!(core.batch_count(), 1);
    assert!(core.batches()[0].measurements.is_empty());
}

#[test]
fn handles_bound_to_same_labels_record_identically() {
    let core = MeterImpl::new();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    let labels = [KeyValue::new("route", "/x")];
    let h1 = a.bind(&labels);
    let h2 = a.bind(&labels);
    let cx = Context::background();

    h1.record_one(&cx, Number::I64(1));
    h2.record_one(&cx, Number::I64(1));
    h1.unbind();
    h2.unbind();

    let records = core.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], records[1]);
    for b in core.batches() {
        assert!(b.measurements[0].instrument.is_sync_instrument(&a));
        assert_eq!(b.labels, labels.to_vec());
    }
}

#[test]
fn handle_exposes_binding() {
    let core = MeterImpl::new();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    let h = a.bind(&[KeyValue::new("k", true)]);
    assert!(Arc::ptr_eq(h.instrument(), &a));
    assert_eq!(h.labels()[0].value, Value::Bool(true));
}

#[test]
fn calls_on_different_instruments_never_merge() {
    let core = MeterImpl::new();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    let b = core.new_sync_instrument(counter("b")).unwrap();
    let cx = Context::background();

    a.record_one(&cx, Number::I64(1), &[]);
    b.record_one(&cx, Number::I64(2), &[]);
    core.record_batch(&cx, &[], vec![a.measurement(3i64)]);

    let recs = serde_json::to_value(core.records()).unwrap();
    assert_eq!(
        recs,
        json!([
            {
                "labels": [],
                "measurements": [{ "instrument": "a", "kind": "counter", "number": 1 }]
            },
            {
                "labels": [],
                "measurements": [{ "instrument": "b", "kind": "counter", "number": 2 }]
            },
            {
                "labels": [],
                "measurements": [{ "instrument": "a", "kind": "counter", "number": 3 }]
            },
        ])
    );
}

#[test]
fn number_kind_is_not_checked() {
    let core = MeterImpl::new();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    a.record_one(&Context::background(), Number::F64(0.25), &[]);
    assert_eq!(core.batches()[0].measurements[0].number, Number::F64(0.25));
}

#[test]
fn context_is_carried_with_the_batch() {
    let core = MeterImpl::new();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    let cx = Context::background().with_value("request_id", "r-17");

    a.record_one(&cx, Number::I64(1), &[]);

    let batches = core.batches();
    assert_eq!(
        batches[0].ctx.get("request_id"),
        Some(&Value::String("r-17".into()))
    );
}

#[test]
fn meter_view_stamps_library_name() {
    let (core, meter) = new_meter();
    assert_eq!(meter.instrumentation_name(), "mock");
    let a = meter.new_sync_instrument(counter("requests")).unwrap();
    assert_eq!(a.descriptor().instrumentation_name(), "mock");

    meter.record_batch(
        &Context::background(),
        &[KeyValue::new("code", 200i64)],
        vec![a.measurement(1i64)],
    );
    a.record_one(&Context::background(), Number::I64(2), &[]);

    let recs = serde_json::to_value(core.records()).unwrap();
    assert_eq!(
        recs,
        json!([
            {
                "library_name": "mock",
                "labels": [{ "key": "code", "value": 200 }],
                "measurements": [{ "instrument": "requests", "kind": "counter", "number": 1 }]
            },
            {
                "library_name": "mock",
                "labels": [],
                "measurements": [{ "instrument": "requests", "kind": "counter", "number": 2 }]
            },
        ])
    );
}

#[test]
fn mixed_meter_batch_carries_first_library_name() {
    let (core, provider) = new_meter_provider();
    let http = provider.meter("http");
    let db = provider.meter("db");
    let requests = http.new_sync_instrument(counter("requests")).unwrap();
    let queries = db.new_sync_instrument(counter("queries")).unwrap();
    let cx = Context::background();

    let mixed = vec![queries.measurement(1i64), requests.measurement(2i64)];
    db.record_batch(&cx, &[], mixed);
    let mixed = vec![requests.measurement(3i64), queries.measurement(4i64)];
    http.record_batch(&cx, &[], mixed);

    let names: Vec<_> = core
        .batches()
        .iter()
        .map(|b| b.library_name.clone())
        .collect();
    assert_eq!(names, vec![Some("db".to_string()), Some("http".to_string())]);
}

#[test]
fn take_batches_drains_the_log() {
    let core = MeterImpl::new();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    a.record_one(&Context::background(), Number::I64(1), &[]);
    a.record_one(&Context::background(), Number::I64(2), &[]);

    let drained = core.take_batches();
    assert_eq!(drained.len(), 2);
    assert_eq!(core.batch_count(), 0);

    a.record_one(&Context::background(), Number::I64(3), &[]);
    assert_eq!(core.batches()[0].measurements[0].number, Number::I64(3));
}

#[test]
fn recording_after_meter_dropped_is_discarded() {
    let core = MeterImpl::new();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    let h = a.bind(&[]);
    let weak = Arc::downgrade(&core);
    drop(core);

    // Instruments and handles hold the meter weakly.
    assert!(weak.upgrade().is_none());

    a.record_one(&Context::background(), Number::I64(1), &[]);
    h.record_one(&Context::background(), Number::I64(2));
    assert!(weak.upgrade().is_none());
}

#[test]
fn concurrent_callers_interleave_only_at_batch_granularity() {
    let core = MeterImpl::new();
    let a = core.new_sync_instrument(counter("a")).unwrap();
    let b = core.new_sync_instrument(counter("b")).unwrap();

    std::thread::scope(|s| {
        for t in 0..4i64 {
            let (a, b, core) = (Arc::clone(&a), Arc::clone(&b), Arc::clone(&core));
            s.spawn(move || {
                for i in 0..50i64 {
                    let v = t * 1000 + i;
                    let measurements = vec![a.measurement(v), b.measurement(v)];
                    core.record_batch(&Context::background(), &[], measurements);
                }
            });
        }
    });

    let batches = core.batches();
    assert_eq!(batches.len(), 200);
    for batch in &batches {
        assert_eq!(batch.measurements.len(), 2);
        assert!(batch.measurements[0].instrument.is_sync_instrument(&a));
        assert!(batch.measurements[1].instrument.is_sync_instrument(&b));
        assert_eq!(batch.measurements[0].number, batch.measurements[1].number);
    }
}
