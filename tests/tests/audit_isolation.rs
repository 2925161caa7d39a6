use std::sync::Arc;
use std::time::{Duration, Instant};

use nafld_core::{AuditSink, NamedValues, RequestState, RiskBand};
use pretty_assertions::assert_eq;
use serde_json::json;
use tests::{
    handler_with, CollectingBackend, GatedBackend, SlowBackend, StubModel, UnreachableBackend,
};

fn male_forty() -> NamedValues {
    json!({"Gender": "Male", "Age in years": 40})
        .as_object()
        .cloned()
        .unwrap()
}

#[test]
fn unreachable_store_does_not_change_the_result() {
    let baseline = handler_with(Arc::new(StubModel::new(0.62)), AuditSink::disabled())
        .predict(&male_forty())
        .unwrap();

    let handler = handler_with(
        Arc::new(StubModel::new(0.62)),
        AuditSink::with_backend(Box::new(UnreachableBackend)),
    );
    assert_eq!(handler.audit().backend_name(), Some("unreachable"));
    for _ in 0..3 {
        let outcome = handler.execute(&male_forty());
        assert_eq!(outcome.state, RequestState::Done);
        assert_eq!(outcome.result.unwrap(), baseline);
    }
    handler.shutdown();
}

#[test]
fn result_is_returned_before_the_audit_write_finishes() {
    let (backend, release, done) = GatedBackend::new();
    let handler = handler_with(
        Arc::new(StubModel::new(0.62)),
        AuditSink::with_backend(Box::new(backend)),
    );
    // dropped before the handler so a failed assertion cannot hang the join
    let release = release;

    // the backend is still blocked on the gate while the caller has its answer
    let result = handler.predict(&male_forty()).unwrap();
    assert_eq!(result.risk_band, RiskBand::High);
    assert!(done.try_recv().is_err());

    release.send(()).unwrap();
    done.recv_timeout(Duration::from_secs(5))
        .expect("audit write completes once released");
    handler.shutdown();
}

#[test]
fn records_carry_validated_inputs_and_the_result() {
    let backend = CollectingBackend::default();
    let records = backend.records();
    let handler = handler_with(
        Arc::new(StubModel::new(0.0625)),
        AuditSink::with_backend(Box::new(backend)),
    );

    let input = json!({"Age in years": 52, "Gender": "Female", "Notes": "ignored"});
    handler.predict(input.as_object().unwrap()).unwrap();
    assert!(handler.predict(&NamedValues::new()).is_err());
    handler.shutdown();

    let records = records.lock();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    let keys: Vec<&str> = record.inputs.keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&"Gender") && keys.contains(&"Age in years"));
    assert_eq!(record.inputs.get("Age in years"), Some(&json!(52.0)));
    assert_eq!(record.risk_pct, 6.3);
    assert_eq!(record.risk_band, RiskBand::LowModerate);
    assert_eq!(record.label, 0);
}

#[test]
fn teardown_is_bounded_when_the_store_hangs() {
    let handler = handler_with(
        Arc::new(StubModel::new(0.62)),
        AuditSink::with_limits(
            Box::new(SlowBackend::new(Duration::from_secs(3))),
            16,
            Duration::from_millis(200),
        ),
    );

    let started = Instant::now();
    for _ in 0..3 {
        assert!(handler.predict(&male_forty()).is_ok());
    }
    assert!(started.elapsed() < Duration::from_secs(1));

    let started = Instant::now();
    drop(handler);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "teardown took {:?}",
        started.elapsed()
    );
}
