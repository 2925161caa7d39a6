use std::sync::atomic::Ordering;
use std::sync::Arc;

use approx::assert_relative_eq;
use nafld_core::{
    classify, AuditSink, ErrorKind, FeatureValue, NamedValues, PredictError, RequestState,
    RiskBand, ValidationError,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tests::{handler_with, BrokenModel, StubModel};

fn named(v: serde_json::Value) -> NamedValues {
    v.as_object().cloned().unwrap()
}

#[test]
fn male_forty_scores_high_risk() {
    let model = Arc::new(StubModel::new(0.62));
    let handler = handler_with(model.clone(), AuditSink::disabled());

    let result = handler
        .predict(&named(json!({"Gender": "Male", "Age in years": 40})))
        .unwrap();
    assert_relative_eq!(result.probability, 0.62);
    assert_eq!(result.risk_percentage, 62.0);
    assert_eq!(result.risk_band, RiskBand::High);
    assert_eq!(result.label, 1);

    assert_eq!(
        model.rows(),
        vec![vec![
            FeatureValue::Text("Male".into()),
            FeatureValue::Number(40.0)
        ]]
    );
}

#[test]
fn unknown_category_is_rejected_before_the_model() {
    let model = Arc::new(StubModel::new(0.62));
    let calls = model.call_counter();
    let handler = handler_with(model, AuditSink::disabled());

    let outcome = handler.execute(&named(json!({"Gender": "Other", "Age in years": 40})));
    assert_eq!(
        outcome.state,
        RequestState::Failed(ErrorKind::InvalidCategory)
    );
    match outcome.result {
        Err(PredictError::Validation(ValidationError::InvalidCategory { field, value, .. })) => {
            assert_eq!(field, "Gender");
            assert_eq!(value, "Other");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn range_bounds_are_inclusive() {
    let handler = handler_with(Arc::new(StubModel::new(0.2)), AuditSink::disabled());
    for age in [18.0, 85.0] {
        assert!(handler
            .predict(&named(json!({"Gender": "Female", "Age in years": age})))
            .is_ok());
    }
    for age in [18.0 - 1e-9, 85.0 + 1e-9] {
        let err = handler
            .predict(&named(json!({"Gender": "Female", "Age in years": age})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }
}

#[test]
fn threshold_is_inclusive_at_fifty_percent() {
    assert_eq!(classify(0.499, 0).risk_band, RiskBand::LowModerate);
    assert_eq!(classify(0.4949, 0).risk_band, RiskBand::LowModerate);
    assert_eq!(classify(0.5, 1).risk_band, RiskBand::High);
    assert_eq!(classify(0.5, 1).risk_percentage, 50.0);
}

#[test]
fn model_failures_are_distinct_from_validation() {
    let handler = handler_with(Arc::new(BrokenModel), AuditSink::disabled());
    let outcome = handler.execute(&named(json!({"Gender": "Male", "Age in years": 40})));
    assert_eq!(
        outcome.state,
        RequestState::Failed(ErrorKind::ModelInvocation)
    );
    let response = handler.handle(&named(json!({"Gender": "Male", "Age in years": 40})));
    assert_eq!(response.probability, None);
    assert!(response.message.starts_with("Inference error:"));
}

#[test]
fn every_failure_kind_is_reported_without_probability() {
    let handler = handler_with(Arc::new(StubModel::new(0.7)), AuditSink::disabled());
    let cases = [
        (json!({"Gender": "Male"}), ErrorKind::MissingField),
        (
            json!({"Gender": "Male", "Age in years": "forty"}),
            ErrorKind::TypeMismatch,
        ),
        (
            json!({"Gender": "Male", "Age in years": 90}),
            ErrorKind::OutOfRange,
        ),
    ];
    for (input, kind) in cases {
        let outcome = handler.execute(&named(input));
        assert_eq!(outcome.state, RequestState::Failed(kind));
        let response = nafld_core::DisplayResponse::from(&outcome.result);
        assert_eq!(response.probability, None);
        assert!(response.message.starts_with("Invalid input:"));
    }
}

#[test]
fn positional_and_named_submissions_agree() {
    let handler = handler_with(Arc::new(StubModel::new(0.41)), AuditSink::disabled());
    let by_name = handler.handle(&named(json!({"Age in years": 33, "Gender": "Female"})));
    let by_position = handler.handle_positional(&[json!("Female"), json!(33)]);
    assert_eq!(by_name, by_position);
    assert_eq!(
        by_name.message,
        "**Predicted NAFLD risk: 41.0% (Low/moderate risk)**"
    );
}
