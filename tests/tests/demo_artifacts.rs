use std::path::PathBuf;

use nafld_core::{FieldSpec, PredictorConfig, RequestHandler, RiskBand};
use pretty_assertions::assert_eq;
use serde_json::json;

fn demo_config() -> PredictorConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data/nafld.toml");
    PredictorConfig::load(path).expect("demo config parses")
}

#[test]
fn demo_artifacts_cover_every_catalog_field() {
    let handler = RequestHandler::from_config(&demo_config()).expect("demo artifacts load");
    let context = handler.context();
    assert_eq!(context.schema().len(), 21);
    assert_eq!(context.schema().position("BMI"), Some(3));
    for name in context.schema().iter() {
        assert!(context.catalog().is_declared(name), "{name} has no preset");
    }
    assert!(matches!(
        context.catalog().spec_for("Smoking status"),
        FieldSpec::Categorical { .. }
    ));
}

#[test]
fn demo_defaults_score_and_higher_bmi_raises_risk() {
    let handler = RequestHandler::from_config(&demo_config()).unwrap();
    let defaults = handler.context().assembler().defaults();
    let baseline = handler.predict(&defaults).unwrap();

    let mut heavier = defaults.clone();
    heavier.insert("BMI".into(), json!(45.0));
    let raised = handler.predict(&heavier).unwrap();
    assert!(raised.probability > baseline.probability);
    assert_eq!(raised.risk_band, RiskBand::High);
}
