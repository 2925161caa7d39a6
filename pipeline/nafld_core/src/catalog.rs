//! Compiled-in field metadata: kind, valid domain and default per feature.

use nafld_model::FeatureValue;
use std::collections::HashMap;

/// Inclusive numeric domain with a widget step and a default
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub minimum: f64,
    pub maximum: f64,
    pub step: f64,
    pub default: f64,
}

impl NumericRange {
    pub const fn new(minimum: f64, maximum: f64, default: f64, step: f64) -> Self {
        Self {
            minimum,
            maximum,
            step,
            default,
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        (self.minimum..=self.maximum).contains(&x)
    }
}

/// Validation domain for one feature.
///
/// Validators and renderers match on this exhaustively, so a new kind is a
/// compile-time visible change.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    Categorical { choices: Vec<String> },
    BoundedNumeric(NumericRange),
    /// Fallback for schema entries without a declared preset
    FreeNumeric,
}

impl FieldSpec {
    pub fn categorical<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldSpec::Categorical {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    /// Value used to prefill a form
    pub fn default_value(&self) -> FeatureValue {
        match self {
            FieldSpec::Categorical { choices } => choices
                .first()
                .map(|c| FeatureValue::Text(c.clone()))
                .unwrap_or_else(|| FeatureValue::Text(String::new())),
            FieldSpec::BoundedNumeric(range) => FeatureValue::Number(range.default),
            FieldSpec::FreeNumeric => FeatureValue::Number(0.0),
        }
    }
}

static FREE_NUMERIC: FieldSpec = FieldSpec::FreeNumeric;

const CATEGORICAL_CHOICES: &[(&str, &[&str])] = &[
    ("Gender", &["Male", "Female"]),
    (
        "Race/Ethnicity",
        &["Non-Hispanic White", "Non-Hispanic Black", "Hispanic", "Other"],
    ),
    ("Smoking status", &["Never", "Former", "Current"]),
    ("Sleep Disorder Status", &["No", "Yes"]),
];

// (name, minimum, maximum, default, step)
const RANGE_PRESETS: &[(&str, NumericRange)] = &[
    // Demographics / lifestyle
    ("Age in years", NumericRange::new(18.0, 85.0, 40.0, 1.0)),
    ("BMI", NumericRange::new(15.0, 50.0, 28.0, 0.1)),
    ("Sleep duration (hours/day)", NumericRange::new(3.0, 12.0, 7.0, 0.5)),
    ("Work schedule duration (hours)", NumericRange::new(0.0, 16.0, 8.0, 0.5)),
    ("Physical activity (minutes/day)", NumericRange::new(0.0, 300.0, 30.0, 5.0)),
    // Alcohol
    ("Alcohol consumption (days/week)", NumericRange::new(0.0, 7.0, 0.0, 0.5)),
    ("Alcohol drinks per day", NumericRange::new(0.0, 10.0, 0.0, 0.5)),
    ("Number of days drank in the past year", NumericRange::new(0.0, 365.0, 0.0, 1.0)),
    ("Max number of drinks on any single day", NumericRange::new(0.0, 20.0, 0.0, 1.0)),
    ("Alcohol intake frequency (drinks/day)", NumericRange::new(0.0, 10.0, 0.0, 0.1)),
    // Diet
    ("Total calorie intake (kcal)", NumericRange::new(800.0, 5000.0, 2200.0, 50.0)),
    ("Total fat (g)", NumericRange::new(10.0, 200.0, 70.0, 1.0)),
    ("Saturated fat (g)", NumericRange::new(0.0, 80.0, 25.0, 1.0)),
    ("Added sugar (g)", NumericRange::new(0.0, 150.0, 30.0, 1.0)),
    ("Dietary fiber (g)", NumericRange::new(0.0, 80.0, 20.0, 1.0)),
    ("Fruit/veg servings per day", NumericRange::new(0.0, 10.0, 3.0, 0.5)),
    ("Sugary drinks per week", NumericRange::new(0.0, 50.0, 0.0, 1.0)),
];

const DISPLAY_LABELS: &[(&str, &str)] = &[("Age in years", "Age (years)")];

/// Mapping from feature name to its [`FieldSpec`].
///
/// Unknown names resolve to [`FieldSpec::FreeNumeric`], so every schema
/// feature can be rendered and validated even when it has no preset.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    specs: HashMap<String, FieldSpec>,
    labels: HashMap<String, String>,
}

impl FieldCatalog {
    /// An empty catalog: every feature is free numeric
    pub fn new() -> Self {
        Self::default()
    }

    /// The presets shipped with the NAFLD lifestyle model
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (name, choices) in CATEGORICAL_CHOICES {
            catalog.insert(*name, FieldSpec::categorical(choices.iter().copied()));
        }
        for (name, range) in RANGE_PRESETS {
            catalog.insert(*name, FieldSpec::BoundedNumeric(*range));
        }
        for (name, label) in DISPLAY_LABELS {
            catalog.labels.insert((*name).to_string(), (*label).to_string());
        }
        catalog
    }

    /// Declare or replace the spec for one feature
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) -> &mut Self {
        self.specs.insert(name.into(), spec);
        self
    }

    pub fn with(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(name, spec);
        self
    }

    pub fn spec_for(&self, name: &str) -> &FieldSpec {
        self.specs.get(name).unwrap_or(&FREE_NUMERIC)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Human-facing label, falling back to the feature name
    pub fn label_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.labels.get(name).map(String::as_str).unwrap_or(name)
    }
}
