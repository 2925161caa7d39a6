//! Interactive, field-by-field entry of one prediction request.

use crate::render::{coerce_text, describe};
use nafld_core::{validate_field, NamedValues, PredictorContext};

/// Result of feeding one answer line to the form
#[derive(Debug, Clone, PartialEq)]
pub enum FormStep {
    /// Answer accepted; ask the next field
    Next,
    /// Answer rejected; ask the same field again
    Retry(String),
    /// Every field answered
    Complete(NamedValues),
}

/// Walks the schema in order, validating each answer as it is entered
pub struct FormSession<'a> {
    context: &'a PredictorContext,
    index: usize,
    values: NamedValues,
}

impl<'a> FormSession<'a> {
    pub fn new(context: &'a PredictorContext) -> Self {
        Self {
            context,
            index: 0,
            values: NamedValues::new(),
        }
    }

    fn current(&self) -> Option<&'a str> {
        self.context.schema().names().get(self.index).map(String::as_str)
    }

    pub fn prompt(&self) -> String {
        let Some(name) = self.current() else {
            return String::new();
        };
        let catalog = self.context.catalog();
        let spec = catalog.spec_for(name);
        format!(
            "{} ({}) [{}]: ",
            catalog.label_for(name),
            describe(spec),
            spec.default_value()
        )
    }

    /// An empty line accepts the field's default
    pub fn handle_line(&mut self, line: &str) -> FormStep {
        let Some(name) = self.current() else {
            return FormStep::Complete(self.values.clone());
        };
        let spec = self.context.catalog().spec_for(name);
        let value = if line.trim().is_empty() {
            coerce_text(spec, &spec.default_value().to_string())
        } else {
            coerce_text(spec, line)
        };
        if let Err(e) = validate_field(name, spec, &value) {
            return FormStep::Retry(e.to_string());
        }
        self.values.insert(name.to_string(), value);
        self.index += 1;
        if self.index == self.context.schema().len() {
            FormStep::Complete(self.values.clone())
        } else {
            FormStep::Next
        }
    }
}
