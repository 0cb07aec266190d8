//! Form session - the live value mapping for one schema snapshot
//!
//! Every value change recomputes the visible set before returning, so
//! visibility always matches the values that produced it.

mod entries;
mod submission;

pub use submission::Submission;

use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::schema::{FieldType, FormField, FormSchema, FormValues};
use crate::validation::{self, ValidationContract, ValidationReport};
use crate::visibility::VisibilityEvaluator;

/// Initial value of a field before the user touches it
pub fn default_value(field: &FormField) -> Value {
    match field.field_type {
        FieldType::Text
        | FieldType::Textarea
        | FieldType::Email
        | FieldType::Date
        | FieldType::Select
        | FieldType::Radio => Value::String(String::new()),
        FieldType::Number | FieldType::File | FieldType::Image | FieldType::Attachment => Value::Null,
        FieldType::MultiSelect | FieldType::Checkbox => Value::Array(Vec::new()),
        FieldType::Rating => Value::from(0),
        FieldType::Matrix => Value::Object(serde_json::Map::new()),
        FieldType::Repeatable => Value::Array(Vec::new()),
    }
}

/// Initial values for every top-level field
pub fn default_values(schema: &FormSchema) -> FormValues {
    schema
        .fields
        .iter()
        .map(|field| (field.id.clone(), default_value(field)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct FormSession {
    schema: Arc<FormSchema>,
    contract: ValidationContract,
    values: FormValues,
    visible: BTreeSet<String>,
}

impl FormSession {
    pub fn new(schema: Arc<FormSchema>) -> Self {
        let contract = validation::compile(&schema);
        let values = default_values(&schema);
        let mut session = FormSession {
            schema,
            contract,
            values,
            visible: BTreeSet::new(),
        };
        session.refresh();
        session
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn contract(&self) -> &ValidationContract {
        &self.contract
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, field_id: &str) -> Option<&Value> {
        self.values.get(field_id)
    }

    pub fn set_value(&mut self, field_id: &str, value: Value) {
        self.values.insert(field_id.to_string(), value);
        self.refresh();
    }

    /// Merge `values` over the current mapping, recomputing once
    pub fn set_values(&mut self, values: FormValues) {
        self.values.extend(values);
        self.refresh();
    }

    pub fn is_visible(&self, field_id: &str) -> bool {
        if self.visible.contains(field_id) {
            return true;
        }
        // Sub-fields follow their section
        self.schema
            .owner_of(field_id)
            .map_or(false, |owner| owner.id != field_id && self.visible.contains(&owner.id))
    }

    pub fn visible_fields(&self) -> &BTreeSet<String> {
        &self.visible
    }

    /// Visible fields in schema order, for rendering
    pub fn visible_in_order(&self) -> Vec<&FormField> {
        self.schema
            .fields
            .iter()
            .filter(|f| self.visible.contains(&f.id))
            .collect()
    }

    /// Validate the visible fields
    pub fn validate(&self) -> ValidationReport {
        self.contract.validate_visible(&self.values, &self.visible)
    }

    /// Back to initial values
    pub fn reset(&mut self) {
        self.values = default_values(&self.schema);
        self.refresh();
    }

    fn refresh(&mut self) {
        self.visible = VisibilityEvaluator::new(&self.schema).compute_visible_set(&self.values);
    }
}
