//! The compiled contract and its report

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{CompileIssue, FieldRule};
use crate::schema::FormValues;

/// Outcome of validating a value mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    /// Field id (or `parent.index.subId` for entries) -> message
    pub errors_by_field_id: BTreeMap<String, String>,
}

impl ValidationReport {
    fn from_errors(errors: BTreeMap<String, String>) -> Self {
        ValidationReport {
            valid: errors.is_empty(),
            errors_by_field_id: errors,
        }
    }

    pub fn error(&self, path: &str) -> Option<&str> {
        self.errors_by_field_id.get(path).map(String::as_str)
    }
}

/// Per-field acceptance rules derived from one schema snapshot
#[derive(Debug, Clone)]
pub struct ValidationContract {
    rules: Vec<FieldRule>,
    issues: Vec<CompileIssue>,
}

impl ValidationContract {
    pub(crate) fn new(rules: Vec<FieldRule>, issues: Vec<CompileIssue>) -> Self {
        ValidationContract { rules, issues }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn rule(&self, field_id: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.field_id == field_id)
    }

    /// Configuration problems found at compile time
    pub fn issues(&self) -> &[CompileIssue] {
        &self.issues
    }

    pub fn is_misconfigured(&self, field_id: &str) -> bool {
        self.rule(field_id).map_or(false, FieldRule::is_misconfigured)
    }

    /// Validate every top-level field
    pub fn validate(&self, values: &FormValues) -> ValidationReport {
        self.validate_where(values, |_| true)
    }

    /// Validate only the fields in `visible`
    pub fn validate_visible(&self, values: &FormValues, visible: &BTreeSet<String>) -> ValidationReport {
        self.validate_where(values, |id| visible.contains(id))
    }

    /// Errors for one field, keyed like the report
    pub fn validate_field(&self, field_id: &str, values: &FormValues) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();
        if let Some(rule) = self.rule(field_id) {
            rule.check_into(field_id, values.get(field_id), &mut errors);
        }
        errors
    }

    fn validate_where<F>(&self, values: &FormValues, include: F) -> ValidationReport
    where
        F: Fn(&str) -> bool,
    {
        let mut errors = BTreeMap::new();
        for rule in self.rules.iter().filter(|r| include(r.field_id.as_str())) {
            rule.check_into(&rule.field_id, values.get(&rule.field_id), &mut errors);
        }
        ValidationReport::from_errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{FieldType, FieldValidation, FormField, FormSchema, FormValues};
    use crate::validation::compile;
    use serde_json::{json, Value};

    fn values(value: Value) -> FormValues {
        value.as_object().cloned().unwrap()
    }

    fn multi_select_schema() -> FormSchema {
        let mut field = FormField::new("toppings", FieldType::MultiSelect, "Toppings");
        field.required = true;
        field.validations = Some(FieldValidation { min: Some(1.0), ..Default::default() });
        FormSchema { fields: vec![field], ..Default::default() }
    }

    #[test]
    fn test_required_multi_select() {
        let contract = compile(&multi_select_schema());

        let report = contract.validate(&values(json!({"toppings": []})));
        assert!(!report.valid);
        assert!(report.error("toppings").is_some());

        let report = contract.validate(&values(json!({"toppings": ["cheese"]})));
        assert!(report.valid);
    }

    #[test]
    fn test_repeatable_entries_validated_per_entry() {
        let mut name = FormField::new("name", FieldType::Text, "Name");
        name.required = true;
        let age = FormField::new("age", FieldType::Number, "Age");
        let mut people = FormField::new("people", FieldType::Repeatable, "People");
        people.sub_fields = Some(vec![name, age]);
        let contract = compile(&FormSchema { fields: vec![people], ..Default::default() });

        let report = contract.validate(&values(json!({
            "people": [
                {"name": "Ada", "age": "36"},
                {"name": "", "age": "old"},
                "junk"
            ]
        })));

        assert!(!report.valid);
        assert_eq!(report.error("people.1.name"), Some("This field is required"));
        assert_eq!(report.error("people.1.age"), Some("Expected a number"));
        assert_eq!(report.error("people.2"), Some("Expected an entry object"));
        assert!(report.error("people.0.name").is_none());
    }

    #[test]
    fn test_validate_visible_skips_hidden() {
        let mut a = FormField::new("a", FieldType::Text, "A");
        a.required = true;
        let mut b = FormField::new("b", FieldType::Text, "B");
        b.required = true;
        let contract = compile(&FormSchema { fields: vec![a, b], ..Default::default() });

        let visible = ["a".to_string()].into_iter().collect();
        let report = contract.validate_visible(&values(json!({"a": "x"})), &visible);

        assert!(report.valid);
        assert!(!contract.validate(&values(json!({"a": "x"}))).valid);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let contract = compile(&multi_select_schema());
        let report = contract.validate(&FormValues::new());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], json!(false));
        assert!(json["errorsByFieldId"]["toppings"].is_string());
    }
}
