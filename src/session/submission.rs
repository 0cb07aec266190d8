//! Submission payload built from the visible fields

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::FormSession;
use crate::schema::{FormField, FormValues};
use crate::validation::ValidationReport;

/// An accepted response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub submitted_at: DateTime<Utc>,
    /// Visible values keyed by field id
    pub values: FormValues,
    /// Visible values keyed by field label
    pub answers: Map<String, Value>,
}

impl FormSession {
    /// Validate the visible fields and, if they pass, build the submission
    pub fn submit(&self) -> Result<Submission, ValidationReport> {
        let report = self.validate();
        if !report.valid {
            tracing::debug!(errors = report.errors_by_field_id.len(), "submission refused");
            return Err(report);
        }

        let mut values = FormValues::new();
        let mut answers = Map::new();
        for field in self.visible_in_order() {
            let value = match self.values.get(&field.id) {
                Some(v) => v,
                None => continue,
            };
            let value = submitted_value(field, value);
            answers.insert(field.label.clone(), value.clone());
            values.insert(field.id.clone(), value);
        }

        Ok(Submission {
            submitted_at: Utc::now(),
            values,
            answers,
        })
    }
}

/// File-like values keep only their name, type, and size
fn submitted_value(field: &FormField, value: &Value) -> Value {
    match value {
        Value::Object(file) if field.field_type.is_file_like() => {
            let metadata: Map<String, Value> = ["name", "type", "size"]
                .iter()
                .filter_map(|key| file.get(*key).map(|v| (key.to_string(), v.clone())))
                .collect();
            Value::Object(metadata)
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{Condition, ConditionOperator, FieldType, FormField, FormSchema};
    use crate::session::FormSession;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Arc<FormSchema> {
        let mut name = FormField::new("name", FieldType::Text, "Your name");
        name.required = true;
        let cv = FormField::new("cv", FieldType::File, "CV");
        let mut why = FormField::new("why", FieldType::Textarea, "Why?");
        why.conditions = Some(vec![Condition::new("name", ConditionOperator::Equals, json!("secret"))]);
        Arc::new(FormSchema { fields: vec![name, cv, why], ..Default::default() })
    }

    #[test]
    fn test_submit_refuses_invalid() {
        let session = FormSession::new(schema());
        let report = session.submit().unwrap_err();

        assert_eq!(report.error("name"), Some("This field is required"));
    }

    #[test]
    fn test_submission_keyed_by_label_without_hidden_fields() {
        let mut session = FormSession::new(schema());
        session.set_value("name", json!("Ada"));
        session.set_value("why", json!("hidden answer"));
        session.set_value(
            "cv",
            json!({"name": "cv.pdf", "type": "application/pdf", "size": 1024, "data": "..."}),
        );

        let submission = session.submit().unwrap();

        assert_eq!(submission.answers["Your name"], json!("Ada"));
        assert_eq!(
            submission.answers["CV"],
            json!({"name": "cv.pdf", "type": "application/pdf", "size": 1024})
        );
        assert!(!submission.answers.contains_key("Why?"));
        assert!(!submission.values.contains_key("why"));
    }
}
