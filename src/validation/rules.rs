//! Per-type rule table and the generic check dispatcher

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use super::CompileIssue;
use crate::schema::{FieldType, FormField};

lazy_static! {
    // Local part and dotted domain with a 2+ letter TLD. Leading dots and
    // ".." are checked separately (no lookaround in `regex`).
    static ref EMAIL_RE: Regex = Regex::new(
        r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$"
    ).unwrap();
}

/// Why a value was refused. Display is the default message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Failure {
    #[error("This field is required")]
    Required,
    #[error("Expected text")]
    ExpectedText,
    #[error("Must be at least {0} characters")]
    TooShort(usize),
    #[error("Must be at most {0} characters")]
    TooLong(usize),
    #[error("Invalid format")]
    PatternMismatch,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Expected a number")]
    ExpectedNumber,
    #[error("Must be at least {0}")]
    BelowMin(f64),
    #[error("Must be at most {0}")]
    AboveMax(f64),
    #[error("Expected a list of options")]
    ExpectedSelections,
    #[error("Please select at least {0} options")]
    TooFewSelections(f64),
    #[error("Please select at most {0} options")]
    TooManySelections(f64),
    #[error("Expected a date")]
    ExpectedDate,
    #[error("Expected an answer for each row")]
    ExpectedMatrix,
    #[error("Expected a list of entries")]
    ExpectedEntries,
    #[error("Expected an entry object")]
    ExpectedEntry,
}

/// Structural shape of one compiled rule
#[derive(Debug, Clone)]
pub enum RuleKind {
    Text {
        min_length: Option<usize>,
        max_length: Option<usize>,
        pattern: Option<Regex>,
    },
    Email,
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    /// A single chosen option value (select, radio)
    Choice,
    /// Selected option values (multiSelect, checkbox)
    Selections {
        min: Option<f64>,
        max: Option<f64>,
    },
    Date,
    /// File-like values; their constraints are advisory
    Any,
    /// Numeric, no coercion
    Rating,
    /// Row value -> column value
    Matrix,
    /// Each entry is checked against the sub-field rules
    Entries(Vec<FieldRule>),
    /// Broken configuration; always valid
    Misconfigured(String),
}

/// The compiled acceptance rule for one field
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field_id: String,
    pub kind: RuleKind,
    pub required: bool,
    pub custom_message: Option<String>,
}

impl FieldRule {
    /// Compile one field, collecting configuration problems into `issues`
    pub fn compile(field: &FormField, issues: &mut Vec<CompileIssue>) -> FieldRule {
        let validations = field.validations.clone().unwrap_or_default();
        // A cleared pattern box leaves "" behind
        let pattern = validations.pattern.as_deref().filter(|p| !p.is_empty());

        let kind = match field.field_type {
            FieldType::Text | FieldType::Textarea => match pattern {
                Some(pattern) => match anchored(pattern) {
                    Ok(re) => RuleKind::Text {
                        min_length: validations.min_length,
                        max_length: validations.max_length,
                        pattern: Some(re),
                    },
                    Err(e) => {
                        let issue = CompileIssue::InvalidPattern {
                            field_id: field.id.clone(),
                            pattern: pattern.to_string(),
                            message: e.to_string(),
                        };
                        tracing::warn!(field_id = %field.id, "{}", issue);
                        let reason = issue.to_string();
                        issues.push(issue);
                        RuleKind::Misconfigured(reason)
                    }
                },
                None => RuleKind::Text {
                    min_length: validations.min_length,
                    max_length: validations.max_length,
                    pattern: None,
                },
            },
            FieldType::Email => RuleKind::Email,
            FieldType::Number => RuleKind::Number {
                min: validations.min,
                max: validations.max,
            },
            FieldType::Select | FieldType::Radio => RuleKind::Choice,
            FieldType::MultiSelect | FieldType::Checkbox => RuleKind::Selections {
                min: validations.min,
                max: validations.max,
            },
            FieldType::Date => RuleKind::Date,
            FieldType::File | FieldType::Image | FieldType::Attachment => RuleKind::Any,
            FieldType::Rating => RuleKind::Rating,
            FieldType::Matrix => RuleKind::Matrix,
            FieldType::Repeatable => RuleKind::Entries(
                field
                    .sub_fields()
                    .iter()
                    .map(|sub| FieldRule::compile(sub, issues))
                    .collect(),
            ),
        };

        FieldRule {
            field_id: field.id.clone(),
            kind,
            required: field.required,
            custom_message: validations.custom_message,
        }
    }

    pub fn is_misconfigured(&self) -> bool {
        matches!(self.kind, RuleKind::Misconfigured(_))
    }

    /// Check `value` and record failures under `path` (nested entries use
    /// `path.index.subId`)
    pub fn check_into(&self, path: &str, value: Option<&Value>, errors: &mut BTreeMap<String, String>) {
        if is_empty(value) {
            if self.required && !self.is_misconfigured() {
                errors.insert(path.to_string(), self.message(&Failure::Required));
            }
            return;
        }
        let value = match value {
            Some(v) => v,
            None => return,
        };

        if let RuleKind::Entries(sub_rules) = &self.kind {
            let entries = match value.as_array() {
                Some(entries) => entries,
                None => {
                    errors.insert(path.to_string(), self.message(&Failure::ExpectedEntries));
                    return;
                }
            };
            for (index, entry) in entries.iter().enumerate() {
                let entry_path = format!("{}.{}", path, index);
                match entry.as_object() {
                    Some(entry) => {
                        for rule in sub_rules {
                            let sub_path = format!("{}.{}", entry_path, rule.field_id);
                            rule.check_into(&sub_path, entry.get(&rule.field_id), errors);
                        }
                    }
                    None => {
                        errors.insert(entry_path, self.message(&Failure::ExpectedEntry));
                    }
                }
            }
            return;
        }

        if let Err(failure) = self.check_value(value) {
            errors.insert(path.to_string(), self.message(&failure));
        }
    }

    /// Check a non-empty value against a scalar or container rule
    fn check_value(&self, value: &Value) -> Result<(), Failure> {
        match &self.kind {
            RuleKind::Text { min_length, max_length, pattern } => {
                let text = value.as_str().ok_or(Failure::ExpectedText)?;
                let len = text.chars().count();
                if let Some(min) = *min_length {
                    if len < min {
                        return Err(Failure::TooShort(min));
                    }
                }
                if let Some(max) = *max_length {
                    if len > max {
                        return Err(Failure::TooLong(max));
                    }
                }
                if let Some(re) = pattern {
                    if !re.is_match(text) {
                        return Err(Failure::PatternMismatch);
                    }
                }
                Ok(())
            }
            RuleKind::Email => {
                let text = value.as_str().ok_or(Failure::InvalidEmail)?;
                if is_email(text) {
                    Ok(())
                } else {
                    Err(Failure::InvalidEmail)
                }
            }
            RuleKind::Number { min, max } => {
                let n = coerce_number(value).ok_or(Failure::ExpectedNumber)?;
                if let Some(min) = *min {
                    if n < min {
                        return Err(Failure::BelowMin(min));
                    }
                }
                if let Some(max) = *max {
                    if n > max {
                        return Err(Failure::AboveMax(max));
                    }
                }
                Ok(())
            }
            RuleKind::Choice => value.as_str().map(|_| ()).ok_or(Failure::ExpectedText),
            RuleKind::Selections { min, max } => {
                let items = value.as_array().ok_or(Failure::ExpectedSelections)?;
                if !items.iter().all(Value::is_string) {
                    return Err(Failure::ExpectedSelections);
                }
                let count = items.len() as f64;
                if let Some(min) = *min {
                    if count < min {
                        return Err(Failure::TooFewSelections(min));
                    }
                }
                if let Some(max) = *max {
                    if count > max {
                        return Err(Failure::TooManySelections(max));
                    }
                }
                Ok(())
            }
            RuleKind::Date => value.as_str().map(|_| ()).ok_or(Failure::ExpectedDate),
            RuleKind::Any | RuleKind::Misconfigured(_) => Ok(()),
            RuleKind::Rating => value
                .as_f64()
                .filter(|n| n.is_finite())
                .map(|_| ())
                .ok_or(Failure::ExpectedNumber),
            RuleKind::Matrix => {
                let rows = value.as_object().ok_or(Failure::ExpectedMatrix)?;
                if rows.values().all(Value::is_string) {
                    Ok(())
                } else {
                    Err(Failure::ExpectedMatrix)
                }
            }
            // Handled by check_into
            RuleKind::Entries(_) => Ok(()),
        }
    }

    fn message(&self, failure: &Failure) -> String {
        self.custom_message
            .clone()
            .unwrap_or_else(|| failure.to_string())
    }
}

/// Absent, null, empty text, empty list, or empty object
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

/// The pattern must parse on its own before it is wrapped, or an unbalanced
/// group like `a)|(b` would parse once anchored.
fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)?;
    Regex::new(&format!("^(?:{})$", pattern))
}

fn is_email(text: &str) -> bool {
    !text.starts_with('.') && !text.contains("..") && EMAIL_RE.is_match(text)
}

/// Number input arrives as text; accept numbers and numeric strings
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldValidation;
    use serde_json::json;

    fn rule_for(field_type: FieldType, required: bool, validations: FieldValidation) -> FieldRule {
        let mut field = FormField::new("f", field_type, "F");
        field.required = required;
        field.validations = Some(validations);
        let mut issues = Vec::new();
        let rule = FieldRule::compile(&field, &mut issues);
        assert!(issues.is_empty());
        rule
    }

    fn check(rule: &FieldRule, value: Value) -> Option<String> {
        let mut errors = BTreeMap::new();
        rule.check_into("f", Some(&value), &mut errors);
        errors.remove("f")
    }

    #[test]
    fn test_text_length_and_pattern() {
        let rule = rule_for(
            FieldType::Text,
            true,
            FieldValidation {
                min_length: Some(3),
                max_length: Some(5),
                pattern: Some("[a-z]+".into()),
                ..Default::default()
            },
        );

        assert_eq!(check(&rule, json!("ab")).as_deref(), Some("Must be at least 3 characters"));
        assert_eq!(check(&rule, json!("abcdef")).as_deref(), Some("Must be at most 5 characters"));
        // Pattern must cover the whole string
        assert_eq!(check(&rule, json!("abc1")).as_deref(), Some("Invalid format"));
        assert_eq!(check(&rule, json!("abcd")), None);
    }

    #[test]
    fn test_unbalanced_pattern_is_misconfigured() {
        let mut field = FormField::new("f", FieldType::Text, "F");
        field.validations = Some(FieldValidation {
            pattern: Some("a)|(b".into()),
            ..Default::default()
        });
        let mut issues = Vec::new();
        let rule = FieldRule::compile(&field, &mut issues);

        assert!(rule.is_misconfigured());
        assert!(matches!(
            issues.as_slice(),
            [CompileIssue::InvalidPattern { field_id, pattern, .. }] if field_id == "f" && pattern == "a)|(b"
        ));
    }

    #[test]
    fn test_empty_pattern_is_ignored() {
        let rule = rule_for(
            FieldType::Text,
            false,
            FieldValidation { pattern: Some(String::new()), ..Default::default() },
        );

        assert!(!rule.is_misconfigured());
        assert_eq!(check(&rule, json!("hello")), None);
    }

    #[test]
    fn test_email_shape() {
        let rule = rule_for(FieldType::Email, false, FieldValidation::default());

        assert_eq!(check(&rule, json!("ada@example.com")), None);
        assert_eq!(check(&rule, json!("ada.lovelace+forms@mail.example.org")), None);
        assert_eq!(check(&rule, json!("not-an-email")).as_deref(), Some("Invalid email address"));
        assert!(check(&rule, json!("a..b@example.com")).is_some());
        assert!(check(&rule, json!(".a@example.com")).is_some());
        assert!(check(&rule, json!("a@example")).is_some());
    }

    #[test]
    fn test_number_coerced_from_text() {
        let rule = rule_for(
            FieldType::Number,
            true,
            FieldValidation { min: Some(1.0), max: Some(10.0), ..Default::default() },
        );

        assert_eq!(check(&rule, json!("7")), None);
        assert_eq!(check(&rule, json!(7.5)), None);
        assert_eq!(check(&rule, json!("0")).as_deref(), Some("Must be at least 1"));
        assert_eq!(check(&rule, json!(11)).as_deref(), Some("Must be at most 10"));
        assert_eq!(check(&rule, json!("seven")).as_deref(), Some("Expected a number"));
    }

    #[test]
    fn test_selection_count_bounds() {
        let rule = rule_for(
            FieldType::Checkbox,
            false,
            FieldValidation { min: Some(2.0), max: Some(3.0), ..Default::default() },
        );

        assert_eq!(check(&rule, json!(["a"])).as_deref(), Some("Please select at least 2 options"));
        assert_eq!(check(&rule, json!(["a", "b"])), None);
        assert_eq!(check(&rule, json!(["a", "a", "b", "c"])).as_deref(), Some("Please select at most 3 options"));
        assert_eq!(check(&rule, json!([1, 2])).as_deref(), Some("Expected a list of options"));
    }

    #[test]
    fn test_optional_empty_skips_constraints() {
        let rule = rule_for(
            FieldType::MultiSelect,
            false,
            FieldValidation { min: Some(1.0), ..Default::default() },
        );
        let mut errors = BTreeMap::new();

        rule.check_into("f", None, &mut errors);
        rule.check_into("f", Some(&json!([])), &mut errors);

        assert!(errors.is_empty());
    }

    #[test]
    fn test_custom_message_overrides_every_failure() {
        let rule = rule_for(
            FieldType::Text,
            true,
            FieldValidation {
                min_length: Some(2),
                custom_message: Some("Give us a real name".into()),
                ..Default::default()
            },
        );

        assert_eq!(check(&rule, json!("")).as_deref(), Some("Give us a real name"));
        assert_eq!(check(&rule, json!("a")).as_deref(), Some("Give us a real name"));
        assert_eq!(check(&rule, json!(5)).as_deref(), Some("Give us a real name"));
    }

    #[test]
    fn test_file_constraints_are_advisory() {
        let rule = rule_for(
            FieldType::File,
            true,
            FieldValidation {
                allowed_file_types: Some(vec![".pdf".into()]),
                max_file_size: Some(1),
                ..Default::default()
            },
        );

        assert_eq!(check(&rule, json!({"name": "huge.exe", "size": 999999})), None);
    }

    #[test]
    fn test_matrix_and_rating_shapes() {
        let matrix = rule_for(FieldType::Matrix, true, FieldValidation::default());
        assert_eq!(check(&matrix, json!({"row1": "column2"})), None);
        assert!(check(&matrix, json!({"row1": 3})).is_some());
        assert_eq!(check(&matrix, json!({})).as_deref(), Some("This field is required"));

        let rating = rule_for(FieldType::Rating, true, FieldValidation::default());
        assert_eq!(check(&rating, json!(4)), None);
        assert!(check(&rating, json!("4")).is_some());
    }

    #[test]
    fn test_invalid_pattern_is_misconfigured() {
        let mut field = FormField::new("bad", FieldType::Text, "Bad");
        field.required = true;
        field.validations = Some(FieldValidation {
            pattern: Some("([a-z".into()),
            ..Default::default()
        });

        let mut issues = Vec::new();
        let rule = FieldRule::compile(&field, &mut issues);

        assert!(rule.is_misconfigured());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field_id(), "bad");
        assert_eq!(check(&rule, json!("anything")), None);
        assert_eq!(check(&rule, json!("")), None);
    }
}
