//! Default content for newly added fields and options

use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::schema::{FieldOption, FieldType, FieldValidation, FormField};

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// A fresh unique id for a field or option
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn default_label(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Text => "Text Question",
        FieldType::Textarea => "Long Answer Question",
        FieldType::Number => "Number Question",
        FieldType::Email => "Email Address",
        FieldType::Select => "Dropdown Question",
        FieldType::MultiSelect => "Multi-Select Question",
        FieldType::Checkbox => "Checkbox Question",
        FieldType::Radio => "Multiple Choice Question",
        FieldType::Date => "Date Question",
        FieldType::File => "File Upload",
        FieldType::Rating => "Rating Question",
        FieldType::Matrix => "Matrix Question",
        FieldType::Repeatable => "Repeatable Section",
        FieldType::Image | FieldType::Attachment => "New Question",
    }
}

fn default_placeholder(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::File => "",
        _ => "Enter your answer",
    }
}

/// Option value derived from its label: lower-cased, whitespace runs
/// collapsed to `_`
pub fn option_value(label: &str) -> String {
    WHITESPACE_RE.replace_all(&label.to_lowercase(), "_").into_owned()
}

pub fn option(value: String, label: String, is_column: Option<bool>) -> FieldOption {
    FieldOption {
        id: generate_id(),
        value,
        label,
        is_column,
    }
}

pub fn default_options(field_type: FieldType) -> Vec<FieldOption> {
    match field_type {
        FieldType::Select | FieldType::MultiSelect | FieldType::Checkbox | FieldType::Radio => (1..=3)
            .map(|n| option(format!("option{}", n), format!("Option {}", n), None))
            .collect(),
        FieldType::Matrix => {
            let rows = (1..=2).map(|n| option(format!("row{}", n), format!("Row {}", n), Some(false)));
            let columns =
                (1..=3).map(|n| option(format!("column{}", n), format!("Column {}", n), Some(true)));
            rows.chain(columns).collect()
        }
        _ => Vec::new(),
    }
}

/// A top-level field with the defaults for `field_type`
pub fn new_field(field_type: FieldType) -> FormField {
    FormField {
        id: generate_id(),
        field_type,
        label: default_label(field_type).to_string(),
        required: false,
        placeholder: Some(default_placeholder(field_type).to_string()),
        help_text: Some(String::new()),
        options: Some(default_options(field_type)),
        validations: Some(FieldValidation::default()),
        conditions: Some(Vec::new()),
        sub_fields: match field_type {
            FieldType::Repeatable => Some(Vec::new()),
            _ => None,
        },
    }
}

/// A sub-field for a repeatable section that already holds `existing`
pub fn new_sub_field(field_type: FieldType, existing: usize) -> FormField {
    let mut field = new_field(field_type);
    field.label = format!("Sub Field {}", existing + 1);
    field.conditions = None;
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_value_derivation() {
        assert_eq!(option_value("Very Satisfied"), "very_satisfied");
        assert_eq!(option_value("  Two   spaces\there "), "_two_spaces_here_");
        assert_eq!(option_value("ÉCOLE"), "école");
    }

    #[test]
    fn test_default_options_by_type() {
        let radio = default_options(FieldType::Radio);
        assert_eq!(radio.len(), 3);
        assert_eq!(radio[2].value, "option3");
        assert_eq!(radio[2].label, "Option 3");

        let matrix = default_options(FieldType::Matrix);
        assert_eq!(matrix.iter().filter(|o| !o.is_column()).count(), 2);
        assert_eq!(matrix.iter().filter(|o| o.is_column()).count(), 3);

        assert!(default_options(FieldType::Rating).is_empty());
    }

    #[test]
    fn test_new_field_defaults() {
        let field = new_field(FieldType::Repeatable);
        assert_eq!(field.label, "Repeatable Section");
        assert!(!field.required);
        assert_eq!(field.sub_fields.as_ref().map(Vec::len), Some(0));

        let file = new_field(FieldType::File);
        assert_eq!(file.placeholder.as_deref(), Some(""));
        assert!(file.sub_fields.is_none());

        assert_eq!(default_label(FieldType::Image), "New Question");
        assert_ne!(new_field(FieldType::Text).id, new_field(FieldType::Text).id);
    }
}
