//! Schema type definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Live field values keyed by field id
pub type FormValues = serde_json::Map<String, Value>;

/// The complete form definition, also the export format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Ordered, user-controlled
    #[serde(default)]
    pub fields: Vec<FormField>,

    #[serde(default)]
    pub settings: FormSettings,
}

impl Default for FormSchema {
    fn default() -> Self {
        FormSchema {
            title: "Untitled Form".to_string(),
            description: "Form description".to_string(),
            fields: Vec::new(),
            settings: FormSettings::default(),
        }
    }
}

impl FormSchema {
    /// Look up a top-level field
    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Look up a field anywhere in the schema, including sub-fields
    pub fn find_field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find_map(|f| {
            if f.id == id {
                Some(f)
            } else {
                f.sub_fields().iter().find(|s| s.id == id)
            }
        })
    }

    /// The top-level field owning `id` (the field itself, or the repeatable holding it)
    pub fn owner_of(&self, id: &str) -> Option<&FormField> {
        self.fields
            .iter()
            .find(|f| f.id == id || f.sub_fields().iter().any(|s| s.id == id))
    }

    /// Top-level ids, in order
    pub fn field_ids(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.id.as_str()).collect()
    }

    /// Every field id in the schema, sub-fields included
    pub fn all_field_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for field in &self.fields {
            ids.push(field.id.as_str());
            ids.extend(field.sub_fields().iter().map(|s| s.id.as_str()));
        }
        ids
    }

    /// First field id that appears more than once, or an option id
    /// repeated within its owning field
    pub fn first_duplicate_id(&self) -> Option<String> {
        let mut seen = HashSet::new();
        for id in self.all_field_ids() {
            if !seen.insert(id) {
                return Some(id.to_string());
            }
        }

        let mut fields: Vec<&FormField> = self.fields.iter().collect();
        fields.extend(self.fields.iter().flat_map(|f| f.sub_fields()));
        for field in fields {
            let mut options = HashSet::new();
            for option in field.options() {
                if !options.insert(option.id.as_str()) {
                    return Some(format!("{}/{}", field.id, option.id));
                }
            }
        }
        None
    }
}

/// Form-level presentation flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSettings {
    pub show_progress_bar: bool,
    pub show_page_titles: bool,
    pub confirmation_message: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        FormSettings {
            show_progress_bar: true,
            show_page_titles: true,
            confirmation_message: "Thank you for your submission!".to_string(),
        }
    }
}

/// One question within a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    pub label: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,

    /// Choice and matrix types only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<FieldValidation>,

    /// All must hold (logical AND)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,

    /// Repeatable sections only, one level deep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_fields: Option<Vec<FormField>>,
}

impl FormField {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        FormField {
            id: id.into(),
            field_type,
            label: label.into(),
            required: false,
            placeholder: None,
            help_text: None,
            options: None,
            validations: None,
            conditions: None,
            sub_fields: None,
        }
    }

    pub fn options(&self) -> &[FieldOption] {
        self.options.as_deref().unwrap_or_default()
    }

    pub fn conditions(&self) -> &[Condition] {
        self.conditions.as_deref().unwrap_or_default()
    }

    pub fn sub_fields(&self) -> &[FormField] {
        self.sub_fields.as_deref().unwrap_or_default()
    }

    pub fn custom_message(&self) -> Option<&str> {
        self.validations
            .as_ref()
            .and_then(|v| v.custom_message.as_deref())
    }

    /// Matrix rows: options without the column flag
    pub fn matrix_rows(&self) -> Vec<&FieldOption> {
        self.options().iter().filter(|o| !o.is_column()).collect()
    }

    /// Matrix columns: options with the column flag
    pub fn matrix_columns(&self) -> Vec<&FieldOption> {
        self.options().iter().filter(|o| o.is_column()).collect()
    }
}

/// One selectable option (or a matrix row/column)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    pub id: String,
    pub value: String,
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_column: Option<bool>,
}

impl FieldOption {
    pub fn is_column(&self) -> bool {
        self.is_column.unwrap_or(false)
    }
}

/// Optional constraint bag for a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    /// Numeric bound, or selection-count bound for multi-choice types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Advisory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_file_types: Option<Vec<String>>,

    /// Advisory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,

    /// Advisory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<u64>,

    /// Replaces every generated message for the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

impl FieldValidation {
    /// Merge `patch` into `self` one level deep: present keys overwrite,
    /// absent keys are kept
    pub fn merge(&mut self, patch: FieldValidation) {
        let FieldValidation {
            min,
            max,
            min_length,
            max_length,
            pattern,
            allowed_file_types,
            max_file_size,
            max_files,
            custom_message,
        } = patch;

        if min.is_some() {
            self.min = min;
        }
        if max.is_some() {
            self.max = max;
        }
        if min_length.is_some() {
            self.min_length = min_length;
        }
        if max_length.is_some() {
            self.max_length = max_length;
        }
        if pattern.is_some() {
            self.pattern = pattern;
        }
        if allowed_file_types.is_some() {
            self.allowed_file_types = allowed_file_types;
        }
        if max_file_size.is_some() {
            self.max_file_size = max_file_size;
        }
        if max_files.is_some() {
            self.max_files = max_files;
        }
        if custom_message.is_some() {
            self.custom_message = custom_message;
        }
    }
}

/// A single comparison gating a field's visibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub source_field_id: String,
    pub operator: ConditionOperator,

    /// Ignored for isEmpty/isNotEmpty
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl Condition {
    pub fn new(source_field_id: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Condition {
            source_field_id: source_field_id.into(),
            operator,
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl ConditionOperator {
    /// Whether the condition's right-hand value participates
    pub fn uses_value(&self) -> bool {
        !matches!(self, ConditionOperator::IsEmpty | ConditionOperator::IsNotEmpty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "notEquals",
            ConditionOperator::Contains => "contains",
            ConditionOperator::NotContains => "notContains",
            ConditionOperator::GreaterThan => "greaterThan",
            ConditionOperator::LessThan => "lessThan",
            ConditionOperator::IsEmpty => "isEmpty",
            ConditionOperator::IsNotEmpty => "isNotEmpty",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field types supported by the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Email,
    Select,
    MultiSelect,
    Checkbox,
    Radio,
    Date,
    File,
    Image,
    Attachment,
    Rating,
    Matrix,
    Repeatable,
}

impl FieldType {
    pub const ALL: [FieldType; 15] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Number,
        FieldType::Email,
        FieldType::Select,
        FieldType::MultiSelect,
        FieldType::Checkbox,
        FieldType::Radio,
        FieldType::Date,
        FieldType::File,
        FieldType::Image,
        FieldType::Attachment,
        FieldType::Rating,
        FieldType::Matrix,
        FieldType::Repeatable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Email => "email",
            FieldType::Select => "select",
            FieldType::MultiSelect => "multiSelect",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Image => "image",
            FieldType::Attachment => "attachment",
            FieldType::Rating => "rating",
            FieldType::Matrix => "matrix",
            FieldType::Repeatable => "repeatable",
        }
    }

    /// Types whose options are a flat choice list
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::MultiSelect | FieldType::Checkbox | FieldType::Radio
        )
    }

    pub fn is_file_like(&self) -> bool {
        matches!(self, FieldType::File | FieldType::Image | FieldType::Attachment)
    }

    /// Operators a builder offers when this type is a condition source
    pub fn supported_operators(&self) -> &'static [ConditionOperator] {
        use ConditionOperator::*;
        match self {
            FieldType::Text | FieldType::Textarea | FieldType::Email => {
                &[Equals, NotEquals, Contains, NotContains, IsEmpty, IsNotEmpty]
            }
            FieldType::Number => &[Equals, NotEquals, GreaterThan, LessThan, IsEmpty, IsNotEmpty],
            FieldType::Select | FieldType::Radio | FieldType::Date => {
                &[Equals, NotEquals, IsEmpty, IsNotEmpty]
            }
            FieldType::MultiSelect | FieldType::Checkbox => {
                &[Contains, NotContains, IsEmpty, IsNotEmpty]
            }
            FieldType::File | FieldType::Matrix | FieldType::Repeatable => &[IsEmpty, IsNotEmpty],
            FieldType::Rating => &[Equals, NotEquals, GreaterThan, LessThan],
            FieldType::Image | FieldType::Attachment => &[Equals, NotEquals],
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field type '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_wire_names() {
        let value = serde_json::to_value(FieldType::MultiSelect).unwrap();
        assert_eq!(value, json!("multiSelect"));

        let parsed: FieldType = serde_json::from_value(json!("textarea")).unwrap();
        assert_eq!(parsed, FieldType::Textarea);
        assert_eq!("multiselect".parse::<FieldType>().unwrap(), FieldType::MultiSelect);
        assert!("slider".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_parse_field_json() {
        let field: FormField = serde_json::from_value(json!({
            "id": "q2",
            "type": "text",
            "label": "Why?",
            "required": true,
            "conditions": [
                {"sourceFieldId": "q1", "operator": "equals", "value": "yes"},
                {"sourceFieldId": "q3", "operator": "isNotEmpty"}
            ]
        }))
        .unwrap();

        assert_eq!(field.field_type, FieldType::Text);
        assert_eq!(field.conditions().len(), 2);
        assert_eq!(field.conditions()[1].value, Value::Null);
        assert!(field.options().is_empty());
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let schema: FormSchema = serde_json::from_value(json!({
            "title": "Survey",
            "settings": {"showProgressBar": false}
        }))
        .unwrap();

        assert!(!schema.settings.show_progress_bar);
        assert!(schema.settings.show_page_titles);
        assert_eq!(schema.settings.confirmation_message, "Thank you for your submission!");
    }

    #[test]
    fn test_matrix_partitions() {
        let mut field = FormField::new("m", FieldType::Matrix, "Grid");
        field.options = Some(vec![
            FieldOption { id: "r1".into(), value: "row1".into(), label: "Row 1".into(), is_column: None },
            FieldOption { id: "c1".into(), value: "column1".into(), label: "Column 1".into(), is_column: Some(true) },
            FieldOption { id: "r2".into(), value: "row2".into(), label: "Row 2".into(), is_column: Some(false) },
        ]);

        assert_eq!(field.matrix_rows().len(), 2);
        assert_eq!(field.matrix_columns().len(), 1);
    }

    #[test]
    fn test_duplicate_ids_include_sub_fields() {
        let mut repeat = FormField::new("r", FieldType::Repeatable, "Items");
        repeat.sub_fields = Some(vec![FormField::new("q1", FieldType::Text, "Name")]);

        let schema = FormSchema {
            fields: vec![FormField::new("q1", FieldType::Text, "Name"), repeat],
            ..Default::default()
        };

        assert_eq!(schema.first_duplicate_id(), Some("q1".to_string()));
        assert_eq!(schema.owner_of("q1").map(|f| f.id.as_str()), Some("q1"));
    }

    #[test]
    fn test_validation_merge_keeps_unmentioned_keys() {
        let mut validation = FieldValidation {
            min_length: Some(2),
            custom_message: Some("Too short".into()),
            ..Default::default()
        };
        validation.merge(FieldValidation {
            max_length: Some(10),
            ..Default::default()
        });

        assert_eq!(validation.min_length, Some(2));
        assert_eq!(validation.max_length, Some(10));
        assert_eq!(validation.custom_message.as_deref(), Some("Too short"));
    }
}
