//! Partial updates applied by the store

use serde::{Deserialize, Serialize};

use crate::schema::{Condition, FieldOption, FieldType, FieldValidation, FormField, FormSettings};

/// Keys to overwrite on a field. Present keys replace the existing key
/// wholesale; nested objects are not merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<FieldValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_fields: Option<Vec<FormField>>,
}

impl FieldPatch {
    pub fn label(label: impl Into<String>) -> Self {
        FieldPatch {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn required(required: bool) -> Self {
        FieldPatch {
            required: Some(required),
            ..Default::default()
        }
    }

    /// A patch carrying every key of `field` except its id
    pub fn replacing(field: &FormField) -> Self {
        FieldPatch {
            field_type: Some(field.field_type),
            label: Some(field.label.clone()),
            required: Some(field.required),
            placeholder: field.placeholder.clone(),
            help_text: field.help_text.clone(),
            options: field.options.clone(),
            validations: field.validations.clone(),
            conditions: field.conditions.clone(),
            sub_fields: field.sub_fields.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FieldPatch::default()
    }

    /// Overwrite the present keys on `field`. The id is never touched.
    pub fn apply_to(self, field: &mut FormField) {
        if let Some(field_type) = self.field_type {
            field.field_type = field_type;
        }
        if let Some(label) = self.label {
            field.label = label;
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if self.placeholder.is_some() {
            field.placeholder = self.placeholder;
        }
        if self.help_text.is_some() {
            field.help_text = self.help_text;
        }
        if self.options.is_some() {
            field.options = self.options;
        }
        if self.validations.is_some() {
            field.validations = self.validations;
        }
        if self.conditions.is_some() {
            field.conditions = self.conditions;
        }
        if self.sub_fields.is_some() {
            field.sub_fields = self.sub_fields;
        }
    }
}

/// Settings keys to merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_progress_bar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_page_titles: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_message: Option<String>,
}

impl SettingsPatch {
    pub fn apply_to(self, settings: &mut FormSettings) {
        if let Some(show) = self.show_progress_bar {
            settings.show_progress_bar = show;
        }
        if let Some(show) = self.show_page_titles {
            settings.show_page_titles = show;
        }
        if let Some(message) = self.confirmation_message {
            settings.confirmation_message = message;
        }
    }
}
