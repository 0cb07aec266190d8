//! Builder mutation API - field-type-aware conveniences over the store

pub mod defaults;
mod options;

use serde_json::Value;
use thiserror::Error;

use crate::schema::{Condition, ConditionOperator, FieldType, FieldValidation, FormField, FormSchema};
use crate::store::{FieldPatch, SchemaStore, StoreError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("field '{field_id}' has no option '{option_id}'")]
    UnknownOption { field_id: String, option_id: String },

    #[error("field '{0}' is not a top-level repeatable section")]
    NotRepeatable(String),

    #[error("sections cannot be nested inside repeatable sections")]
    NestedRepeatable,

    #[error("field '{0}' is not a matrix")]
    NotMatrix(String),

    #[error("field '{0}' is not a top-level field")]
    NotTopLevel(String),

    #[error("field '{0}' cannot use itself as a condition source")]
    SelfReference(String),

    #[error("field '{field_id}': condition source '{source_field_id}' is not a top-level field")]
    UnknownConditionSource { field_id: String, source_field_id: String },

    #[error("field '{field_id}' has no condition at index {index}")]
    UnknownCondition { field_id: String, index: usize },
}

pub type BuilderResult<T> = Result<T, BuilderError>;

/// Keys to overwrite on one condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionPatch {
    pub source_field_id: Option<String>,
    pub operator: Option<ConditionOperator>,
    pub value: Option<Value>,
}

/// Owns the store and layers the builder operations over its commands
#[derive(Debug, Default)]
pub struct FormBuilder {
    store: SchemaStore,
}

impl FormBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_store(store: SchemaStore) -> Self {
        FormBuilder { store }
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Direct access to the store commands (title, settings, import, ...)
    pub fn store_mut(&mut self) -> &mut SchemaStore {
        &mut self.store
    }

    pub fn into_store(self) -> SchemaStore {
        self.store
    }

    pub fn schema(&self) -> &FormSchema {
        self.store.schema()
    }

    /// Append a field of `field_type` with its defaults; returns the new id
    pub fn add_field(&mut self, field_type: FieldType) -> BuilderResult<String> {
        let field = defaults::new_field(field_type);
        let id = field.id.clone();
        self.store.add_field(field)?;
        Ok(id)
    }

    pub fn update_field(&mut self, field_id: &str, patch: FieldPatch) -> BuilderResult<()> {
        self.store.update_field(field_id, patch)?;
        Ok(())
    }

    pub fn remove_field(&mut self, field_id: &str) -> BuilderResult<()> {
        self.store.remove_field(field_id)?;
        Ok(())
    }

    /// Move a top-level field to `index` (clamped to the end)
    pub fn move_field(&mut self, field_id: &str, index: usize) -> BuilderResult<()> {
        let mut fields = self.schema().fields.clone();
        let from = fields
            .iter()
            .position(|f| f.id == field_id)
            .ok_or_else(|| BuilderError::UnknownField(field_id.to_string()))?;
        let field = fields.remove(from);
        let to = index.min(fields.len());
        fields.insert(to, field);
        self.store.reorder_fields(fields)?;
        Ok(())
    }

    /// Merge `patch` into the field's validations one level deep
    pub fn update_validations(&mut self, field_id: &str, patch: FieldValidation) -> BuilderResult<()> {
        self.edit_field(field_id, |field| {
            field.validations.get_or_insert_with(FieldValidation::default).merge(patch);
            Ok(())
        })
    }

    /// Append a sub-field to a repeatable section; returns the new id
    pub fn add_sub_field(&mut self, parent_id: &str, field_type: FieldType) -> BuilderResult<String> {
        if field_type == FieldType::Repeatable {
            return Err(BuilderError::NestedRepeatable);
        }
        let parent = self.repeatable(parent_id)?;
        let sub_field = defaults::new_sub_field(field_type, parent.sub_fields().len());
        let id = sub_field.id.clone();

        let mut sub_fields = parent.sub_fields().to_vec();
        sub_fields.push(sub_field);
        self.store.update_field(
            parent_id,
            FieldPatch {
                sub_fields: Some(sub_fields),
                ..Default::default()
            },
        )?;
        Ok(id)
    }

    /// Overwrite keys on a sub-field. Sub-fields never carry conditions or
    /// nested sections, so those keys are dropped.
    pub fn update_sub_field(&mut self, parent_id: &str, sub_id: &str, mut patch: FieldPatch) -> BuilderResult<()> {
        if patch.field_type == Some(FieldType::Repeatable) {
            return Err(BuilderError::NestedRepeatable);
        }
        patch.conditions = None;
        patch.sub_fields = None;

        let mut sub_fields = self.repeatable(parent_id)?.sub_fields().to_vec();
        let sub_field = sub_fields
            .iter_mut()
            .find(|s| s.id == sub_id)
            .ok_or_else(|| BuilderError::UnknownField(sub_id.to_string()))?;
        patch.apply_to(sub_field);

        self.store.update_field(
            parent_id,
            FieldPatch {
                sub_fields: Some(sub_fields),
                ..Default::default()
            },
        )?;
        Ok(())
    }

    pub fn remove_sub_field(&mut self, parent_id: &str, sub_id: &str) -> BuilderResult<()> {
        let mut sub_fields = self.repeatable(parent_id)?.sub_fields().to_vec();
        let before = sub_fields.len();
        sub_fields.retain(|s| s.id != sub_id);
        if sub_fields.len() == before {
            return Err(BuilderError::UnknownField(sub_id.to_string()));
        }

        self.store.update_field(
            parent_id,
            FieldPatch {
                sub_fields: Some(sub_fields),
                ..Default::default()
            },
        )?;
        Ok(())
    }

    /// Append a condition to a top-level field; returns its index
    pub fn add_condition(&mut self, field_id: &str, condition: Condition) -> BuilderResult<usize> {
        self.check_condition(field_id, &condition)?;
        let mut conditions = self.top_level(field_id)?.conditions().to_vec();
        conditions.push(condition);
        let index = conditions.len() - 1;
        self.set_conditions(field_id, conditions)?;
        Ok(index)
    }

    pub fn update_condition(&mut self, field_id: &str, index: usize, patch: ConditionPatch) -> BuilderResult<()> {
        let mut conditions = self.top_level(field_id)?.conditions().to_vec();
        let condition = conditions.get_mut(index).ok_or_else(|| BuilderError::UnknownCondition {
            field_id: field_id.to_string(),
            index,
        })?;
        if let Some(source) = patch.source_field_id {
            condition.source_field_id = source;
        }
        if let Some(operator) = patch.operator {
            condition.operator = operator;
        }
        if let Some(value) = patch.value {
            condition.value = value;
        }

        let updated = condition.clone();
        self.check_condition(field_id, &updated)?;
        self.set_conditions(field_id, conditions)
    }

    pub fn remove_condition(&mut self, field_id: &str, index: usize) -> BuilderResult<()> {
        let mut conditions = self.top_level(field_id)?.conditions().to_vec();
        if index >= conditions.len() {
            return Err(BuilderError::UnknownCondition {
                field_id: field_id.to_string(),
                index,
            });
        }
        conditions.remove(index);
        self.set_conditions(field_id, conditions)
    }

    fn set_conditions(&mut self, field_id: &str, conditions: Vec<Condition>) -> BuilderResult<()> {
        self.store.update_field(
            field_id,
            FieldPatch {
                conditions: Some(conditions),
                ..Default::default()
            },
        )?;
        Ok(())
    }

    fn check_condition(&self, field_id: &str, condition: &Condition) -> BuilderResult<()> {
        self.top_level(field_id)?;
        if condition.source_field_id == field_id {
            return Err(BuilderError::SelfReference(field_id.to_string()));
        }
        let source = self
            .schema()
            .field(&condition.source_field_id)
            .ok_or_else(|| BuilderError::UnknownConditionSource {
                field_id: field_id.to_string(),
                source_field_id: condition.source_field_id.clone(),
            })?;

        if !source.field_type.supported_operators().contains(&condition.operator) {
            tracing::warn!(
                field_id,
                source_field_id = %source.id,
                operator = %condition.operator,
                "operator is not offered for a {} source",
                source.field_type
            );
        }
        Ok(())
    }

    fn top_level(&self, field_id: &str) -> BuilderResult<&FormField> {
        match self.schema().field(field_id) {
            Some(field) => Ok(field),
            None if self.schema().find_field(field_id).is_some() => {
                Err(BuilderError::NotTopLevel(field_id.to_string()))
            }
            None => Err(BuilderError::UnknownField(field_id.to_string())),
        }
    }

    fn repeatable(&self, field_id: &str) -> BuilderResult<&FormField> {
        let field = self.top_level(field_id)?;
        if field.field_type != FieldType::Repeatable {
            return Err(BuilderError::NotRepeatable(field_id.to_string()));
        }
        Ok(field)
    }

    /// Apply `edit` to a field anywhere in the schema and commit it through
    /// its top-level owner
    fn edit_field<F>(&mut self, field_id: &str, edit: F) -> BuilderResult<()>
    where
        F: FnOnce(&mut FormField) -> BuilderResult<()>,
    {
        let mut owner = self
            .schema()
            .owner_of(field_id)
            .cloned()
            .ok_or_else(|| BuilderError::UnknownField(field_id.to_string()))?;

        if owner.id == field_id {
            edit(&mut owner)?;
        } else {
            let sub_field = owner
                .sub_fields
                .iter_mut()
                .flatten()
                .find(|s| s.id == field_id)
                .ok_or_else(|| BuilderError::UnknownField(field_id.to_string()))?;
            edit(sub_field)?;
        }

        let owner_id = owner.id.clone();
        self.store.update_field(&owner_id, FieldPatch::replacing(&owner))?;
        Ok(())
    }
}
