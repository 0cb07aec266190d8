//! Schema store - owns one schema and applies mutating commands
//!
//! Every command builds the complete next schema, checks its integrity, and
//! only then swaps in a new snapshot. A rejected command leaves the current
//! snapshot untouched. Snapshots are shared as `Arc<FormSchema>` and never
//! mutated after commit.

mod patch;

pub use patch::{FieldPatch, SettingsPatch};

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::schema::{FormField, FormSchema};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    #[error("id '{0}' belonged to a deleted field and cannot be reused")]
    RetiredId(String),

    #[error("reorder payload is not a permutation of the current fields: {0}")]
    NotAPermutation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Holds exactly one schema
#[derive(Debug, Clone)]
pub struct SchemaStore {
    current: Arc<FormSchema>,
    /// Ids removed during this schema's lifetime
    retired: HashSet<String>,
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaStore {
    /// A store holding the default schema
    pub fn new() -> Self {
        SchemaStore {
            current: Arc::new(FormSchema::default()),
            retired: HashSet::new(),
        }
    }

    /// A store holding `schema`, checked as an import
    pub fn with_schema(schema: FormSchema) -> StoreResult<Self> {
        let mut store = Self::new();
        store.import_schema(schema)?;
        Ok(store)
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<FormSchema> {
        Arc::clone(&self.current)
    }

    pub fn schema(&self) -> &FormSchema {
        &self.current
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let mut next = self.next();
        next.title = title.into();
        self.swap(next);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let mut next = self.next();
        next.description = description.into();
        self.swap(next);
    }

    /// Append a field
    pub fn add_field(&mut self, field: FormField) -> StoreResult<()> {
        let id = field.id.clone();
        let mut next = self.next();
        next.fields.push(field);
        self.commit(next)?;
        tracing::debug!(field_id = %id, "field added");
        Ok(())
    }

    /// Overwrite the keys present in `patch` on field `id`
    pub fn update_field(&mut self, id: &str, patch: FieldPatch) -> StoreResult<()> {
        let mut next = self.next();
        let field = next
            .fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| self.reject(StoreError::UnknownField(id.to_string())))?;
        patch.apply_to(field);
        self.commit(next)?;
        tracing::debug!(field_id = %id, "field updated");
        Ok(())
    }

    /// Remove field `id`. Conditions elsewhere that reference it are left
    /// dangling.
    pub fn remove_field(&mut self, id: &str) -> StoreResult<()> {
        let mut next = self.next();
        let before = next.fields.len();
        next.fields.retain(|f| f.id != id);
        if next.fields.len() == before {
            return Err(self.reject(StoreError::UnknownField(id.to_string())));
        }
        self.commit(next)?;
        tracing::debug!(field_id = %id, "field removed");
        Ok(())
    }

    /// Replace the field list with a reordering of itself
    pub fn reorder_fields(&mut self, fields: Vec<FormField>) -> StoreResult<()> {
        let current: Vec<&str> = self.current.field_ids();
        let proposed: Vec<&str> = fields.iter().map(|f| f.id.as_str()).collect();

        if current.len() != proposed.len() {
            return Err(self.reject(StoreError::NotAPermutation(format!(
                "expected {} fields, got {}",
                current.len(),
                proposed.len()
            ))));
        }

        let current_set: HashSet<&str> = current.iter().copied().collect();
        let mut seen = HashSet::new();
        for id in &proposed {
            if !current_set.contains(id) {
                return Err(self.reject(StoreError::NotAPermutation(format!("unknown field '{}'", id))));
            }
            if !seen.insert(*id) {
                return Err(self.reject(StoreError::NotAPermutation(format!("field '{}' listed twice", id))));
            }
        }

        let mut next = self.next();
        next.fields = fields;
        self.commit(next)?;
        tracing::debug!("fields reordered");
        Ok(())
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        let mut next = self.next();
        patch.apply_to(&mut next.settings);
        self.swap(next);
    }

    /// Back to the default schema; starts a new id lifetime
    pub fn reset(&mut self) {
        self.retired.clear();
        self.current = Arc::new(FormSchema::default());
        tracing::debug!("schema reset");
    }

    /// Replace the whole schema; starts a new id lifetime
    pub fn import_schema(&mut self, schema: FormSchema) -> StoreResult<()> {
        if let Some(id) = schema.first_duplicate_id() {
            return Err(self.reject(StoreError::DuplicateId(id)));
        }
        self.retired.clear();
        let count = schema.fields.len();
        self.current = Arc::new(schema);
        tracing::debug!(fields = count, "schema imported");
        Ok(())
    }

    fn next(&self) -> FormSchema {
        FormSchema::clone(&self.current)
    }

    fn reject(&self, err: StoreError) -> StoreError {
        tracing::warn!(error = %err, "store command rejected");
        err
    }

    /// Swap in a snapshot that cannot change any id
    fn swap(&mut self, next: FormSchema) {
        self.current = Arc::new(next);
    }

    /// Check ids of `next` and swap it in, retiring any id it dropped
    fn commit(&mut self, next: FormSchema) -> StoreResult<()> {
        if let Some(id) = next.first_duplicate_id() {
            return Err(self.reject(StoreError::DuplicateId(id)));
        }

        let next_ids: HashSet<String> = next.all_field_ids().into_iter().map(String::from).collect();
        if let Some(id) = next_ids.iter().find(|id| self.retired.contains(*id)) {
            return Err(self.reject(StoreError::RetiredId(id.clone())));
        }

        let dropped: Vec<String> = self
            .current
            .all_field_ids()
            .into_iter()
            .filter(|id| !next_ids.contains(*id))
            .map(String::from)
            .collect();
        self.retired.extend(dropped);

        self.current = Arc::new(next);
        Ok(())
    }
}
