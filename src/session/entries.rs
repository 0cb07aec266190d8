//! Repeatable section entries
//!
//! Entry state lives at `values[section][index][subId]`, so edits to
//! different entries never share a key.

use serde_json::{Map, Value};

use super::FormSession;
use crate::schema::{FieldType, FormField};

impl FormSession {
    pub fn entry_count(&self, field_id: &str) -> usize {
        self.values
            .get(field_id)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Whether another entry may be added (below `max`)
    pub fn can_add_entry(&self, field_id: &str) -> bool {
        match self.section(field_id) {
            Some(section) => section
                .validations
                .as_ref()
                .and_then(|v| v.max)
                .map_or(true, |max| (self.entry_count(field_id) as f64) < max),
            None => false,
        }
    }

    /// Whether an entry may be removed (above `min`)
    pub fn can_remove_entry(&self, field_id: &str) -> bool {
        let count = self.entry_count(field_id);
        match self.section(field_id) {
            Some(section) => {
                count > 0
                    && section
                        .validations
                        .as_ref()
                        .and_then(|v| v.min)
                        .map_or(true, |min| (count as f64) > min)
            }
            None => false,
        }
    }

    /// Append an entry with every sub-field set to null. No-op once the
    /// section holds `max` entries; returns whether an entry was added.
    pub fn add_entry(&mut self, field_id: &str) -> bool {
        if !self.can_add_entry(field_id) {
            tracing::debug!(field_id, "entry limit reached");
            return false;
        }
        let entry: Map<String, Value> = match self.section(field_id) {
            Some(section) => section
                .sub_fields()
                .iter()
                .map(|sub| (sub.id.clone(), Value::Null))
                .collect(),
            None => return false,
        };

        match self.entries_mut(field_id) {
            Some(entries) => entries.push(Value::Object(entry)),
            None => return false,
        }
        self.refresh();
        true
    }

    /// Remove the entry at `index`. Refused once the section holds `min`
    /// entries; returns whether an entry was removed.
    pub fn remove_entry(&mut self, field_id: &str, index: usize) -> bool {
        if !self.can_remove_entry(field_id) || index >= self.entry_count(field_id) {
            return false;
        }
        if let Some(entries) = self.entries_mut(field_id) {
            entries.remove(index);
        }
        self.refresh();
        true
    }

    /// Set one sub-field of one entry; returns false if there is no such
    /// entry or sub-field
    pub fn set_entry_value(&mut self, field_id: &str, index: usize, sub_id: &str, value: Value) -> bool {
        let known = self
            .section(field_id)
            .map_or(false, |s| s.sub_fields().iter().any(|sub| sub.id == sub_id));
        if !known || index >= self.entry_count(field_id) {
            return false;
        }

        if let Some(entry) = self.entries_mut(field_id).and_then(|e| e.get_mut(index)) {
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Some(entry) = entry.as_object_mut() {
                entry.insert(sub_id.to_string(), value);
            }
        }
        self.refresh();
        true
    }

    fn section(&self, field_id: &str) -> Option<&FormField> {
        self.schema
            .field(field_id)
            .filter(|f| f.field_type == FieldType::Repeatable)
    }

    /// The section's entry list, replacing a non-list value
    fn entries_mut(&mut self, field_id: &str) -> Option<&mut Vec<Value>> {
        let slot = self
            .values
            .entry(field_id.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        slot.as_array_mut()
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{FieldType, FieldValidation, FormField, FormSchema};
    use crate::session::FormSession;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn section_schema(min: Option<f64>, max: Option<f64>) -> Arc<FormSchema> {
        let mut section = FormField::new("guests", FieldType::Repeatable, "Guests");
        section.sub_fields = Some(vec![
            FormField::new("name", FieldType::Text, "Name"),
            FormField::new("age", FieldType::Number, "Age"),
        ]);
        section.validations = Some(FieldValidation { min, max, ..Default::default() });
        Arc::new(FormSchema { fields: vec![section], ..Default::default() })
    }

    #[test]
    fn test_add_entry_stops_at_max() {
        let mut session = FormSession::new(section_schema(Some(1.0), Some(3.0)));

        assert!(session.add_entry("guests"));
        assert!(session.add_entry("guests"));
        assert!(session.add_entry("guests"));
        assert!(!session.add_entry("guests"));
        assert_eq!(session.entry_count("guests"), 3);

        let first = &session.value("guests").unwrap()[0];
        assert_eq!(first, &json!({"name": null, "age": null}));
    }

    #[test]
    fn test_remove_entry_stops_at_min() {
        let mut session = FormSession::new(section_schema(Some(1.0), Some(3.0)));
        session.add_entry("guests");
        session.add_entry("guests");

        assert!(session.remove_entry("guests", 0));
        assert!(!session.remove_entry("guests", 0));
        assert_eq!(session.entry_count("guests"), 1);
    }

    #[test]
    fn test_unbounded_section() {
        let mut session = FormSession::new(section_schema(None, None));
        for _ in 0..10 {
            assert!(session.add_entry("guests"));
        }
        assert!(!session.remove_entry("guests", 10));
        assert!(session.remove_entry("guests", 9));
        assert!(!session.add_entry("nope"));
    }

    #[test]
    fn test_entry_values_are_scoped_by_index() {
        let mut session = FormSession::new(section_schema(None, None));
        session.add_entry("guests");
        session.add_entry("guests");

        assert!(session.set_entry_value("guests", 0, "name", json!("Ada")));
        assert!(session.set_entry_value("guests", 1, "name", json!("Grace")));
        assert!(!session.set_entry_value("guests", 2, "name", json!("Nobody")));
        assert!(!session.set_entry_value("guests", 0, "email", json!("x")));

        let guests = session.value("guests").unwrap();
        assert_eq!(guests[0]["name"], json!("Ada"));
        assert_eq!(guests[1]["name"], json!("Grace"));
        assert_eq!(guests[1]["age"], Value::Null);
    }
}
