//! Visibility evaluator - which fields are shown for the current values
//!
//! Recomputed from scratch on every value change. A field with no
//! conditions is always visible; otherwise every condition must hold. A
//! condition whose source is missing, is a sub-field, or is the field
//! itself never holds.

pub mod predicates;

use std::collections::BTreeSet;

use crate::schema::{Condition, FormField, FormSchema, FormValues};

/// A condition whose source does not resolve to a top-level field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingCondition {
    pub field_id: String,
    pub index: usize,
    pub source_field_id: String,
}

pub struct VisibilityEvaluator<'a> {
    schema: &'a FormSchema,
}

impl<'a> VisibilityEvaluator<'a> {
    pub fn new(schema: &'a FormSchema) -> Self {
        VisibilityEvaluator { schema }
    }

    /// Ids of the top-level fields that are currently visible
    pub fn compute_visible_set(&self, values: &FormValues) -> BTreeSet<String> {
        self.schema
            .fields
            .iter()
            .filter(|field| self.field_visible(field, values))
            .map(|field| field.id.clone())
            .collect()
    }

    /// Whether `field_id` is visible. Sub-fields follow their section;
    /// unknown ids are not visible.
    pub fn is_visible(&self, field_id: &str, values: &FormValues) -> bool {
        self.schema
            .owner_of(field_id)
            .map_or(false, |owner| self.field_visible(owner, values))
    }

    /// Conditions that can never hold because their source is unresolved
    pub fn dangling_conditions(&self) -> Vec<DanglingCondition> {
        let mut dangling = Vec::new();
        for field in &self.schema.fields {
            for (index, condition) in field.conditions().iter().enumerate() {
                if self.schema.field(&condition.source_field_id).is_none() {
                    dangling.push(DanglingCondition {
                        field_id: field.id.clone(),
                        index,
                        source_field_id: condition.source_field_id.clone(),
                    });
                }
            }
        }
        dangling
    }

    fn field_visible(&self, field: &FormField, values: &FormValues) -> bool {
        field
            .conditions()
            .iter()
            .all(|condition| self.condition_holds(field, condition, values))
    }

    fn condition_holds(&self, field: &FormField, condition: &Condition, values: &FormValues) -> bool {
        if condition.source_field_id == field.id {
            return false;
        }
        if self.schema.field(&condition.source_field_id).is_none() {
            return false;
        }
        predicates::evaluate(
            condition.operator,
            values.get(&condition.source_field_id),
            &condition.value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConditionOperator, FieldType};
    use serde_json::{json, Value};

    fn values(value: Value) -> FormValues {
        value.as_object().cloned().unwrap()
    }

    fn with_conditions(id: &str, conditions: Vec<Condition>) -> FormField {
        let mut field = FormField::new(id, FieldType::Text, id);
        field.conditions = Some(conditions);
        field
    }

    fn ids(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_all_conditions_must_hold() {
        let schema = FormSchema {
            fields: vec![
                FormField::new("A", FieldType::Radio, "A"),
                FormField::new("B", FieldType::Text, "B"),
                with_conditions(
                    "C",
                    vec![
                        Condition::new("A", ConditionOperator::Equals, json!("yes")),
                        Condition::new("B", ConditionOperator::IsNotEmpty, Value::Null),
                    ],
                ),
            ],
            ..Default::default()
        };
        let evaluator = VisibilityEvaluator::new(&schema);

        assert!(evaluator.is_visible("C", &values(json!({"A": "yes", "B": "x"}))));
        assert!(!evaluator.is_visible("C", &values(json!({"A": "no", "B": "x"}))));
        assert!(!evaluator.is_visible("C", &values(json!({"A": "yes", "B": ""}))));
        assert!(!evaluator.is_visible("C", &values(json!({}))));
    }

    #[test]
    fn test_dangling_source_keeps_field_hidden() {
        let schema = FormSchema {
            fields: vec![with_conditions(
                "B",
                vec![Condition::new("A", ConditionOperator::IsEmpty, Value::Null)],
            )],
            ..Default::default()
        };
        let evaluator = VisibilityEvaluator::new(&schema);

        // isEmpty would hold for an absent value; the dangling source wins
        assert!(evaluator.compute_visible_set(&FormValues::new()).is_empty());
        assert_eq!(evaluator.dangling_conditions().len(), 1);
    }

    #[test]
    fn test_self_reference_never_holds() {
        let schema = FormSchema {
            fields: vec![with_conditions(
                "A",
                vec![Condition::new("A", ConditionOperator::IsEmpty, Value::Null)],
            )],
            ..Default::default()
        };
        let evaluator = VisibilityEvaluator::new(&schema);

        assert!(!evaluator.is_visible("A", &FormValues::new()));
    }

    #[test]
    fn test_sub_field_sources_are_unresolved() {
        let mut repeat = FormField::new("r", FieldType::Repeatable, "Items");
        repeat.sub_fields = Some(vec![FormField::new("s", FieldType::Text, "S")]);
        let schema = FormSchema {
            fields: vec![
                repeat,
                with_conditions("q", vec![Condition::new("s", ConditionOperator::IsEmpty, Value::Null)]),
            ],
            ..Default::default()
        };
        let evaluator = VisibilityEvaluator::new(&schema);

        let visible = evaluator.compute_visible_set(&FormValues::new());
        assert_eq!(ids(&visible), vec!["r"]);
        // Sub-fields follow their section
        assert!(evaluator.is_visible("s", &FormValues::new()));
        assert!(!evaluator.is_visible("missing", &FormValues::new()));
    }

    #[test]
    fn test_radio_gates_follow_up() {
        let schema = FormSchema {
            fields: vec![
                FormField::new("q1", FieldType::Radio, "Attending?"),
                with_conditions("q2", vec![Condition::new("q1", ConditionOperator::Equals, json!("yes"))]),
            ],
            ..Default::default()
        };
        let evaluator = VisibilityEvaluator::new(&schema);

        let visible = evaluator.compute_visible_set(&values(json!({"q1": "no"})));
        assert_eq!(ids(&visible), vec!["q1"]);

        let visible = evaluator.compute_visible_set(&values(json!({"q1": "yes"})));
        assert_eq!(ids(&visible), vec!["q1", "q2"]);
    }
}
