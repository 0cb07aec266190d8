//! Validation compiler - turns a schema into a validation contract

mod contract;
mod rules;

pub use contract::{ValidationContract, ValidationReport};
pub use rules::{is_empty, Failure, FieldRule, RuleKind};

use thiserror::Error;

use crate::schema::FormSchema;

/// A configuration problem found while compiling a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileIssue {
    /// The field's rule is replaced with an always-valid one
    #[error("field '{field_id}': invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        field_id: String,
        pattern: String,
        message: String,
    },

    /// The condition can never hold
    #[error("field '{field_id}': condition {index} uses the field as its own source")]
    SelfReference { field_id: String, index: usize },
}

impl CompileIssue {
    pub fn field_id(&self) -> &str {
        match self {
            CompileIssue::InvalidPattern { field_id, .. } => field_id,
            CompileIssue::SelfReference { field_id, .. } => field_id,
        }
    }
}

/// Build one rule per top-level field
pub fn compile(schema: &FormSchema) -> ValidationContract {
    let mut issues = Vec::new();
    let mut rules = Vec::with_capacity(schema.fields.len());

    for field in &schema.fields {
        rules.push(FieldRule::compile(field, &mut issues));

        for (index, condition) in field.conditions().iter().enumerate() {
            if condition.source_field_id == field.id {
                issues.push(CompileIssue::SelfReference {
                    field_id: field.id.clone(),
                    index,
                });
            }
        }
    }

    if !issues.is_empty() {
        tracing::warn!(count = issues.len(), "schema compiled with issues");
    }

    ValidationContract::new(rules, issues)
}
