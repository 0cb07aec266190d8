//! formcraft - a schema-driven form engine
//!
//! A [`FormBuilder`] edits one schema held by a [`SchemaStore`]. Each
//! snapshot compiles into a [`ValidationContract`], and a
//! [`VisibilityEvaluator`] decides which fields the current values reveal.
//! [`FormSession`] ties the two together for a live response.

pub mod builder;
pub mod config;
pub mod schema;
pub mod session;
pub mod store;
pub mod validation;
pub mod visibility;

pub use builder::{BuilderError, ConditionPatch, FormBuilder};
pub use schema::{
    Condition, ConditionOperator, FieldOption, FieldType, FieldValidation, FormField, FormSchema,
    FormSettings, FormValues,
};
pub use session::{FormSession, Submission};
pub use store::{FieldPatch, SchemaStore, SettingsPatch, StoreError};
pub use validation::{compile, CompileIssue, ValidationContract, ValidationReport};
pub use visibility::VisibilityEvaluator;
