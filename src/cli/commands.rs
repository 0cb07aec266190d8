//! CLI command implementations

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use formcraft::config::Config;
use formcraft::schema::{load_schema, load_values, save_schema, FieldType, FormSchema};
use formcraft::store::FieldPatch;
use formcraft::visibility::VisibilityEvaluator;
use formcraft::{compile, FormBuilder, FormSession, SchemaStore};

/// Load a schema file through the store's import checks
fn open_builder(schema_path: &Path) -> Result<FormBuilder> {
    let schema = load_schema(schema_path)?;
    let store = SchemaStore::with_schema(schema)
        .with_context(|| format!("Invalid schema: {}", schema_path.display()))?;
    Ok(FormBuilder::from_store(store))
}

/// Create a new schema file named after its title
pub fn init(config: &Config, title: &str, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir
        .or_else(|| config.schema_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let path = dir.join(format!("{}.json", slug::slugify(title)));
    if path.exists() {
        bail!("File already exists: {}", path.display());
    }

    let mut store = SchemaStore::new();
    store.set_title(title);
    save_schema(&path, store.schema(), config.compact)?;

    println!("✓ Created {}", path.display());
    Ok(())
}

/// Print a summary of a schema
pub fn show(schema_path: &Path) -> Result<()> {
    let builder = open_builder(schema_path)?;
    let schema = builder.schema();

    println!("{}", schema.title);
    if !schema.description.is_empty() {
        println!("{}", schema.description);
    }
    println!();

    if schema.fields.is_empty() {
        println!("No fields yet.");
        return Ok(());
    }

    for field in &schema.fields {
        let marker = if field.required { "*" } else { " " };
        println!("{} {} [{}] {}", marker, field.id, field.field_type, field.label);
        for condition in field.conditions() {
            if condition.operator.uses_value() {
                println!("    when {} {} {}", condition.source_field_id, condition.operator, condition.value);
            } else {
                println!("    when {} {}", condition.source_field_id, condition.operator);
            }
        }
        for sub in field.sub_fields() {
            let marker = if sub.required { "*" } else { " " };
            println!("    {} {} [{}] {}", marker, sub.id, sub.field_type, sub.label);
        }
    }

    Ok(())
}

/// Add a field (or a sub-field with `parent`) and save
pub fn add(
    config: &Config,
    schema_path: &Path,
    type_name: &str,
    label: Option<String>,
    required: bool,
    parent: Option<String>,
) -> Result<()> {
    let field_type: FieldType = type_name.parse().map_err(anyhow::Error::msg)?;
    let mut builder = open_builder(schema_path)?;

    let patch = FieldPatch {
        label,
        required: required.then_some(true),
        ..Default::default()
    };

    let id = match parent {
        Some(parent) => {
            let id = builder.add_sub_field(&parent, field_type)?;
            if !patch.is_empty() {
                builder.update_sub_field(&parent, &id, patch)?;
            }
            id
        }
        None => {
            let id = builder.add_field(field_type)?;
            if !patch.is_empty() {
                builder.update_field(&id, patch)?;
            }
            id
        }
    };

    save_schema(schema_path, builder.schema(), config.compact)?;
    println!("{}", id);
    Ok(())
}

/// Remove a top-level field and save
pub fn remove(config: &Config, schema_path: &Path, id: &str) -> Result<()> {
    let mut builder = open_builder(schema_path)?;
    builder.remove_field(id)?;

    let dangling = VisibilityEvaluator::new(builder.schema()).dangling_conditions();
    for d in dangling.iter().filter(|d| d.source_field_id == id) {
        println!("WARN:  field '{}' condition {} now references removed field '{}'", d.field_id, d.index, id);
    }

    save_schema(schema_path, builder.schema(), config.compact)?;
    println!("✓ Removed {}", id);
    Ok(())
}

/// Check a schema for integrity errors and misconfiguration
pub fn check(schema_path: &Path, strict: bool) -> Result<()> {
    println!("Checking schema: {}", schema_path.display());

    let schema = load_schema(schema_path)?;
    let mut errors = 0;
    let mut warnings = 0;

    if let Some(id) = schema.first_duplicate_id() {
        println!("ERROR: duplicate id '{}'", id);
        errors += 1;
    }

    let contract = compile(&schema);
    for issue in contract.issues() {
        println!("ERROR: {}", issue);
        errors += 1;
    }

    for d in VisibilityEvaluator::new(&schema).dangling_conditions() {
        println!(
            "WARN:  field '{}' condition {} references unknown field '{}' and will stay hidden",
            d.field_id, d.index, d.source_field_id
        );
        warnings += 1;
    }

    warnings += report_unoffered_operators(&schema);

    println!();
    if errors == 0 && warnings == 0 {
        println!("✓ No issues found in {} fields.", schema.fields.len());
    } else {
        println!("Found {} error(s), {} warning(s) in {} fields.", errors, warnings, schema.fields.len());
    }

    if errors > 0 || (strict && warnings > 0) {
        std::process::exit(1);
    }

    Ok(())
}

fn report_unoffered_operators(schema: &FormSchema) -> usize {
    let mut warnings = 0;
    for field in &schema.fields {
        for condition in field.conditions() {
            if let Some(source) = schema.field(&condition.source_field_id) {
                if !source.field_type.supported_operators().contains(&condition.operator) {
                    println!(
                        "WARN:  field '{}' uses '{}' on a {} field",
                        field.id, condition.operator, source.field_type
                    );
                    warnings += 1;
                }
            }
        }
    }
    warnings
}

fn session_for(schema_path: &Path, values_path: &Path) -> Result<FormSession> {
    let builder = open_builder(schema_path)?;
    let values = load_values(values_path)?;

    let mut session = FormSession::new(Arc::new(builder.schema().clone()));
    session.set_values(values);
    Ok(session)
}

/// Print the ids of the fields the values reveal
pub fn visible(schema_path: &Path, values_path: &Path) -> Result<()> {
    let session = session_for(schema_path, values_path)?;

    for field in session.visible_in_order() {
        println!("{}", field.id);
    }
    Ok(())
}

/// Validate a value mapping; exits non-zero when invalid
pub fn validate(schema_path: &Path, values_path: &Path, all: bool) -> Result<()> {
    let session = session_for(schema_path, values_path)?;

    let report = if all {
        session.contract().validate(session.values())
    } else {
        session.validate()
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.valid {
        std::process::exit(1);
    }
    Ok(())
}
