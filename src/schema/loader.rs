//! Schema loader - reads and writes schema files

use anyhow::{bail, Context, Result};
use std::path::Path;

use super::{FormSchema, FormValues};

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Load a schema from a JSON or YAML file (chosen by extension)
pub fn load_schema(path: &Path) -> Result<FormSchema> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {}", path.display()))?;

    let schema: FormSchema = if is_yaml(path) {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse schema file: {}", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse schema file: {}", path.display()))?
    };

    Ok(schema)
}

/// Serialize a schema to its export format
pub fn export_schema(schema: &FormSchema, compact: bool) -> Result<String> {
    let text = if compact {
        serde_json::to_string(schema)?
    } else {
        serde_json::to_string_pretty(schema)?
    };
    Ok(text)
}

/// Write a schema as JSON
pub fn save_schema(path: &Path, schema: &FormSchema, compact: bool) -> Result<()> {
    let text = export_schema(schema, compact)?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write schema file: {}", path.display()))?;
    Ok(())
}

/// Load a value mapping (a JSON object keyed by field id)
pub fn load_values(path: &Path) -> Result<FormValues> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read values file: {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse values file: {}", path.display()))?;

    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("Values file must contain a JSON object: {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, FormField};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("survey.json");

        let mut schema = FormSchema::default();
        schema.title = "Survey".to_string();
        schema.fields.push(FormField::new("q1", FieldType::Radio, "Attending?"));

        save_schema(&path, &schema, false).unwrap();
        let loaded = load_schema(&path).unwrap();

        assert_eq!(loaded, schema);
    }

    #[test]
    fn test_load_yaml_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("survey.yaml");
        let content = r#"
title: Survey
fields:
  - id: q1
    type: multiSelect
    label: Pick some
    required: true
    validations:
      min: 1
"#;
        std::fs::write(&path, content).unwrap();

        let schema = load_schema(&path).unwrap();

        assert_eq!(schema.fields[0].field_type, FieldType::MultiSelect);
        assert_eq!(schema.fields[0].validations.as_ref().unwrap().min, Some(1.0));
        // Omitted settings fall back to defaults
        assert!(schema.settings.show_progress_bar);
    }

    #[test]
    fn test_load_values_rejects_non_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("values.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        assert!(load_values(&path).is_err());
    }
}
