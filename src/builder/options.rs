//! Option, matrix row, and matrix column editing

use super::defaults::{option, option_value};
use super::{BuilderError, BuilderResult, FormBuilder};
use crate::schema::{FieldOption, FieldType};

impl FormBuilder {
    /// Append "Option N" to a field's option set; returns the option id
    pub fn add_option(&mut self, field_id: &str) -> BuilderResult<String> {
        let mut new_id = String::new();
        self.edit_field(field_id, |field| {
            let options = field.options.get_or_insert_with(Vec::new);
            let n = options.len() + 1;
            let new_option = option(format!("option{}", n), format!("Option {}", n), None);
            new_id = new_option.id.clone();
            options.push(new_option);
            Ok(())
        })?;
        Ok(new_id)
    }

    /// Set an option's label; its value is re-derived from the label
    pub fn update_option(&mut self, field_id: &str, option_id: &str, label: &str) -> BuilderResult<()> {
        self.edit_field(field_id, |field| {
            let option = find_option(field.options.as_mut(), field_id, option_id)?;
            option.label = label.to_string();
            option.value = option_value(label);
            Ok(())
        })
    }

    pub fn remove_option(&mut self, field_id: &str, option_id: &str) -> BuilderResult<()> {
        self.edit_field(field_id, |field| {
            let options = field.options.get_or_insert_with(Vec::new);
            let before = options.len();
            options.retain(|o| o.id != option_id);
            if options.len() == before {
                return Err(BuilderError::UnknownOption {
                    field_id: field_id.to_string(),
                    option_id: option_id.to_string(),
                });
            }
            Ok(())
        })
    }

    /// Append "Row N" to a matrix; returns the option id
    pub fn add_matrix_row(&mut self, field_id: &str) -> BuilderResult<String> {
        self.add_matrix_option(field_id, false)
    }

    /// Append "Column N" to a matrix; returns the option id
    pub fn add_matrix_column(&mut self, field_id: &str) -> BuilderResult<String> {
        self.add_matrix_option(field_id, true)
    }

    fn add_matrix_option(&mut self, field_id: &str, is_column: bool) -> BuilderResult<String> {
        let mut new_id = String::new();
        self.edit_field(field_id, |field| {
            if field.field_type != FieldType::Matrix {
                return Err(BuilderError::NotMatrix(field_id.to_string()));
            }
            let options = field.options.get_or_insert_with(Vec::new);
            let n = options.iter().filter(|o| o.is_column() == is_column).count() + 1;
            let (value, label) = if is_column {
                (format!("column{}", n), format!("Column {}", n))
            } else {
                (format!("row{}", n), format!("Row {}", n))
            };
            let new_option = option(value, label, Some(is_column));
            new_id = new_option.id.clone();
            options.push(new_option);
            Ok(())
        })?;
        Ok(new_id)
    }
}

fn find_option<'a>(
    options: Option<&'a mut Vec<FieldOption>>,
    field_id: &str,
    option_id: &str,
) -> BuilderResult<&'a mut FieldOption> {
    options
        .and_then(|options| options.iter_mut().find(|o| o.id == option_id))
        .ok_or_else(|| BuilderError::UnknownOption {
            field_id: field_id.to_string(),
            option_id: option_id.to_string(),
        })
}
