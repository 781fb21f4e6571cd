//! Editing rules for parameter names and values.
//!
//! Pure checks applied before a parameter set is handed to the solvers.
//! The solvers never call into this module; they trust the shape rules in
//! `parse` and nothing more.

use std::collections::{BTreeSet, HashSet};

use crate::types::ParameterSet;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_VALUE_LENGTH: usize = 100;
pub const MAX_VALUES: usize = 50;
pub const MIN_VALUES: usize = 2;
pub const MIN_PARAMETERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Parameter name cannot be empty")]
    EmptyName,

    #[error("Parameter names can only contain letters, numbers, spaces, underscores, and hyphens: '{name}'")]
    InvalidNameCharacters { name: String },

    #[error("Parameter name too long (max {MAX_NAME_LENGTH} characters): '{name}'")]
    NameTooLong { name: String },

    #[error("Parameter name already exists: '{name}'")]
    DuplicateName { name: String },

    #[error("Values cannot be empty")]
    EmptyValues,

    #[error("Maximum {MAX_VALUES} values allowed per parameter (got {count})")]
    TooManyValues { count: usize },

    #[error("Values exceeding {MAX_VALUE_LENGTH} characters: {}", .values.join(", "))]
    ValuesTooLong { values: Vec<String> },

    #[error("Duplicate values are not allowed within a parameter: {}", .values.join(", "))]
    DuplicateValues { values: Vec<String> },

    #[error("Values {} already exist in other parameters", .values.join(", "))]
    ValuesUsedElsewhere { values: Vec<String> },

    #[error("At least {MIN_VALUES} values are required for each parameter (got {count})")]
    TooFewValues { count: usize },

    #[error("Parameter '{parameter}' needs at least {MIN_VALUES} values (has {count})")]
    ParameterTooFewValues { parameter: String, count: usize },

    #[error("Please add at least {MIN_PARAMETERS} parameters (have {count})")]
    TooFewParameters { count: usize },
}

/// Check a new parameter name against the existing set.
///
/// Returns the trimmed name on success.
pub fn validate_parameter_name(
    name: &str,
    existing: &ParameterSet,
) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
    {
        return Err(ValidationError::InvalidNameCharacters {
            name: name.to_string(),
        });
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong {
            name: name.to_string(),
        });
    }
    if existing.get(trimmed).is_some() {
        return Err(ValidationError::DuplicateName {
            name: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Split, clean and check a comma-separated value list.
///
/// `current` names the parameter being edited; its own values do not count
/// as clashes with other parameters.
pub fn validate_parameter_values(
    raw: &str,
    existing: &ParameterSet,
    current: Option<&str>,
) -> Result<Vec<String>, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyValues);
    }

    let values: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    if values.len() > MAX_VALUES {
        return Err(ValidationError::TooManyValues {
            count: values.len(),
        });
    }

    let long: Vec<String> = values
        .iter()
        .filter(|v| v.chars().count() > MAX_VALUE_LENGTH)
        .cloned()
        .collect();
    if !long.is_empty() {
        return Err(ValidationError::ValuesTooLong { values: long });
    }

    let mut seen = HashSet::new();
    let duplicates: BTreeSet<String> = values
        .iter()
        .filter(|v| !seen.insert(v.as_str()))
        .cloned()
        .collect();
    if !duplicates.is_empty() {
        return Err(ValidationError::DuplicateValues {
            values: duplicates.into_iter().collect(),
        });
    }

    let elsewhere: HashSet<&str> = existing
        .iter()
        .filter(|p| Some(p.name.as_str()) != current)
        .flat_map(|p| p.values.iter().map(String::as_str))
        .collect();
    let clashes: BTreeSet<String> = values
        .iter()
        .filter(|v| elsewhere.contains(v.as_str()))
        .cloned()
        .collect();
    if !clashes.is_empty() {
        return Err(ValidationError::ValuesUsedElsewhere {
            values: clashes.into_iter().collect(),
        });
    }

    if values.len() < MIN_VALUES {
        return Err(ValidationError::TooFewValues {
            count: values.len(),
        });
    }

    Ok(values)
}

/// Whole-set check before generation: every parameter has enough values and
/// there are enough parameters. Reports every violation.
pub fn validate_parameter_set(set: &ParameterSet) -> Result<(), Vec<ValidationError>> {
    let mut errors: Vec<ValidationError> = set
        .iter()
        .filter(|p| p.values.len() < MIN_VALUES)
        .map(|p| ValidationError::ParameterTooFewValues {
            parameter: p.name.clone(),
            count: p.values.len(),
        })
        .collect();

    if set.len() < MIN_PARAMETERS {
        errors.push(ValidationError::TooFewParameters { count: set.len() });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
