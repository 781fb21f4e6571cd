use serde_json::Value;

use crate::types::{Parameter, ParameterSet};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parameters must be an object mapping names to value lists")]
    NotAMapping,

    #[error("parameter set cannot be empty")]
    Empty,

    #[error("values of parameter '{parameter}' must be a list")]
    DomainNotList { parameter: String },

    #[error("value #{index} of parameter '{parameter}' must be a string, number or bool")]
    InvalidValue { parameter: String, index: usize },

    #[error("duplicate parameter '{name}'")]
    DuplicateParameter { name: String },

    #[error("parameter name cannot be empty")]
    EmptyName,
}

/// Parse a JSON object `{ name: [value, ...] }` into a parameter set.
///
/// Key order in the document is kept as the parameter order.
pub fn parse_parameters(json: &str) -> Result<ParameterSet, InputError> {
    let value: Value = serde_json::from_str(json)?;
    parameters_from_value(&value)
}

pub fn parameters_from_value(value: &Value) -> Result<ParameterSet, InputError> {
    let object = value.as_object().ok_or(InputError::NotAMapping)?;
    let mut set = ParameterSet::new();

    for (name, domain) in object {
        let items = domain
            .as_array()
            .ok_or_else(|| InputError::DomainNotList {
                parameter: name.clone(),
            })?;

        let mut values = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let label = match item {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(InputError::InvalidValue {
                        parameter: name.clone(),
                        index,
                    })
                }
            };
            values.push(label);
        }

        set.insert(Parameter {
            name: name.clone(),
            values,
        })?;
    }

    log::debug!("parsed {} parameters", set.len());
    Ok(set)
}

impl TryFrom<Value> for ParameterSet {
    type Error = InputError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        parameters_from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_document_order() {
        let set = parse_parameters(r#"{"Zoom": ["in", "out"], "Audio": ["on", "off"]}"#).unwrap();
        assert_eq!(set.names(), vec!["Zoom", "Audio"]);
        assert_eq!(set.get("Audio").unwrap().values, vec!["on", "off"]);
    }

    #[test]
    fn test_scalar_values_become_labels() {
        let set = parse_parameters(r#"{"Threads": [1, 2, 4], "Cached": [true, false]}"#).unwrap();
        assert_eq!(set.get("Threads").unwrap().values, vec!["1", "2", "4"]);
        assert_eq!(set.get("Cached").unwrap().values, vec!["true", "false"]);
    }

    #[test]
    fn test_not_a_mapping() {
        let err = parse_parameters(r#"[["a", "b"]]"#).unwrap_err();
        assert!(matches!(err, InputError::NotAMapping));
    }

    #[test]
    fn test_domain_not_list() {
        let err = parse_parameters(r#"{"P1": "a,b"}"#).unwrap_err();
        match err {
            InputError::DomainNotList { parameter } => assert_eq!(parameter, "P1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_value_rejected() {
        let err = parse_parameters(r#"{"P1": ["a", ["b"]]}"#).unwrap_err();
        assert!(matches!(err, InputError::InvalidValue { index: 1, .. }));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_parameters("not json").unwrap_err(),
            InputError::Json(_)
        ));
    }

    #[test]
    fn test_empty_object_parses_to_empty_set() {
        let set = parse_parameters("{}").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_deserialize_through_try_from() {
        let set: ParameterSet = serde_json::from_str(r#"{"P1": ["a", "b"]}"#).unwrap();
        assert_eq!(set.len(), 1);
        assert!(serde_json::from_str::<ParameterSet>(r#"{"P1": 3}"#).is_err());
    }
}
