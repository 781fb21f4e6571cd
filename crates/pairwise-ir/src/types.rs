use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::parse::InputError;

// ── Parameters ───────────────────────────────────────────────────────

/// A named parameter and its ordered domain of value labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub values: Vec<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Index of the first occurrence of `value` in this domain.
    pub fn value_index(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}

/// Ordered mapping of parameter name -> domain.
///
/// Insertion order is the parameter order used by candidates and suites.
/// Names are unique; domains are not checked here (see `validate`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from parameters in order, rejecting duplicate or empty names.
    pub fn from_parameters(parameters: Vec<Parameter>) -> Result<Self, InputError> {
        let mut set = Self::new();
        for parameter in parameters {
            set.insert(parameter)?;
        }
        Ok(set)
    }

    /// Append a parameter at the end of the order.
    pub fn insert(&mut self, parameter: Parameter) -> Result<(), InputError> {
        if parameter.name.is_empty() {
            return Err(InputError::EmptyName);
        }
        if self.get(&parameter.name).is_some() {
            return Err(InputError::DuplicateParameter {
                name: parameter.name,
            });
        }
        self.parameters.push(parameter);
        Ok(())
    }

    /// Replace the domain of an existing parameter, keeping its position.
    /// Returns false if no parameter has that name.
    pub fn replace_values(&mut self, name: &str, values: Vec<String>) -> bool {
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(parameter) => {
                parameter.values = values;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        let index = self.position(name)?;
        Some(self.parameters.remove(index))
    }

    pub fn clear(&mut self) {
        self.parameters.clear();
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Position of a parameter in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    pub fn as_slice(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Parameter names sorted lexicographically.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names = self.names();
        names.sort_unstable();
        names
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.parameters.len()))?;
        for parameter in &self.parameters {
            map.serialize_entry(&parameter.name, &parameter.values)?;
        }
        map.end()
    }
}

// ── Assignments and pairs ────────────────────────────────────────────

/// One (parameter, value) pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Assignment {
    pub parameter: String,
    pub value: String,
}

impl Assignment {
    pub fn new(parameter: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.parameter, self.value)
    }
}

/// A required 2-way combination of assignments from two distinct parameters.
///
/// Always stored in canonical order: `first < second`, which for distinct
/// parameter names means `first.parameter < second.parameter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    pub first: Assignment,
    pub second: Assignment,
}

impl Pair {
    /// Combine two assignments. Returns `None` if both name the same parameter.
    pub fn new(a: Assignment, b: Assignment) -> Option<Self> {
        if a.parameter == b.parameter {
            return None;
        }
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Some(Self { first, second })
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

// ── Candidates and suites ────────────────────────────────────────────

/// One value per parameter, in parameter order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate {
    pub values: Vec<String>,
}

impl Candidate {
    pub fn new(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Zip this candidate's values with the parameter names, in order.
    pub fn assignments<'a>(
        &'a self,
        parameters: &'a ParameterSet,
    ) -> impl Iterator<Item = Assignment> + 'a {
        parameters
            .iter()
            .zip(&self.values)
            .map(|(p, v)| Assignment::new(p.name.clone(), v.clone()))
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.values.join(", "))
    }
}

/// An ordered sequence of candidates.
pub type TestSuite = Vec<Candidate>;
