//! Node parameters and the override sources that feed them

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Key under which a ROS 2 params file nests a node's parameters
const ROS_PARAMETERS_KEY: &str = "ros__parameters";

/// Params file entry applying to every node
const WILDCARD_NODE: &str = "/**";

/// A parameter value: a scalar or a homogeneous array of scalars
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    BoolArray(Vec<bool>),
    IntegerArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl ParameterValue {
    /// Parse a command line value: booleans, then integers, then floats, else a string
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => return ParameterValue::Bool(true),
            "false" => return ParameterValue::Bool(false),
            _ => {}
        }
        if let Ok(value) = raw.parse::<i64>() {
            return ParameterValue::Integer(value);
        }
        if let Ok(value) = raw.parse::<f64>() {
            return ParameterValue::Double(value);
        }
        ParameterValue::String(raw.to_string())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Bool(_) => "bool",
            ParameterValue::Integer(_) => "integer",
            ParameterValue::Double(_) => "double",
            ParameterValue::String(_) => "string",
            ParameterValue::BoolArray(_) => "bool array",
            ParameterValue::IntegerArray(_) => "integer array",
            ParameterValue::DoubleArray(_) => "double array",
            ParameterValue::StringArray(_) => "string array",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Convert a YAML leaf; `None` for nulls, empty or mixed lists and tagged values
    fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(value) => Some(ParameterValue::Bool(*value)),
            Value::Number(number) => number
                .as_i64()
                .map(ParameterValue::Integer)
                .or_else(|| number.as_f64().map(ParameterValue::Double)),
            Value::String(value) => Some(ParameterValue::String(value.clone())),
            Value::Sequence(items) => Self::array_from_yaml(items),
            _ => None,
        }
    }

    fn array_from_yaml(items: &[Value]) -> Option<Self> {
        let first = items.first()?;
        match first {
            Value::Bool(_) => items
                .iter()
                .map(Value::as_bool)
                .collect::<Option<_>>()
                .map(ParameterValue::BoolArray),
            Value::String(_) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<_>>()
                .map(ParameterValue::StringArray),
            Value::Number(_) => {
                if let Some(integers) = items.iter().map(Value::as_i64).collect::<Option<_>>() {
                    return Some(ParameterValue::IntegerArray(integers));
                }
                items
                    .iter()
                    .map(Value::as_f64)
                    .collect::<Option<_>>()
                    .map(ParameterValue::DoubleArray)
            }
            _ => None,
        }
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(value) => write!(f, "{value}"),
            ParameterValue::Integer(value) => write!(f, "{value}"),
            ParameterValue::Double(value) => write!(f, "{value}"),
            ParameterValue::String(value) => f.write_str(value),
            ParameterValue::BoolArray(values) => join(f, values),
            ParameterValue::IntegerArray(values) => join(f, values),
            ParameterValue::DoubleArray(values) => join(f, values),
            ParameterValue::StringArray(values) => join(f, values),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Integer(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Double(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl From<Vec<String>> for ParameterValue {
    fn from(values: Vec<String>) -> Self {
        ParameterValue::StringArray(values)
    }
}

/// Values that replace parameter defaults when a node declares them.
///
/// Entries a params file holds in a form no parameter type can take are
/// remembered by name; they only fail a node that declares them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterOverrides {
    values: BTreeMap<String, ParameterValue>,
    unsupported: BTreeSet<String>,
}

impl ParameterOverrides {
    pub fn insert(&mut self, name: &str, value: impl Into<ParameterValue>) {
        self.unsupported.remove(name);
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// Whether `name` was given a value that cannot be represented
    pub fn is_unsupported(&self, name: &str) -> bool {
        self.unsupported.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.unsupported.is_empty()
    }

    /// Entries of `other` replace entries with the same name
    pub fn merge(&mut self, other: ParameterOverrides) {
        for name in other.unsupported {
            self.values.remove(&name);
            self.unsupported.insert(name);
        }
        for (name, value) in other.values {
            self.unsupported.remove(&name);
            self.values.insert(name, value);
        }
    }

    /// Parse a `name:=value` command line assignment
    pub fn parse_assignment(assignment: &str) -> Result<(String, ParameterValue)> {
        let (name, raw) = assignment
            .split_once(":=")
            .ok_or_else(|| Error::InvalidParameterAssignment(assignment.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidParameterAssignment(assignment.to_string()));
        }
        Ok((name.to_string(), ParameterValue::parse(raw.trim())))
    }

    /// Read the overrides for `node_name` from ROS 2 params file contents.
    ///
    /// `/**` entries apply to every node; entries naming the node (with or
    /// without a leading slash) win over them. Other nodes are ignored.
    /// Nested maps flatten into dotted names (`controller.rate`).
    pub fn from_params_yaml(contents: &str, node_name: &str) -> Result<Self> {
        let document: BTreeMap<String, Value> = serde_yaml::from_str(contents)?;
        let mut overrides = ParameterOverrides::default();

        let absolute = format!("/{node_name}");
        for key in [WILDCARD_NODE, node_name, absolute.as_str()] {
            if let Some(section) = document.get(key) {
                overrides.merge(Self::from_node_section(section));
            }
        }
        Ok(overrides)
    }

    fn from_node_section(section: &Value) -> Self {
        let mut overrides = ParameterOverrides::default();
        if let Some(parameters) = section.get(ROS_PARAMETERS_KEY).and_then(Value::as_mapping) {
            overrides.collect("", parameters);
        }
        overrides
    }

    fn collect(&mut self, prefix: &str, mapping: &Mapping) {
        for (key, value) in mapping {
            let key = match key {
                Value::String(key) => key.clone(),
                Value::Number(key) => key.to_string(),
                Value::Bool(key) => key.to_string(),
                _ => {
                    debug!(?key, "Skipping params file entry with a non-scalar key");
                    continue;
                }
            };
            let name = if prefix.is_empty() {
                key
            } else {
                format!("{prefix}.{key}")
            };

            if let Value::Mapping(nested) = value {
                self.collect(&name, nested);
                continue;
            }
            match ParameterValue::from_yaml(value) {
                Some(value) => self.insert(&name, value),
                None => {
                    self.values.remove(&name);
                    self.unsupported.insert(name);
                }
            }
        }
    }
}
