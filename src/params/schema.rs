// Declarative validator for extra parameters
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Why a value failed `ParamSchema::safe_parse`
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ParamError {
    /// Dotted location inside the value, `None` at the top
    pub path: Option<String>,
    pub message: String,
}

impl ParamError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }

    fn at(mut self, segment: &str) -> Self {
        self.path = Some(match self.path.take() {
            Some(path) => format!("{}.{}", segment, path),
            None => segment.to_string(),
        });
        self
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Schema of one extra parameter
///
/// Query values arrive as strings, so numbers and booleans are coerced from
/// their textual form. `safe_parse` returns the normalized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamSchema {
    #[serde(rename_all = "camelCase")]
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default)]
        integer: bool,
    },
    Boolean,
    Enum {
        values: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Array {
        items: Box<ParamSchema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    Object {
        #[serde(default)]
        properties: BTreeMap<String, ParamSchema>,
        #[serde(default)]
        required: Vec<String>,
    },
    Any,
}

impl ParamSchema {
    pub fn string() -> Self {
        ParamSchema::String {
            min_length: None,
            max_length: None,
        }
    }

    pub fn bounded_string(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        ParamSchema::String { min_length, max_length }
    }

    pub fn number() -> Self {
        ParamSchema::Number {
            min: None,
            max: None,
            integer: false,
        }
    }

    pub fn integer() -> Self {
        ParamSchema::Number {
            min: None,
            max: None,
            integer: true,
        }
    }

    pub fn boolean() -> Self {
        ParamSchema::Boolean
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParamSchema::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn array(items: ParamSchema) -> Self {
        ParamSchema::Array {
            items: Box::new(items),
            max_items: None,
        }
    }

    pub fn object<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = (S, ParamSchema)>,
        S: Into<String>,
    {
        ParamSchema::Object {
            properties: properties.into_iter().map(|(name, schema)| (name.into(), schema)).collect(),
            required: Vec::new(),
        }
    }

    pub fn any() -> Self {
        ParamSchema::Any
    }

    /// Mark object properties as required; no-op on other schemas
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let ParamSchema::Object { required, .. } = &mut self {
            required.extend(names.into_iter().map(Into::into));
        }
        self
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ParamSchema::String { .. } | ParamSchema::Number { .. } | ParamSchema::Boolean | ParamSchema::Enum { .. }
        )
    }

    /// Query params can only carry scalars or flat arrays of scalars
    pub fn is_scalar_or_scalar_array(&self) -> bool {
        match self {
            ParamSchema::Array { items, .. } => items.is_scalar(),
            other => other.is_scalar(),
        }
    }

    /// Validate and normalize `value`
    pub fn safe_parse(&self, value: &Value) -> Result<Value, ParamError> {
        match self {
            ParamSchema::String { min_length, max_length } => {
                let text = value.as_str().ok_or_else(|| ParamError::new("Expected a string"))?;
                let length = text.chars().count();
                if let Some(min) = min_length {
                    if length < *min {
                        return Err(ParamError::new(format!("Must be at least {} characters", min)));
                    }
                }
                if let Some(max) = max_length {
                    if length > *max {
                        return Err(ParamError::new(format!("Must be at most {} characters", max)));
                    }
                }
                Ok(Value::String(text.to_string()))
            }
            ParamSchema::Number { min, max, integer } => parse_number(value, *min, *max, *integer),
            ParamSchema::Boolean => match value {
                Value::Bool(flag) => Ok(Value::Bool(*flag)),
                Value::String(text) if text == "true" => Ok(Value::Bool(true)),
                Value::String(text) if text == "false" => Ok(Value::Bool(false)),
                _ => Err(ParamError::new("Expected a boolean")),
            },
            ParamSchema::Enum { values } => match value.as_str() {
                Some(text) if values.iter().any(|allowed| allowed == text) => Ok(Value::String(text.to_string())),
                _ => Err(ParamError::new(format!("Expected one of: {}", values.join(", ")))),
            },
            ParamSchema::Array { items, max_items } => {
                // `?tag=a` arrives as a scalar where `?tag[]=a` arrives as a list
                let elements = match value {
                    Value::Array(elements) => elements.as_slice(),
                    other => std::slice::from_ref(other),
                };
                if let Some(max) = max_items {
                    if elements.len() > *max {
                        return Err(ParamError::new(format!("Must contain at most {} items", max)));
                    }
                }
                elements
                    .iter()
                    .enumerate()
                    .map(|(index, element)| items.safe_parse(element).map_err(|err| err.at(&index.to_string())))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            ParamSchema::Object { properties, required } => {
                let map = value.as_object().ok_or_else(|| ParamError::new("Expected an object"))?;
                for name in required {
                    if !map.contains_key(name) {
                        return Err(ParamError::new("Required").at(name));
                    }
                }

                // Unknown properties are stripped
                let mut out = Map::new();
                for (name, schema) in properties {
                    if let Some(property) = map.get(name) {
                        out.insert(name.clone(), schema.safe_parse(property).map_err(|err| err.at(name))?);
                    }
                }
                Ok(Value::Object(out))
            }
            ParamSchema::Any => Ok(value.clone()),
        }
    }
}

fn parse_number(value: &Value, min: Option<f64>, max: Option<f64>, integer: bool) -> Result<Value, ParamError> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
    .ok_or_else(|| ParamError::new("Expected a number"))?;

    if integer && number.fract() != 0.0 {
        return Err(ParamError::new("Expected an integer"));
    }
    if let Some(min) = min {
        if number < min {
            return Err(ParamError::new(format!("Must be greater than or equal to {}", min)));
        }
    }
    if let Some(max) = max {
        if number > max {
            return Err(ParamError::new(format!("Must be less than or equal to {}", max)));
        }
    }

    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        return Ok(Value::Number(Number::from(number as i64)));
    }
    Number::from_f64(number)
        .map(Value::Number)
        .ok_or_else(|| ParamError::new("Expected a number"))
}
