//! Argument Coercion
//!
//! The model sends arguments as an untyped JSON object. [`Arguments::bind`]
//! walks a tool's declared parameters in order, converts each raw value to
//! its declared type, fills in defaults, and reports the first parameter that
//! cannot be satisfied.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ToolError;
use crate::schema::{ParamType, ParameterDescriptor, ToolDescriptor, ToolEnum};

/// A coerced argument value
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Bool(bool),
    IntArray(Vec<i64>),
    /// Member name of an enumeration
    Enum(String),
    Structured(Value),
}

impl ArgValue {
    pub fn variant<E: ToolEnum>(value: E) -> Self {
        Self::Enum(value.name().to_owned())
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Str(s) | Self::Enum(s) => Value::String(s.clone()),
            Self::Int(n) => Value::from(*n),
            Self::Bool(b) => Value::Bool(*b),
            Self::IntArray(items) => Value::from(items.clone()),
            Self::Structured(v) => v.clone(),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<i64>> for ArgValue {
    fn from(value: Vec<i64>) -> Self {
        Self::IntArray(value)
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

/// Convert one raw JSON value to the parameter's declared type
pub fn coerce(param: &ParameterDescriptor, raw: &Value) -> Result<ArgValue, ToolError> {
    let fail = |reason: String| {
        ToolError::coercion(param.name(), param.param_type().label(), reason)
    };

    match param.param_type() {
        ParamType::String => Ok(ArgValue::Str(match raw {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })),

        ParamType::Integer => parse_int(raw).map(ArgValue::Int).map_err(fail),

        ParamType::Boolean => match raw {
            Value::Bool(b) => Ok(ArgValue::Bool(*b)),
            Value::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Ok(ArgValue::Bool(true))
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(ArgValue::Bool(false))
                } else {
                    Err(fail(format!("'{s}' is not true or false")))
                }
            }
            other => Err(fail(format!("got {other}"))),
        },

        ParamType::IntegerArray => parse_int_array(raw).map(ArgValue::IntArray).map_err(fail),

        ParamType::Enum { allowed } => match raw {
            Value::String(s) if allowed.iter().any(|a| a == s) => Ok(ArgValue::Enum(s.clone())),
            Value::String(s) => Err(fail(format!(
                "'{s}' is not one of {}",
                allowed.join(", ")
            ))),
            other => Err(fail(format!("got {other}"))),
        },

        ParamType::Structured => Ok(ArgValue::Structured(match raw {
            Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| raw.clone()),
            other => other.clone(),
        })),
    }
}

fn parse_int(raw: &Value) -> Result<i64, String> {
    match raw {
        Value::Number(n) => n.as_i64().ok_or_else(|| format!("{n} is not a whole number")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("'{s}': {e}")),
        other => Err(format!("got {other}")),
    }
}

/// Numeric array first, then an array of numeric strings. A string holding
/// an encoded array is decoded first.
fn parse_int_array(raw: &Value) -> Result<Vec<i64>, String> {
    let decoded;
    let raw = match raw {
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s).map_err(|e| format!("'{s}': {e}"))?;
            &decoded
        }
        other => other,
    };

    if let Ok(numbers) = serde_json::from_value::<Vec<i64>>(raw.clone()) {
        return Ok(numbers);
    }

    let strings = serde_json::from_value::<Vec<String>>(raw.clone())
        .map_err(|_| format!("got {raw}"))?;
    strings
        .iter()
        .map(|s| s.trim().parse::<i64>().map_err(|e| format!("element '{s}': {e}")))
        .collect()
}

/// Coerced arguments for one invocation, keyed by parameter name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<String, ArgValue>,
}

impl Arguments {
    /// Coerce `raw` against every declared parameter of `descriptor`.
    ///
    /// A JSON `null` counts as absent. Keys the tool does not declare are
    /// ignored.
    pub fn bind(descriptor: &ToolDescriptor, raw: &Map<String, Value>) -> Result<Self, ToolError> {
        let mut values = HashMap::with_capacity(descriptor.parameters().len());

        for param in descriptor.parameters() {
            let value = match raw.get(param.name()).filter(|v| !v.is_null()) {
                Some(raw_value) => coerce(param, raw_value)?,
                None => param
                    .default()
                    .cloned()
                    .ok_or_else(|| ToolError::MissingArgument(param.name().to_owned()))?,
            };
            values.insert(param.name().to_owned(), value);
        }

        for key in raw.keys() {
            if descriptor.parameter(key).is_none() {
                tracing::debug!(tool = descriptor.name(), argument = %key, "Ignoring undeclared argument");
            }
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    fn require(&self, name: &str) -> Result<&ArgValue, ToolError> {
        self.get(name)
            .ok_or_else(|| ToolError::MissingArgument(name.to_owned()))
    }

    fn mismatch(name: &str, expected: &str, found: &ArgValue) -> ToolError {
        ToolError::coercion(name, expected, format!("bound value is {found:?}"))
    }

    pub fn string(&self, name: &str) -> Result<&str, ToolError> {
        match self.require(name)? {
            ArgValue::Str(s) => Ok(s),
            other => Err(Self::mismatch(name, "a string", other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, ToolError> {
        match self.require(name)? {
            ArgValue::Int(n) => Ok(*n),
            other => Err(Self::mismatch(name, "an integer", other)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ToolError> {
        match self.require(name)? {
            ArgValue::Bool(b) => Ok(*b),
            other => Err(Self::mismatch(name, "a boolean", other)),
        }
    }

    pub fn int_array(&self, name: &str) -> Result<&[i64], ToolError> {
        match self.require(name)? {
            ArgValue::IntArray(items) => Ok(items),
            other => Err(Self::mismatch(name, "an array of integers", other)),
        }
    }

    pub fn enumeration<E: ToolEnum>(&self, name: &str) -> Result<E, ToolError> {
        match self.require(name)? {
            ArgValue::Enum(member) => E::from_name(member).ok_or_else(|| {
                ToolError::coercion(name, "one of the allowed values", format!("unknown member '{member}'"))
            }),
            other => Err(Self::mismatch(name, "one of the allowed values", other)),
        }
    }

    /// Deserialize a structured argument into `T`
    pub fn structured<T: DeserializeOwned>(&self, name: &str) -> Result<T, ToolError> {
        match self.require(name)? {
            ArgValue::Structured(value) => serde_json::from_value(value.clone())
                .map_err(|e| ToolError::coercion(name, "a JSON value", e)),
            other => Err(Self::mismatch(name, "a JSON value", other)),
        }
    }
}
