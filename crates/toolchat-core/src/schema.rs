//! Tool Schema
//!
//! Descriptors advertised to the model. A [`ToolDescriptor`] is assembled once
//! through [`ToolDescriptorBuilder`], validated, and never mutated afterwards.
//!
//! ```rust,ignore
//! let descriptor = ToolDescriptor::builder("GetCurrentTemperature")
//!     .description("Gets the current temperature at the given location.")
//!     .param(ParameterDescriptor::string("location").describe("The location"))
//!     .param(
//!         ParameterDescriptor::enumeration::<Unit>("unit")
//!             .describe("The unit to measure the temperature in")
//!             .default_value(ArgValue::variant(Unit::Fahrenheit)),
//!     )
//!     .build()?;
//! ```

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::args::ArgValue;
use crate::error::{ChatError, Result};

/// A closed set of named members usable as a tool parameter.
///
/// Member names are matched case-sensitively and advertised in
/// declaration order.
pub trait ToolEnum: Sized + Copy + Send + Sync + 'static {
    /// All members, in declaration order
    const VARIANTS: &'static [Self];

    /// Name of this member as seen by the model
    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.name() == name)
    }

    fn names() -> Vec<String> {
        Self::VARIANTS.iter().map(|v| v.name().to_owned()).collect()
    }
}

/// Declared type of a parameter
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    IntegerArray,
    Enum { allowed: Vec<String> },
    Structured,
}

impl ParamType {
    /// Short human-readable type name, used in coercion errors
    pub const fn label(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Boolean => "a boolean",
            Self::IntegerArray => "an array of integers",
            Self::Enum { .. } => "one of the allowed values",
            Self::Structured => "a JSON value",
        }
    }

    fn wire_schema(&self) -> Map<String, Value> {
        let mut schema = Map::new();
        match self {
            Self::String => {
                schema.insert("type".into(), json!("string"));
            }
            Self::Integer => {
                schema.insert("type".into(), json!("integer"));
            }
            Self::Boolean => {
                schema.insert("type".into(), json!("boolean"));
            }
            Self::IntegerArray => {
                schema.insert("type".into(), json!("array"));
                schema.insert("items".into(), json!({ "type": "integer" }));
            }
            Self::Enum { allowed } => {
                schema.insert("type".into(), json!("string"));
                schema.insert("enum".into(), json!(allowed));
            }
            Self::Structured => {
                schema.insert("type".into(), json!("object"));
            }
        }
        schema
    }

    /// Whether a default value fits this type
    fn accepts(&self, value: &ArgValue) -> bool {
        match (self, value) {
            (Self::String, ArgValue::Str(_))
            | (Self::Integer, ArgValue::Int(_))
            | (Self::Boolean, ArgValue::Bool(_))
            | (Self::IntegerArray, ArgValue::IntArray(_))
            | (Self::Structured, ArgValue::Structured(_)) => true,
            (Self::Enum { allowed }, ArgValue::Enum(name)) => allowed.contains(name),
            _ => false,
        }
    }
}

/// A single named parameter of a tool
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    name: String,
    #[serde(flatten)]
    param_type: ParamType,
    description: String,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<ArgValue>,
}

impl ParameterDescriptor {
    fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: String::new(),
            required: true,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean)
    }

    pub fn integer_array(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::IntegerArray)
    }

    /// Enumeration parameter; allowed values are the member names of `E`
    pub fn enumeration<E: ToolEnum>(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Enum { allowed: E::names() })
    }

    /// Any other JSON-shaped value
    pub fn structured(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Structured)
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare a default, which makes the parameter optional
    #[must_use]
    pub fn default_value(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self.required = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn param_type(&self) -> &ParamType {
        &self.param_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn required(&self) -> bool {
        self.required
    }

    pub const fn default(&self) -> Option<&ArgValue> {
        self.default.as_ref()
    }

    /// Allowed member names, present only for enumerations
    pub fn allowed_values(&self) -> Option<&[String]> {
        match &self.param_type {
            ParamType::Enum { allowed } => Some(allowed),
            _ => None,
        }
    }
}

/// Name, description and parameters of a registered tool
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    parameters: Vec<ParameterDescriptor>,
}

impl ToolDescriptor {
    pub fn builder(name: impl Into<String>) -> ToolDescriptorBuilder {
        ToolDescriptorBuilder {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Render as a function definition in the format Ollama (and OpenAI) accept
    pub fn to_wire(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut schema = param.param_type.wire_schema();
            schema.insert("description".into(), json!(param.description));
            if let Some(default) = &param.default {
                schema.insert("default".into(), default.to_json());
            }
            properties.insert(param.name.clone(), Value::Object(schema));

            if param.required {
                required.push(param.name.clone());
            }
        }

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                },
            },
        })
    }
}

/// Accumulates a descriptor; validation happens in [`build`](Self::build)
#[derive(Debug)]
pub struct ToolDescriptorBuilder {
    name: String,
    description: String,
    parameters: Vec<ParameterDescriptor>,
}

impl ToolDescriptorBuilder {
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn param(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn build(self) -> Result<ToolDescriptor> {
        if self.name.trim().is_empty() {
            return Err(ChatError::Config("tool name must not be empty".into()));
        }
        if self.description.trim().is_empty() {
            return Err(ChatError::Config(format!(
                "tool '{}' has no description",
                self.name
            )));
        }

        for (i, param) in self.parameters.iter().enumerate() {
            if param.name.trim().is_empty() {
                return Err(ChatError::Config(format!(
                    "tool '{}' has a parameter with no name",
                    self.name
                )));
            }
            if param.description.trim().is_empty() {
                return Err(ChatError::Config(format!(
                    "parameter '{}' of tool '{}' has no description",
                    param.name, self.name
                )));
            }
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(ChatError::Config(format!(
                    "tool '{}' declares parameter '{}' twice",
                    self.name, param.name
                )));
            }
            if let Some(default) = &param.default {
                if !param.param_type.accepts(default) {
                    return Err(ChatError::Config(format!(
                        "default for parameter '{}' of tool '{}' is not {}",
                        param.name,
                        self.name,
                        param.param_type.label()
                    )));
                }
            }
        }

        Ok(ToolDescriptor {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Unit {
        Celsius,
        Fahrenheit,
    }

    impl ToolEnum for Unit {
        const VARIANTS: &'static [Self] = &[Self::Celsius, Self::Fahrenheit];

        fn name(self) -> &'static str {
            match self {
                Self::Celsius => "Celsius",
                Self::Fahrenheit => "Fahrenheit",
            }
        }
    }

    fn temperature() -> ToolDescriptor {
        ToolDescriptor::builder("GetCurrentTemperature")
            .description("Gets the current temperature")
            .param(ParameterDescriptor::string("location").describe("Where"))
            .param(
                ParameterDescriptor::enumeration::<Unit>("unit")
                    .describe("Unit")
                    .default_value(ArgValue::variant(Unit::Fahrenheit)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn required_iff_no_default() {
        let d = temperature();
        for p in d.parameters() {
            assert_eq!(p.required(), p.default().is_none(), "{}", p.name());
        }
        assert!(d.parameter("location").unwrap().required());
        assert!(!d.parameter("unit").unwrap().required());
    }

    #[test]
    fn allowed_values_iff_enum() {
        let d = temperature();
        assert_eq!(d.parameter("location").unwrap().allowed_values(), None);
        assert_eq!(
            d.parameter("unit").unwrap().allowed_values(),
            Some(&["Celsius".to_owned(), "Fahrenheit".to_owned()][..])
        );
    }

    #[test]
    fn enum_lookup_is_case_sensitive() {
        assert_eq!(Unit::from_name("Celsius"), Some(Unit::Celsius));
        assert_eq!(Unit::from_name("celsius"), None);
    }

    #[test]
    fn missing_descriptions_are_rejected() {
        let err = ToolDescriptor::builder("Nameless").build().unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));

        let err = ToolDescriptor::builder("Tool")
            .description("does things")
            .param(ParameterDescriptor::integer("count"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn mistyped_default_is_rejected() {
        let err = ToolDescriptor::builder("Tool")
            .description("does things")
            .param(
                ParameterDescriptor::integer("count")
                    .describe("how many")
                    .default_value("three"),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn wire_format() {
        let wire = temperature().to_wire();
        let function = &wire["function"];
        assert_eq!(wire["type"], "function");
        assert_eq!(function["name"], "GetCurrentTemperature");
        assert_eq!(function["parameters"]["required"], json!(["location"]));
        assert_eq!(
            function["parameters"]["properties"]["unit"]["enum"],
            json!(["Celsius", "Fahrenheit"])
        );
        assert_eq!(
            function["parameters"]["properties"]["unit"]["default"],
            "Fahrenheit"
        );
    }

    #[test]
    fn rebuilding_is_byte_identical() {
        let a = serde_json::to_string(&temperature()).unwrap();
        let b = serde_json::to_string(&temperature()).unwrap();
        assert_eq!(a, b);
        assert_eq!(temperature().to_wire(), temperature().to_wire());
    }
}
