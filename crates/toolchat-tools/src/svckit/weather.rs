//! Current Temperature Tool
//!
//! Simulated sensor: returns a random reading in a plausible range for the
//! requested unit.

use async_trait::async_trait;
use rand::Rng;
use std::fmt;

use toolchat_core::{
    ArgValue, Arguments, ParameterDescriptor, Result as CoreResult, Tool, ToolDescriptor,
    ToolEnum, ToolError,
};

/// Temperature scale
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
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

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Unit {
    /// Half-open range of simulated readings
    pub const fn range(self) -> std::ops::Range<i64> {
        match self {
            Self::Celsius => -5..50,
            Self::Fahrenheit => 0..95,
        }
    }
}

fn read_temperature(unit: Unit) -> i64 {
    rand::thread_rng().gen_range(unit.range())
}

/// Tool for reading the temperature at a location
#[derive(Debug, Default, Clone, Copy)]
pub struct CurrentTemperatureTool;

#[async_trait]
impl Tool for CurrentTemperatureTool {
    fn descriptor(&self) -> CoreResult<ToolDescriptor> {
        ToolDescriptor::builder("GetCurrentTemperature")
            .description(
                "Gets the current weather at the given location. \
                 Returns a number describing the current temperature.",
            )
            .param(
                ParameterDescriptor::string("location")
                    .describe("The location to get the weather for"),
            )
            .param(
                ParameterDescriptor::enumeration::<Unit>("unit")
                    .describe("The unit to measure the temperature in")
                    .default_value(ArgValue::variant(Unit::Fahrenheit)),
            )
            .build()
    }

    async fn call(&self, args: Arguments) -> Result<String, ToolError> {
        let location = args.string("location")?;
        let unit = args.enumeration::<Unit>("unit")?;
        let reading = read_temperature(unit);

        tracing::debug!(location, %unit, reading, "Simulated temperature reading");
        Ok(format!(
            "The temperature in {location} is {reading} degrees {unit}."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_stay_in_range() {
        for unit in Unit::VARIANTS {
            for _ in 0..500 {
                assert!(unit.range().contains(&read_temperature(*unit)));
            }
        }
    }

    #[test]
    fn unit_defaults_to_fahrenheit() {
        let descriptor = CurrentTemperatureTool.descriptor().unwrap();
        let unit = descriptor.parameter("unit").unwrap();
        assert!(!unit.required());
        assert_eq!(unit.default(), Some(&ArgValue::Enum("Fahrenheit".into())));
        assert!(descriptor.parameter("location").unwrap().required());
    }
}
