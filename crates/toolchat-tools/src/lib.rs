//! # toolchat-tools
//!
//! The host functions toolchat offers to the model.
//!
//! | Tool | Parameters | Returns |
//! |------|------------|---------|
//! | `GetCurrentTemperature` | `location`, `unit` (`Celsius`/`Fahrenheit`, default `Fahrenheit`) | a simulated reading |
//! | `GetCountiesInState` | `state` | a fixed county list for Utah |

pub mod svckit;

use std::time::Duration;

use toolchat_core::{Result, ToolRegistry};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{CountiesInStateTool, CurrentTemperatureTool};
}

/// Registry with every built-in tool, in advertisement order
pub fn registry(tool_timeout: Duration) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new().with_timeout(tool_timeout);
    registry.register(tools::CountiesInStateTool)?;
    registry.register(tools::CurrentTemperatureTool)?;

    tracing::info!(tools = ?registry.names(), "Tool registry ready");
    Ok(registry)
}
