//! Counties Lookup Tool

use async_trait::async_trait;

use toolchat_core::{
    Arguments, ParameterDescriptor, Result as CoreResult, Tool, ToolDescriptor, ToolError,
};

pub const UNRECOGNIZED_STATE: &str =
    "Unrecognized state. Please ensure that it is a valid state in the United States.";

fn counties_in(state: &str) -> String {
    if state.eq_ignore_ascii_case("utah") {
        format!("The counties in {state} are \"Salt Lake\", \"Utah\", and \"St George\"")
    } else {
        UNRECOGNIZED_STATE.to_owned()
    }
}

/// Tool for listing the counties of a US state
#[derive(Debug, Default, Clone, Copy)]
pub struct CountiesInStateTool;

#[async_trait]
impl Tool for CountiesInStateTool {
    fn descriptor(&self) -> CoreResult<ToolDescriptor> {
        ToolDescriptor::builder("GetCountiesInState")
            .description("Retrieves a JSON array of all counties in the given state")
            .param(ParameterDescriptor::string("state").describe("The state to get the counties for"))
            .build()
    }

    async fn call(&self, args: Arguments) -> Result<String, ToolError> {
        Ok(counties_in(args.string("state")?))
    }
}
