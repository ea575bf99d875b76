//! Ollama `/api/chat` wire types
//!
//! Request bodies are built from core turns; every NDJSON line of the
//! response is decoded into a [`ChatChunk`] and converted to a core
//! [`Fragment`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use toolchat_core::{
    ChatError, ChatRequest, Fragment, GenerationOptions, Result, Role, TokenUsage, ToolCall, Turn,
};

#[derive(Debug, Serialize)]
pub struct ChatBody<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    pub stream: bool,
    pub options: WireOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub think: Option<bool>,
}

impl<'a> ChatBody<'a> {
    pub fn from_request(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: request.turns.iter().map(WireMessage::from_turn).collect(),
            tools: request.tools.iter().map(|d| d.to_wire()).collect(),
            stream: request.stream,
            options: WireOptions::from(&request.options),
            think: request.options.think,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WireOptions {
    pub temperature: f32,
    pub num_ctx: u32,
}

impl From<&GenerationOptions> for WireOptions {
    fn from(opts: &GenerationOptions) -> Self {
        Self {
            temperature: opts.temperature,
            num_ctx: opts.num_ctx,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl WireMessage {
    fn from_turn(turn: &Turn) -> Self {
        let role = match turn.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        Self {
            role: role.into(),
            content: turn.content.clone(),
            thinking: turn.thinking.clone(),
            tool_calls: turn.tool_calls.iter().map(WireToolCall::from_call).collect(),
            tool_name: turn.tool_name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub function: WireFunction,
}

impl WireToolCall {
    fn from_call(call: &ToolCall) -> Self {
        Self {
            id: Some(call.id.clone()),
            function: WireFunction {
                name: call.name.clone(),
                arguments: call
                    .unparsed_arguments
                    .clone()
                    .map_or_else(|| Value::Object(call.arguments.clone()), Value::String),
            },
        }
    }

    fn into_call(self) -> ToolCall {
        // some models send the arguments object as an encoded string
        let name = self.function.name;
        let call = match self.function.arguments {
            Value::Object(map) => ToolCall::new(name, map),
            Value::Null => ToolCall::new(name, Map::new()),
            Value::String(s) if s.trim().is_empty() => ToolCall::new(name, Map::new()),
            Value::String(s) => match serde_json::from_str::<Map<String, Value>>(&s) {
                Ok(map) => ToolCall::new(name, map),
                Err(e) => {
                    tracing::debug!(tool = %name, error = %e, "Undecodable tool arguments");
                    ToolCall::unparsed(name, s)
                }
            },
            other => ToolCall::unparsed(name, other.to_string()),
        };
        match self.id {
            Some(id) if !id.is_empty() => call.with_id(id),
            _ => call,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// One line of a `/api/chat` response
#[derive(Debug, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatChunk {
    pub fn into_fragment(self) -> Result<Fragment> {
        if let Some(error) = self.error {
            return Err(ChatError::Provider(error));
        }

        let message = self.message.unwrap_or_default();
        let usage = (self.prompt_eval_count.is_some() || self.eval_count.is_some()).then(|| {
            TokenUsage {
                prompt_tokens: self.prompt_eval_count.unwrap_or(0),
                generated_tokens: self.eval_count.unwrap_or(0),
            }
        });

        Ok(Fragment {
            thinking: message.thinking,
            content: Some(message.content).filter(|c| !c.is_empty()),
            tool_calls: message
                .tool_calls
                .into_iter()
                .map(WireToolCall::into_call)
                .collect(),
            usage,
            done: self.done,
        })
    }
}

/// Decode one NDJSON line
pub fn parse_line(line: &str) -> Result<Fragment> {
    let chunk: ChatChunk = serde_json::from_str(line)
        .map_err(|e| ChatError::Decode(format!("{e}: {line}")))?;
    chunk.into_fragment()
}

/// `GET /api/tags` response
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
pub struct TagModel {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub details: Option<TagDetails>,
}

#[derive(Debug, Deserialize)]
pub struct TagDetails {
    #[serde(default)]
    pub parameter_size: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolchat_core::{ParameterDescriptor, ToolDescriptor};

    fn request() -> ChatRequest {
        let descriptor = ToolDescriptor::builder("GetCountiesInState")
            .description("Retrieves the counties in the given state")
            .param(ParameterDescriptor::string("state").describe("The state"))
            .build()
            .unwrap();
        let call = ToolCall::new(
            "GetCountiesInState",
            json!({"state": "Utah"}).as_object().cloned().unwrap(),
        )
        .with_id("call_0");

        ChatRequest {
            model: "qwen3-vl:4b".into(),
            turns: vec![
                Turn::user("Counties in Utah?"),
                Turn::assistant("", Some("Look it up.".into()), vec![call]),
                Turn::tool_result("GetCountiesInState", "Salt Lake"),
            ],
            tools: vec![descriptor],
            stream: true,
            options: GenerationOptions::default(),
        }
    }

    #[test]
    fn request_body_shape() {
        let request = request();
        let body = serde_json::to_value(ChatBody::from_request(&request)).unwrap();

        assert_eq!(body["model"], "qwen3-vl:4b");
        assert_eq!(body["stream"], true);
        assert_eq!(body["options"]["num_ctx"], 4096);
        assert!(body.get("think").is_none());
        assert_eq!(body["tools"][0]["function"]["name"], "GetCountiesInState");

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages[0], json!({"role": "user", "content": "Counties in Utah?"}));
        assert_eq!(messages[1]["thinking"], "Look it up.");
        assert_eq!(
            messages[1]["tool_calls"][0]["function"],
            json!({"name": "GetCountiesInState", "arguments": {"state": "Utah"}})
        );
        assert_eq!(messages[2]["role"], "tool");
        assert_eq!(messages[2]["tool_name"], "GetCountiesInState");
    }

    #[test]
    fn tools_omitted_when_disabled() {
        let mut request = request();
        request.tools.clear();
        request.options.think = Some(false);
        let body = serde_json::to_value(ChatBody::from_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert_eq!(body["think"], false);
    }

    #[test]
    fn thinking_line() {
        let fragment = parse_line(
            r#"{"model":"m","message":{"role":"assistant","content":"","thinking":"Hmm"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(fragment.thinking.as_deref(), Some("Hmm"));
        assert_eq!(fragment.content, None);
        assert!(!fragment.done);
    }

    #[test]
    fn tool_call_line_gets_an_id() {
        let fragment = parse_line(
            r#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"GetCurrentTemperature","arguments":{"location":"Paris"}}}]},"done":false}"#,
        )
        .unwrap();
        let call = &fragment.tool_calls[0];
        assert_eq!(call.name, "GetCurrentTemperature");
        assert_eq!(call.arguments["location"], "Paris");
        assert!(!call.id.is_empty());
    }

    #[test]
    fn encoded_argument_string_is_decoded() {
        let fragment = parse_line(
            r#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"GetCurrentTemperature","arguments":"{\"location\":\"Paris\"}"}}]},"done":false}"#,
        )
        .unwrap();
        let call = &fragment.tool_calls[0];
        assert_eq!(call.arguments["location"], "Paris");
        assert_eq!(call.unparsed_arguments, None);
    }

    #[test]
    fn malformed_argument_string_is_kept_for_reporting() {
        let fragment = parse_line(
            r#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"GetCurrentTemperature","arguments":"{location: Paris"}}]},"done":false}"#,
        )
        .unwrap();
        let call = &fragment.tool_calls[0];
        assert!(call.arguments.is_empty());
        assert_eq!(call.unparsed_arguments.as_deref(), Some("{location: Paris"));

        // sent back to the model as it was received
        let wire = WireToolCall::from_call(call);
        assert_eq!(wire.function.arguments, json!("{location: Paris"));
    }

    #[test]
    fn final_line_carries_usage() {
        let fragment = parse_line(
            r#"{"message":{"role":"assistant","content":""},"done":true,"prompt_eval_count":312,"eval_count":41}"#,
        )
        .unwrap();
        assert!(fragment.done);
        assert_eq!(
            fragment.usage,
            Some(TokenUsage {
                prompt_tokens: 312,
                generated_tokens: 41
            })
        );
    }

    #[test]
    fn error_line_is_provider_error() {
        let err = parse_line(r#"{"error":"model 'nope' not found"}"#).unwrap_err();
        assert!(matches!(err, ChatError::Provider(ref m) if m.contains("nope")));
    }

    #[test]
    fn garbage_is_decode_error() {
        assert!(matches!(parse_line("not json"), Err(ChatError::Decode(_))));
    }
}
