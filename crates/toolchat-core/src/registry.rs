//! Tool Registry
//!
//! Built once at startup, then shared read-only behind an `Arc`. Lookup,
//! coercion and invocation all go through [`ToolRegistry::invoke`].

use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::args::Arguments;
use crate::error::{ChatError, Result, ToolError};
use crate::schema::ToolDescriptor;
use crate::tool::{Tool, ToolCall};

/// Default upper bound on a single tool invocation
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

struct Entry {
    descriptor: ToolDescriptor,
    tool: Arc<dyn Tool>,
}

/// Registry for available tools, in registration order
pub struct ToolRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Set the per-invocation timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool. Duplicate names are a configuration error.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let descriptor = tool.descriptor()?;
        let name = descriptor.name().to_owned();

        if self.index.contains_key(&name) {
            return Err(ChatError::Config(format!(
                "tool '{name}' is registered twice"
            )));
        }

        tracing::debug!(tool = %name, params = descriptor.parameters().len(), "Registered tool");
        self.index.insert(name, self.entries.len());
        self.entries.push(Entry { descriptor, tool });
        Ok(())
    }

    /// Get a tool's descriptor by name
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.entries[i].descriptor)
    }

    /// All descriptors, in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.descriptor.name()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a tool call
    pub async fn invoke_call(&self, call: &ToolCall) -> std::result::Result<String, ToolError> {
        if let Some(raw) = &call.unparsed_arguments {
            if !self.index.contains_key(&call.name) {
                return Err(ToolError::NotFound(call.name.clone()));
            }
            tracing::warn!(tool = %call.name, raw = %raw, "Tool arguments are not a JSON object");
            return Err(ToolError::coercion(
                "arguments",
                "a JSON object",
                format!("could not parse {raw}"),
            ));
        }
        self.invoke(&call.name, &call.arguments).await
    }

    /// Look up `name`, coerce `raw` to its parameters and run it.
    ///
    /// Handler errors, panics and timeouts all surface as [`ToolError`].
    pub async fn invoke(
        &self,
        name: &str,
        raw: &Map<String, Value>,
    ) -> std::result::Result<String, ToolError> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ToolError::NotFound(name.to_owned()))?;

        let args = Arguments::bind(&entry.descriptor, raw)?;

        let started = Instant::now();
        let guarded = AssertUnwindSafe(entry.tool.call(args)).catch_unwind();
        let outcome = match tokio::time::timeout(self.timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(ToolError::Execution(panic_message(panic.as_ref()))),
            Err(_) => Err(ToolError::Execution(format!(
                "{name} did not finish within {}s",
                self.timeout.as_secs()
            ))),
        };

        let elapsed_ms = started.elapsed().as_millis();
        match &outcome {
            Ok(_) => tracing::info!(tool = name, elapsed_ms, "Tool finished"),
            Err(e) => tracing::warn!(tool = name, elapsed_ms, error = %e, "Tool failed"),
        }
        outcome
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "tool panicked".to_owned())
}
