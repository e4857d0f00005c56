//! The tool trait.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::{context::ToolContext, definition::ToolDefinition, return_types::ToolResult};

/// A capability the agent can invoke on behalf of a caller.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use agentauth_tools::{Tool, ToolContext, ToolDefinition, ToolResult, ToolReturn};
///
/// struct WhoAmI;
///
/// #[async_trait]
/// impl Tool for WhoAmI {
///     fn definition(&self) -> ToolDefinition {
///         ToolDefinition::new("whoami", "Report the caller id")
///     }
///
///     async fn call(&self, ctx: &ToolContext, _args: serde_json::Value) -> ToolResult {
///         Ok(ToolReturn::text(ctx.caller_id.clone()))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool<Deps = ()>: Send + Sync {
    /// Schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool for `ctx.caller_id`.
    async fn call(&self, ctx: &ToolContext<Deps>, args: JsonValue) -> ToolResult;

    /// Advertised name.
    fn name(&self) -> String {
        self.definition().name
    }
}
