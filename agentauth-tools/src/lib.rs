//! # agentauth-tools
//!
//! Agent-facing tools that need a delegated user token.
//!
//! ## Core Concepts
//!
//! - **[`Tool`]**: Trait for tools the agent can call on behalf of a caller
//! - **[`ToolContext`]**: Caller identity and dependencies passed to tools
//! - **[`ToolReturn`]**: Tool output, including the consent states
//! - **[`FetchProfileTool`]**: `fetch_github_profile`, backed by the consent
//!   flow and a [`ProfileSource`]
//! - **[`AgentReply`]**: `auth` / `response` / `error` envelope for the chat
//!   front end
//!
//! ## Example
//!
//! ```ignore
//! use agentauth_tools::{AgentReply, FetchProfileTool, Tool, ToolContext};
//!
//! let tool = FetchProfileTool::new(flow, source, "github-provider", scopes);
//! let result = tool.call(&ToolContext::new((), "user-42"), serde_json::Value::Null).await;
//! let reply = AgentReply::from_tool_result(&result);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod context;
pub mod definition;
pub mod errors;
pub mod profile;
pub mod reply;
pub mod return_types;
pub mod tool;

pub use context::ToolContext;
pub use definition::ToolDefinition;
pub use errors::{ToolError, ToolErrorInfo};
pub use profile::{FetchProfileTool, ProfileSource, DEFAULT_POLLS_PER_CALL, FETCH_PROFILE_TOOL};
pub use reply::AgentReply;
pub use return_types::{ToolResult, ToolReturn, ToolReturnContent, AUTH_REQUIRED_PREFIX};
pub use tool::Tool;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        AgentReply, FetchProfileTool, ProfileSource, Tool, ToolContext, ToolDefinition,
        ToolError, ToolResult, ToolReturn,
    };
}
