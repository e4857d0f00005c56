//! What tools hand back to the agent runtime.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{ToolError, ToolErrorInfo};

/// Prefix marking an authorization-required answer in model-facing text.
pub const AUTH_REQUIRED_PREFIX: &str = "__AUTH_REQUIRED__";

/// Result type for tool execution.
pub type ToolResult = Result<ToolReturn, ToolError>;

/// Content of a tool return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolReturnContent {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// Structured data.
    Json {
        /// The value.
        value: serde_json::Value,
    },
    /// The user must open the consent URL. Produced once per session.
    AuthorizationRequired {
        /// Consent URL.
        url: Url,
        /// Session awaiting consent.
        session_id: String,
    },
    /// Consent was already requested and is still outstanding.
    AwaitingConsent {
        /// Session awaiting consent.
        session_id: String,
        /// Polls issued so far.
        attempts: u32,
    },
    /// The tool failed in a way the model should see.
    Error(ToolErrorInfo),
}

/// What a tool returns after execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolReturn {
    /// The content returned by the tool.
    pub content: ToolReturnContent,
    /// The tool call ID this is responding to.
    pub tool_call_id: Option<String>,
}

impl ToolReturn {
    fn from_content(content: ToolReturnContent) -> Self {
        Self {
            content,
            tool_call_id: None,
        }
    }

    /// Create a text return.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::from_content(ToolReturnContent::Text { text: s.into() })
    }

    /// Create a JSON return.
    #[must_use]
    pub fn json(value: serde_json::Value) -> Self {
        Self::from_content(ToolReturnContent::Json { value })
    }

    /// Create an authorization-required return.
    #[must_use]
    pub fn authorization_required(url: Url, session_id: impl Into<String>) -> Self {
        Self::from_content(ToolReturnContent::AuthorizationRequired {
            url,
            session_id: session_id.into(),
        })
    }

    /// Create an awaiting-consent return.
    #[must_use]
    pub fn awaiting_consent(session_id: impl Into<String>, attempts: u32) -> Self {
        Self::from_content(ToolReturnContent::AwaitingConsent {
            session_id: session_id.into(),
            attempts,
        })
    }

    /// Create an error return.
    #[must_use]
    pub fn error(err: &ToolError) -> Self {
        Self::from_content(ToolReturnContent::Error(err.into()))
    }

    /// Set the tool call ID.
    #[must_use]
    pub fn with_call_id(mut self, id: impl Into<String>) -> Self {
        self.tool_call_id = Some(id.into());
        self
    }

    /// Check if this is an error return.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.content, ToolReturnContent::Error(_))
    }

    /// Check if the call is blocked on user consent.
    #[must_use]
    pub fn needs_consent(&self) -> bool {
        matches!(
            self.content,
            ToolReturnContent::AuthorizationRequired { .. } | ToolReturnContent::AwaitingConsent { .. }
        )
    }

    /// Get the content as JSON if applicable.
    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match &self.content {
            ToolReturnContent::Json { value } => Some(value),
            _ => None,
        }
    }

    /// Render the return as text for the model.
    #[must_use]
    pub fn to_model_text(&self) -> String {
        match &self.content {
            ToolReturnContent::Text { text } => text.clone(),
            ToolReturnContent::Json { value } => value.to_string(),
            ToolReturnContent::AuthorizationRequired { url, .. } => {
                format!("{AUTH_REQUIRED_PREFIX}{url}")
            }
            ToolReturnContent::AwaitingConsent { .. } => {
                "Authorization is still pending. Ask the user to finish approving access, then call this tool again.".to_string()
            }
            ToolReturnContent::Error(info) => format!("Error: {}", info.message),
        }
    }
}
