//! Reply envelope sent from the agent to its chat front end.
//!
//! The front end renders `auth` replies as a consent link, `response`
//! replies as chat text, and `error` replies as a failure banner.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::return_types::{ToolResult, ToolReturnContent, AUTH_REQUIRED_PREFIX};

/// Agent reply, tagged by `type`.
///
/// ```rust
/// use agentauth_tools::AgentReply;
///
/// let reply = AgentReply::response("hello");
/// assert_eq!(
///     serde_json::to_value(&reply).unwrap(),
///     serde_json::json!({"type": "response", "text": "hello"})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AgentReply {
    /// The user must open a consent URL.
    Auth {
        /// Consent URL.
        url: Url,
    },
    /// Regular answer.
    Response {
        /// Answer text.
        text: String,
    },
    /// Failure.
    Error {
        /// Message for the user.
        text: String,
    },
}

impl AgentReply {
    /// Create a response reply.
    pub fn response(text: impl Into<String>) -> Self {
        Self::Response { text: text.into() }
    }

    /// Create an error reply.
    pub fn error(text: impl Into<String>) -> Self {
        Self::Error { text: text.into() }
    }

    /// Map a tool result onto a reply.
    pub fn from_tool_result(result: &ToolResult) -> Self {
        match result {
            Ok(ret) => match &ret.content {
                ToolReturnContent::AuthorizationRequired { url, .. } => {
                    Self::Auth { url: url.clone() }
                }
                ToolReturnContent::Error(info) => Self::error(info.message.clone()),
                _ => Self::response(ret.to_model_text()),
            },
            Err(err) => Self::error(err.user_message()),
        }
    }

    /// Map free-form agent output onto a reply.
    ///
    /// Output that starts with the auth-required marker followed by a valid
    /// URL becomes an `auth` reply; empty output becomes a placeholder
    /// response.
    pub fn from_agent_text(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix(AUTH_REQUIRED_PREFIX) {
            if let Ok(url) = Url::parse(rest.trim()) {
                return Self::Auth { url };
            }
        }
        if text.trim().is_empty() {
            return Self::response("Empty response.");
        }
        Self::response(text)
    }

    /// Check if this is an auth reply.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolError;
    use crate::return_types::ToolReturn;
    use agentauth_core::AuthError;
    use pretty_assertions::assert_eq;

    fn consent() -> Url {
        Url::parse("https://github.com/login/oauth/authorize?state=abc").unwrap()
    }

    #[test]
    fn test_authorization_required_becomes_auth() {
        let result: ToolResult = Ok(ToolReturn::authorization_required(consent(), "S1"));
        let reply = AgentReply::from_tool_result(&result);
        assert_eq!(reply, AgentReply::Auth { url: consent() });
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            serde_json::json!({"type": "auth", "url": consent().as_str()})
        );
    }

    #[test]
    fn test_awaiting_consent_is_plain_response() {
        let result: ToolResult = Ok(ToolReturn::awaiting_consent("S1", 2));
        let reply = AgentReply::from_tool_result(&result);
        assert!(matches!(reply, AgentReply::Response { .. }));
        assert!(!serde_json::to_string(&reply).unwrap().contains("github.com"));
    }

    #[test]
    fn test_auth_error_becomes_error_with_remediation() {
        let result: ToolResult = Err(ToolError::from(AuthError::AuthDenied {
            session_id: "S1".into(),
        }));
        match AgentReply::from_tool_result(&result) {
            AgentReply::Error { text } => assert!(text.contains("Access was denied")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_agent_text() {
        let marked = format!("{AUTH_REQUIRED_PREFIX}{}", consent());
        assert_eq!(
            AgentReply::from_agent_text(&marked),
            AgentReply::Auth { url: consent() }
        );
        assert_eq!(
            AgentReply::from_agent_text("  "),
            AgentReply::response("Empty response.")
        );
        assert_eq!(
            AgentReply::from_agent_text(&format!("{AUTH_REQUIRED_PREFIX}not a url")),
            AgentReply::response(format!("{AUTH_REQUIRED_PREFIX}not a url"))
        );
    }

    #[test]
    fn test_deserialize() {
        let reply: AgentReply =
            serde_json::from_str(r#"{"type":"error","text":"Invalid session ID."}"#).unwrap();
        assert_eq!(reply, AgentReply::error("Invalid session ID."));
    }
}
