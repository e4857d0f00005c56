//! Profile agent example.
//!
//! Calls the `fetch_github_profile` tool for one user against a running
//! identity broker, the way an agent runtime would on each chat turn, and
//! prints the reply envelope the chat front end would receive.
//!
//! Run with:
//! ```bash
//! AGENTAUTH_BROKER_URL=https://broker.example.com \
//! AGENTAUTH_ATTEMPTS_PER_CALL=6 \
//! cargo run --example profile_agent -- user-42
//! ```

use std::sync::Arc;

use agentauth::prelude::*;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Reports what it would fetch instead of calling GitHub.
struct DryRunProfile;

#[async_trait]
impl ProfileSource for DryRunProfile {
    async fn fetch(&self, token: &TokenResult) -> anyhow::Result<JsonValue> {
        Ok(serde_json::json!({
            "endpoint": "https://api.github.com/user",
            "authorization": "Bearer <redacted>",
            "token_obtained_at": token.obtained_at().to_rfc3339(),
        }))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    agentauth::init_tracing()?;

    let caller_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demo-user".to_string());

    let config = AuthConfig::from_env("AGENTAUTH")?;
    let flow = Arc::new(config.build_controller()?);

    let mut tool = FetchProfileTool::new(
        flow,
        Arc::new(DryRunProfile),
        config.provider_id.clone(),
        config.scopes.clone(),
    )
    .with_notifier(Arc::new(TracingNotifier));
    if let Some(url) = &config.callback_url {
        tool = tool.with_callback_url(url.clone());
    }

    let ctx = ToolContext::new((), caller_id);
    for turn in 1..=3 {
        let result = tool.call(&ctx, JsonValue::Null).await;
        let reply = AgentReply::from_tool_result(&result);
        println!("turn {turn}: {}", serde_json::to_string(&reply)?);

        let waiting = result.as_ref().is_ok_and(|ret| ret.needs_consent());
        if !waiting {
            break;
        }
    }

    Ok(())
}
