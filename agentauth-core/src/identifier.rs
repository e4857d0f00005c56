//! Prefixed random identifiers for log correlation.

use uuid::Uuid;

/// Generate a unique flow ID, used to correlate log lines of one
/// `obtain_token` invocation.
///
/// # Example
///
/// ```rust
/// use agentauth_core::identifier::generate_flow_id;
///
/// let id = generate_flow_id();
/// assert!(id.starts_with("flow_"));
/// assert_eq!(id.len(), 37); // "flow_" + 32 hex chars
/// ```
#[must_use]
pub fn generate_flow_id() -> String {
    format!("flow_{}", Uuid::new_v4().simple())
}

/// Generate a unique run ID for a tool invocation.
#[must_use]
pub fn generate_run_id() -> String {
    format!("run_{}", Uuid::new_v4().simple())
}
