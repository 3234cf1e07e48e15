// record.rs — The audit record, one JSON line per reached decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single audit record. Field order here is the wire order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    /// When the decision was reached (UTC, RFC3339).
    pub timestamp: DateTime<Utc>,

    /// Hex trace id of the request span; empty when no span was active.
    pub trace_id: String,

    /// The agent from `X-Agent-ID`.
    pub agent_id: String,

    pub tool: String,
    pub action: String,

    pub decision_allow: bool,
    pub reason: String,

    /// Version of the matched policy; zero when no policy matched.
    pub policy_version: u32,

    /// Canonical SHA-256 fingerprint of the request parameters.
    pub params_hash: String,

    /// Wall-clock from request start to decision, in milliseconds.
    pub latency_ms: f64,

    /// Parent agent from `X-Parent-Agent`, captured for audit only.
    /// Omitted from the serialization when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_agent: Option<String>,
}
