// telemetry.rs — Per-request span binding.
//
// Every tool call runs under a `gateway.handleToolRequest` span carrying
// a fresh hex trace id. Decision attributes are recorded onto the span
// once evaluation completes, and the same trace id lands in the audit
// record so log lines and spans correlate.

use std::time::Instant;

use tracing::{field::Empty, info_span, Span};
use uuid::Uuid;

use aegis_policy::Decision;

/// Span, trace id, and start instant for one tool call.
pub struct RequestSpan {
    pub span: Span,
    pub trace_id: String,
    started: Instant,
}

impl RequestSpan {
    /// Open the request span and start the latency clock.
    pub fn begin(tool: &str, action: &str) -> Self {
        let trace_id = Uuid::new_v4().simple().to_string();
        let span = info_span!(
            "gateway.handleToolRequest",
            trace_id = %trace_id,
            agent.id = Empty,
            tool.name = %tool,
            tool.action = %action,
            decision.allow = Empty,
            policy.version = Empty,
            params.hash = Empty,
            latency.ms = Empty,
            parent.agent = Empty,
        );
        Self {
            span,
            trace_id,
            started: Instant::now(),
        }
    }

    /// Elapsed time since `begin`, as milliseconds with microsecond
    /// precision (elapsed microseconds divided by 1000).
    pub fn latency_ms(&self) -> f64 {
        self.started.elapsed().as_micros() as f64 / 1000.0
    }

    /// Record the decision attributes onto the span.
    pub fn record_decision(
        &self,
        agent: &str,
        decision: &Decision,
        params_hash: &str,
        latency_ms: f64,
        parent_agent: Option<&str>,
    ) {
        self.span.record("agent.id", agent);
        self.span.record("decision.allow", decision.allow);
        self.span.record("policy.version", decision.version);
        self.span.record("params.hash", params_hash);
        self.span.record("latency.ms", latency_ms);
        if let Some(parent) = parent_agent {
            self.span.record("parent.agent", parent);
        }
    }
}
