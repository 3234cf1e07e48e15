//! # aegis-gateway
//!
//! The Aegis request orchestrator: an HTTP reverse proxy that mediates
//! agent tool calls. Each `POST /tools/{tool}/{action}` is evaluated
//! against the current policy snapshot; permitted calls are forwarded to
//! the configured adapter with the original body, denied calls are
//! rejected with a structured reason, and both paths emit one audit
//! record and one request span.

mod adapters;
mod config;
mod error;
mod server;
mod telemetry;

pub use adapters::AdapterRouter;
pub use config::GatewayConfig;
pub use error::{ApiError, ErrorKind, GatewayError};
pub use server::{router, AppState};
