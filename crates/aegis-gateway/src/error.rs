// error.rs — Gateway errors and wire error shaping.
//
// The wire contract is a stable set of error kinds serialized as
// `{"error": <kind>, "reason": <string?>}`. Internal detail (file
// paths, parser positions) stays in the logs and never reaches the wire.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while constructing the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the config schema.
    #[error("failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Policy(#[from] aegis_policy::PolicyError),

    #[error(transparent)]
    Audit(#[from] aegis_audit::AuditError),
}

/// Stable error kinds surfaced on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    MissingHeader,
    InvalidRequest,
    PolicyViolation,
    AdapterNotFound,
    AdapterError,
    ReloadFailed,
}

/// A wire error: kind, optional reason, and the mapped status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: ErrorKind,
    reason: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl ApiError {
    pub fn missing_header(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: ErrorKind::MissingHeader,
            reason: Some(reason.into()),
        }
    }

    pub fn invalid_request(reason: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: ErrorKind::InvalidRequest,
            reason,
        }
    }

    pub fn policy_violation(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            kind: ErrorKind::PolicyViolation,
            reason: Some(reason.into()),
        }
    }

    pub fn adapter_not_found(tool: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: ErrorKind::AdapterNotFound,
            reason: Some(format!("No adapter configured for tool: {}", tool)),
        }
    }

    pub fn adapter_error(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            kind: ErrorKind::AdapterError,
            reason: Some(reason.into()),
        }
    }

    pub fn reload_failed(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: ErrorKind::ReloadFailed,
            reason: Some(reason.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind,
            reason: self.reason.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}
