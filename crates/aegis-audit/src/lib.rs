//! # aegis-audit
//!
//! PII-safe audit trail for the Aegis gateway: deterministic parameter
//! fingerprints and a dual-sink (stdout + append-only JSONL file)
//! record emitter. Every reached decision produces exactly one
//! [`AuditRecord`]; request parameters never appear in the record, only
//! their canonical SHA-256 digest.

mod emitter;
mod error;
mod hasher;
mod record;

pub use emitter::AuditEmitter;
pub use error::AuditError;
pub use hasher::{hash_bytes, hash_value};
pub use record::AuditRecord;
