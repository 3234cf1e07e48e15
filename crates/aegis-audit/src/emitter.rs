// emitter.rs — Dual-sink audit emission: stdout plus an append-only file.
//
// stdout is the sink of record; the file is best-effort. File writes are
// serialized behind a mutex and flushed per record so concurrent
// requests never interleave lines. A file failure is logged and never
// surfaced to the request path.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::error::AuditError;
use crate::record::AuditRecord;

/// Emits audit records as single JSON lines to stdout and, when
/// available, an append-only log file.
pub struct AuditEmitter {
    file: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
}

impl AuditEmitter {
    /// Open (or create) the log file in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            file: Some(Mutex::new(BufWriter::new(file))),
            path: Some(path),
        })
    }

    /// Emitter with no file sink; records still go to stdout.
    pub fn stdout_only() -> Self {
        Self {
            file: None,
            path: None,
        }
    }

    /// Path of the file sink, if one is attached.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Emit one record to both sinks. Never fails.
    pub fn emit(&self, record: &AuditRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "audit record serialization failed");
                return;
            }
        };
        println!("{}", line);
        if let Some(file) = &self.file {
            let mut writer = file.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                warn!(error = %err, "audit file write failed, stdout record retained");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;
    use tempfile::tempdir;

    fn record(agent: &str, allow: bool) -> AuditRecord {
        AuditRecord {
            timestamp: Utc::now(),
            trace_id: String::new(),
            agent_id: agent.to_string(),
            tool: "payments".to_string(),
            action: "create".to_string(),
            decision_allow: allow,
            reason: "Policy allows this action".to_string(),
            policy_version: 1,
            params_hash: "0".repeat(64),
            latency_ms: 1.25,
            parent_agent: None,
        }
    }

    #[test]
    fn emits_one_line_per_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let emitter = AuditEmitter::open(&path).unwrap();

        emitter.emit(&record("agent-1", true));
        emitter.emit(&record("agent-2", false));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        let second: AuditRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first.agent_id, "agent-1");
        assert!(!second.decision_allow);
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");

        AuditEmitter::open(&path).unwrap().emit(&record("a", true));
        AuditEmitter::open(&path).unwrap().emit(&record("b", true));

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn stdout_only_emitter_does_not_fail() {
        let emitter = AuditEmitter::stdout_only();
        assert!(emitter.path().is_none());
        emitter.emit(&record("agent-1", true));
    }

    #[test]
    fn open_fails_on_unwritable_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-subdir").join("audit.log");
        assert!(matches!(
            AuditEmitter::open(&path),
            Err(AuditError::OpenFailed { .. })
        ));
    }
}
