// config.rs — Gateway configuration.
//
// One YAML document describes the whole process: where to listen, where
// policies live, where audit records append, and which adapter serves
// each tool. The adapter map is immutable after startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Configuration for the gateway process.
///
/// ```yaml
/// listen: "127.0.0.1:8080"
/// policy_dir: "policies"
/// audit_log: "audit.log"
/// adapters:
///   payments: "http://localhost:9001"
///   files: "http://localhost:9002"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address the HTTP listener binds.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory of policy YAML files (watched for hot-reload).
    pub policy_dir: PathBuf,

    /// Append-only audit log path.
    pub audit_log: PathBuf,

    /// Tool name to adapter base URL.
    #[serde(default)]
    pub adapters: HashMap<String, String>,
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

impl GatewayConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| GatewayError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| GatewayError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_a_full_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aegis.yaml");
        std::fs::write(
            &path,
            "\
listen: \"0.0.0.0:8088\"
policy_dir: policies
audit_log: audit.log
adapters:
  payments: \"http://localhost:9001\"
  files: \"http://localhost:9002\"
",
        )
        .unwrap();

        let config = GatewayConfig::from_file(&path).unwrap();
        assert_eq!(config.listen, "0.0.0.0:8088");
        assert_eq!(config.policy_dir, PathBuf::from("policies"));
        assert_eq!(config.adapters.len(), 2);
        assert_eq!(
            config.adapters.get("payments").map(String::as_str),
            Some("http://localhost:9001")
        );
    }

    #[test]
    fn listen_and_adapters_have_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aegis.yaml");
        std::fs::write(&path, "policy_dir: policies\naudit_log: audit.log\n").unwrap();

        let config = GatewayConfig::from_file(&path).unwrap();
        assert_eq!(config.listen, "127.0.0.1:8080");
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn missing_file_is_a_config_read_error() {
        assert!(matches!(
            GatewayConfig::from_file("/definitely/not/here.yaml"),
            Err(GatewayError::ConfigRead { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_config_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aegis.yaml");
        std::fs::write(&path, "policy_dir: [").unwrap();
        assert!(matches!(
            GatewayConfig::from_file(&path),
            Err(GatewayError::ConfigParse { .. })
        ));
    }
}
