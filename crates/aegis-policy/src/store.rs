// store.rs — The policy store: load, validate, publish, reload.
//
// The store owns the currently published PolicyModel. Readers clone an
// Arc under a read lock held only for the pointer copy; reload builds a
// fresh aggregate off to the side and swaps it in under the write lock.
// No lock is ever held across file I/O, and a request that already took
// its snapshot is unaffected by a concurrent swap.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{info, warn};

use crate::error::PolicyError;
use crate::model::{Policy, PolicyModel};

/// File suffixes considered policy documents.
const YAML_SUFFIXES: [&str; 2] = [".yaml", ".yml"];

/// Owns the published policy model and the directory it loads from.
pub struct PolicyStore {
    dir: PathBuf,
    model: RwLock<Arc<PolicyModel>>,
    /// Serializes reloads: a reload in progress blocks the next one.
    reload_gate: Mutex<()>,
}

impl PolicyStore {
    /// Load the directory and construct the store.
    ///
    /// An unreadable directory is a hard error (startup-fatal in the
    /// daemon); individual broken files are skipped with a warning,
    /// exactly as during reload.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let dir = dir.as_ref().to_path_buf();
        let model = load_directory(&dir)?;
        info!(dir = %dir.display(), policies = model.len(), "policy store loaded");
        Ok(Self {
            dir,
            model: RwLock::new(Arc::new(model)),
            reload_gate: Mutex::new(()),
        })
    }

    /// The directory this store loads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The currently published model. Constant-time for any reader count.
    pub fn snapshot(&self) -> Arc<PolicyModel> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-run the load procedure and publish the result atomically.
    ///
    /// Per-file parse and validation failures are skipped; only a
    /// failure to enumerate the directory aborts, leaving the previously
    /// published model intact. Returns the number of loaded policies.
    pub fn reload(&self) -> Result<usize, PolicyError> {
        let _gate = self
            .reload_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let fresh = load_directory(&self.dir)?;
        let count = fresh.len();
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(fresh);
        info!(policies = count, "policy model reloaded");
        Ok(count)
    }
}

/// Enumerate `dir` non-recursively and build a model from every file
/// that parses and validates. Broken files are logged and skipped; a
/// reload never publishes a partially constructed aggregate.
fn load_directory(dir: &Path) -> Result<PolicyModel, PolicyError> {
    let entries = fs::read_dir(dir).map_err(|source| PolicyError::DirUnreadable {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut model = PolicyModel::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_policy_file(&path, &name) {
            continue;
        }
        match load_file(&path) {
            Ok(policy) => {
                model.insert(name, policy);
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping invalid policy file");
            }
        }
    }
    Ok(model)
}

fn load_file(path: &Path) -> Result<Policy, PolicyError> {
    let content = fs::read_to_string(path).map_err(|source| PolicyError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let policy: Policy = serde_yaml::from_str(&content).map_err(|source| PolicyError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    policy.validate()?;
    Ok(policy)
}

fn is_policy_file(path: &Path, name: &str) -> bool {
    YAML_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) && path.is_file()
}
