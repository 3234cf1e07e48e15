//! # aegis-policy
//!
//! Declarative agent permissions for the Aegis gateway.
//!
//! Policies are YAML documents, one per file, declaring which agents may
//! invoke which tool-actions under which conditions. The [`PolicyStore`]
//! owns the current [`PolicyModel`] and replaces it atomically on reload
//! (triggered by the [`PolicyWatcher`] or the manual endpoint); the
//! [`Evaluator`] decides each request against an immutable snapshot.

mod conditions;
mod error;
mod evaluator;
mod model;
mod store;
mod watcher;

pub use conditions::{ConditionCheck, ConditionRegistry, Predicate};
pub use error::PolicyError;
pub use evaluator::Evaluator;
pub use model::{AgentRule, ConditionValue, Decision, Permission, Policy, PolicyModel};
pub use store::PolicyStore;
pub use watcher::PolicyWatcher;
