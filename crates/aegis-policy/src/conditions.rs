// conditions.rs — Named condition predicates.
//
// Permissions carry an open-ended map of named parameters. Each name is
// looked up in a registry of predicates with a common signature; adding
// a predicate is one registry entry and the evaluator never changes.
// Unknown names are satisfied, so an older gateway tolerates policies
// written for a newer build. A malformed *parameter* (operator mistake
// in the policy file) is skipped with a warning; a missing or ill-typed
// *request field* denies the request.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::model::ConditionValue;

/// The outcome of a single condition check.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionCheck {
    /// The condition holds (or could not be applied and counts as held).
    Satisfied,
    /// The condition fails; the reason surfaces verbatim in the decision.
    Denied(String),
}

/// Predicate signature: the policy-side parameter and the request params.
pub type Predicate = fn(&ConditionValue, &Map<String, Value>) -> ConditionCheck;

/// Registry of condition predicates, keyed by condition name.
pub struct ConditionRegistry {
    predicates: HashMap<&'static str, Predicate>,
}

impl ConditionRegistry {
    /// Registry with the built-in predicates.
    pub fn builtin() -> Self {
        let mut registry = Self {
            predicates: HashMap::new(),
        };
        registry.register("max_amount", max_amount);
        registry.register("currencies", currencies);
        registry.register("folder_prefix", folder_prefix);
        registry
    }

    /// Register a predicate under a condition name.
    pub fn register(&mut self, name: &'static str, predicate: Predicate) {
        self.predicates.insert(name, predicate);
    }

    /// Check one named condition. Unknown names are satisfied.
    pub fn check(
        &self,
        name: &str,
        value: &ConditionValue,
        params: &Map<String, Value>,
    ) -> ConditionCheck {
        match self.predicates.get(name) {
            Some(predicate) => predicate(value, params),
            None => ConditionCheck::Satisfied,
        }
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// `max_amount`: the request `amount` must not exceed the limit.
/// Equality passes — the comparison is strict `>`.
fn max_amount(value: &ConditionValue, params: &Map<String, Value>) -> ConditionCheck {
    let max = match value {
        ConditionValue::Number(n) => *n,
        other => {
            warn!(condition = "max_amount", value = ?other, "malformed condition parameter, skipping");
            return ConditionCheck::Satisfied;
        }
    };
    let amount = match params.get("amount").and_then(Value::as_f64) {
        Some(amount) => amount,
        None => return ConditionCheck::Denied("Invalid amount parameter".to_string()),
    };
    if amount > max {
        ConditionCheck::Denied(format!("Amount {:.2} exceeds max_amount={:.2}", amount, max))
    } else {
        ConditionCheck::Satisfied
    }
}

/// `currencies`: the request `currency` must appear in the allowed list.
/// Matching is exact string equality, case-sensitive.
fn currencies(value: &ConditionValue, params: &Map<String, Value>) -> ConditionCheck {
    let allowed = match value {
        ConditionValue::TextList(list) => list,
        other => {
            warn!(condition = "currencies", value = ?other, "malformed condition parameter, skipping");
            return ConditionCheck::Satisfied;
        }
    };
    let currency = match params.get("currency").and_then(Value::as_str) {
        Some(currency) => currency,
        None => return ConditionCheck::Denied("Invalid currency parameter".to_string()),
    };
    if allowed.iter().any(|c| c == currency) {
        ConditionCheck::Satisfied
    } else {
        ConditionCheck::Denied(format!("Currency {} not in allowed list", currency))
    }
}

/// `folder_prefix`: the request `path` must start with the prefix,
/// byte for byte. Not path-component aware: `/hr-docs` does not match
/// the prefix `/hr-docs/`.
fn folder_prefix(value: &ConditionValue, params: &Map<String, Value>) -> ConditionCheck {
    let prefix = match value {
        ConditionValue::Text(prefix) => prefix,
        other => {
            warn!(condition = "folder_prefix", value = ?other, "malformed condition parameter, skipping");
            return ConditionCheck::Satisfied;
        }
    };
    let path = match params.get("path").and_then(Value::as_str) {
        Some(path) => path,
        None => return ConditionCheck::Denied("Invalid path parameter".to_string()),
    };
    if path.starts_with(prefix.as_str()) {
        ConditionCheck::Satisfied
    } else {
        ConditionCheck::Denied(format!(
            "Path {} does not match required prefix {}",
            path, prefix
        ))
    }
}
