// evaluator.rs — Policy evaluation.
//
// Stateless over a PolicyModel snapshot: files in stable order, agents
// and permissions in declared order. The first permission matching
// (agent, tool, action) decides the request; a failing condition on
// that permission is terminal and never falls through to a later
// permission that might have allowed the call.

use serde_json::{Map, Value};

use crate::conditions::{ConditionCheck, ConditionRegistry};
use crate::model::{Decision, PolicyModel};

/// Decides requests against policy model snapshots.
pub struct Evaluator {
    registry: ConditionRegistry,
}

impl Evaluator {
    /// Evaluator with the built-in condition predicates.
    pub fn new() -> Self {
        Self {
            registry: ConditionRegistry::builtin(),
        }
    }

    /// Evaluator with a custom predicate registry.
    pub fn with_registry(registry: ConditionRegistry) -> Self {
        Self { registry }
    }

    /// Decide whether `agent` may invoke `action` on `tool` with `params`.
    ///
    /// Deterministic for a given snapshot: same inputs, same decision.
    pub fn evaluate(
        &self,
        model: &PolicyModel,
        agent: &str,
        tool: &str,
        action: &str,
        params: &Map<String, Value>,
    ) -> Decision {
        for (_file, policy) in model.iter() {
            for rule in &policy.agents {
                if rule.id != agent {
                    continue;
                }
                for permission in &rule.allow {
                    if permission.tool != tool {
                        continue;
                    }
                    if !permission.actions.iter().any(|a| a == action) {
                        continue;
                    }
                    // First (agent, tool, action) match decides.
                    for (name, value) in &permission.conditions {
                        if let ConditionCheck::Denied(reason) =
                            self.registry.check(name, value, params)
                        {
                            return Decision::denied(reason, policy.version);
                        }
                    }
                    return Decision::allowed(policy.version);
                }
            }
        }
        Decision::denied(
            format!(
                "No policy found for agent={}, tool={}, action={}",
                agent, tool, action
            ),
            0,
        )
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
