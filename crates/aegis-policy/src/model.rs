// model.rs — Policy documents and the evaluated decision.
//
// One Policy per YAML file. The aggregate of all loaded files is the
// PolicyModel; it is immutable once published, and a reload swaps in a
// whole new aggregate rather than patching the old one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// One policy file's worth of permissions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    /// Monotonic version hint; reported in decisions and audit records,
    /// never used for ordering during a reload.
    pub version: u32,

    /// Agent rules in declared order.
    pub agents: Vec<AgentRule>,
}

/// Permissions for a single agent id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRule {
    /// Matched against the `X-Agent-ID` request header.
    pub id: String,

    /// Permissions in declared order.
    #[serde(default)]
    pub allow: Vec<Permission>,
}

/// A grant of actions on one tool, optionally constrained by conditions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    pub tool: String,

    /// Action names; membership is what matters, order does not.
    pub actions: Vec<String>,

    /// Named condition parameters (e.g. `max_amount: 5000`).
    /// A BTreeMap keeps evaluation order stable across runs, so the
    /// winning deny reason is deterministic when several conditions fail.
    #[serde(default)]
    pub conditions: BTreeMap<String, ConditionValue>,
}

/// A condition parameter as written in policy YAML.
///
/// Untagged: YAML integers and floats both deserialize as `Number`,
/// strings as `Text`, sequences of strings as `TextList`. Anything else
/// falls through to `Other` and is handled as a malformed parameter by
/// the predicate that receives it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
    TextList(Vec<String>),
    Other(serde_yaml::Value),
}

/// The aggregate of all currently loaded policy files, keyed by file name.
///
/// Readers always see a complete aggregate: the store builds a fresh one
/// off to the side and publishes it with a single atomic swap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyModel {
    files: BTreeMap<String, Policy>,
}

impl PolicyModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: impl Into<String>, policy: Policy) {
        self.files.insert(file.into(), policy);
    }

    /// Iterate policies in file-name order (stable within a snapshot).
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Policy)> {
        self.files.iter()
    }

    pub fn get(&self, file: &str) -> Option<&Policy> {
        self.files.get(file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// The outcome of evaluating one request against a model snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub allow: bool,

    /// Required on deny, informational on allow.
    pub reason: String,

    /// `version` of the matched policy; zero when nothing matched.
    pub version: u32,
}

impl Decision {
    pub fn allowed(version: u32) -> Self {
        Self {
            allow: true,
            reason: "Policy allows this action".to_string(),
            version,
        }
    }

    pub fn denied(reason: impl Into<String>, version: u32) -> Self {
        Self {
            allow: false,
            reason: reason.into(),
            version,
        }
    }
}

impl Policy {
    /// Validate structural invariants before a policy may enter the model.
    ///
    /// Condition values are deliberately not checked here; a malformed
    /// condition parameter is the evaluator's problem, not a reason to
    /// drop the whole file.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.version < 1 {
            return Err(PolicyError::InvalidVersion {
                version: self.version,
            });
        }
        if self.agents.is_empty() {
            return Err(PolicyError::NoAgents);
        }
        for (index, rule) in self.agents.iter().enumerate() {
            if rule.id.is_empty() {
                return Err(PolicyError::EmptyAgentId { index });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINANCE_YAML: &str = r#"
version: 1
agents:
  - id: finance-agent
    allow:
      - tool: payments
        actions: [create, refund]
        conditions:
          max_amount: 5000
          currencies: [USD, EUR]
"#;

    #[test]
    fn parses_policy_yaml() {
        let policy: Policy = serde_yaml::from_str(FINANCE_YAML).unwrap();
        assert_eq!(policy.version, 1);
        assert_eq!(policy.agents.len(), 1);
        let rule = &policy.agents[0];
        assert_eq!(rule.id, "finance-agent");
        assert_eq!(rule.allow.len(), 1);
        let permission = &rule.allow[0];
        assert_eq!(permission.tool, "payments");
        assert_eq!(permission.actions, vec!["create", "refund"]);
        assert_eq!(permission.conditions.len(), 2);
    }

    #[test]
    fn condition_values_take_the_expected_shapes() {
        let policy: Policy = serde_yaml::from_str(FINANCE_YAML).unwrap();
        let conditions = &policy.agents[0].allow[0].conditions;
        assert_eq!(
            conditions.get("max_amount"),
            Some(&ConditionValue::Number(5000.0))
        );
        assert_eq!(
            conditions.get("currencies"),
            Some(&ConditionValue::TextList(vec![
                "USD".to_string(),
                "EUR".to_string()
            ]))
        );
    }

    #[test]
    fn float_and_integer_limits_both_parse_as_numbers() {
        let yaml = r#"
version: 2
agents:
  - id: a
    allow:
      - tool: payments
        actions: [create]
        conditions:
          max_amount: 5000.5
"#;
        let policy: Policy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            policy.agents[0].allow[0].conditions.get("max_amount"),
            Some(&ConditionValue::Number(5000.5))
        );
    }

    #[test]
    fn malformed_condition_value_parses_as_other() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: payments
        actions: [create]
        conditions:
          max_amount: true
"#;
        let policy: Policy = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            policy.agents[0].allow[0].conditions.get("max_amount"),
            Some(ConditionValue::Other(_))
        ));
    }

    #[test]
    fn missing_conditions_default_to_empty() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: files
        actions: [read]
"#;
        let policy: Policy = serde_yaml::from_str(yaml).unwrap();
        assert!(policy.agents[0].allow[0].conditions.is_empty());
    }

    #[test]
    fn validate_rejects_version_zero() {
        let policy = Policy {
            version: 0,
            agents: vec![AgentRule {
                id: "a".to_string(),
                allow: vec![],
            }],
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::InvalidVersion { version: 0 })
        ));
    }

    #[test]
    fn validate_rejects_empty_agents() {
        let policy = Policy {
            version: 1,
            agents: vec![],
        };
        assert!(matches!(policy.validate(), Err(PolicyError::NoAgents)));
    }

    #[test]
    fn validate_rejects_empty_agent_id() {
        let policy = Policy {
            version: 1,
            agents: vec![
                AgentRule {
                    id: "a".to_string(),
                    allow: vec![],
                },
                AgentRule {
                    id: String::new(),
                    allow: vec![],
                },
            ],
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::EmptyAgentId { index: 1 })
        ));
    }

    #[test]
    fn model_iterates_in_file_name_order() {
        let mut model = PolicyModel::new();
        let policy: Policy = serde_yaml::from_str(FINANCE_YAML).unwrap();
        model.insert("zz.yaml", policy.clone());
        model.insert("aa.yaml", policy);
        let names: Vec<&String> = model.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["aa.yaml", "zz.yaml"]);
    }
}
