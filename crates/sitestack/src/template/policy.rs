//! IAM policy documents as they appear inside templates.

use serde::ser::Serializer;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SynthError;

/// IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Who a resource-policy statement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Any principal (`"*"`).
    Any,
    /// An AWS service principal, e.g. `cloudfront.amazonaws.com`.
    Service(String),
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Principal::Any => serializer.serialize_str("*"),
            Principal::Service(service) => {
                let mut map = Map::new();
                map.insert("Service".to_string(), Value::String(service.clone()));
                map.serialize(serializer)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    #[serde(rename = "Sid", skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    #[serde(rename = "Effect")]
    pub effect: Effect,

    #[serde(rename = "Principal", skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,

    #[serde(rename = "Action")]
    pub actions: Vec<String>,

    #[serde(rename = "Resource")]
    pub resources: Vec<Value>,

    #[serde(rename = "Condition", skip_serializing_if = "Map::is_empty")]
    pub condition: Map<String, Value>,
}

impl Statement {
    fn new(effect: Effect, actions: &[&str]) -> Self {
        Self {
            sid: None,
            effect,
            principal: None,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources: Vec::new(),
            condition: Map::new(),
        }
    }

    pub fn allow(actions: &[&str]) -> Self {
        Self::new(Effect::Allow, actions)
    }

    pub fn deny(actions: &[&str]) -> Self {
        Self::new(Effect::Deny, actions)
    }

    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn on(mut self, resource: Value) -> Self {
        self.resources.push(resource);
        self
    }

    /// Adds `operator: { key: value }` to the condition block.
    pub fn when(mut self, operator: &str, key: &str, value: Value) -> Self {
        let entry = self
            .condition
            .entry(operator.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(keys) = entry {
            keys.insert(key.to_string(), value);
        }
        self
    }

    /// Looks up a condition value, e.g. `("StringEquals", "AWS:SourceArn")`.
    pub fn condition_value(&self, operator: &str, key: &str) -> Option<&Value> {
        self.condition.get(operator).and_then(|keys| keys.get(key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: &'static str,

    #[serde(rename = "Statement")]
    pub statements: Vec<Statement>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION,
            statements,
        }
    }

    pub fn to_value(&self) -> Result<Value, SynthError> {
        Ok(serde_json::to_value(self)?)
    }
}
