//! Builders for test inputs and helpers for inspecting synthesized templates.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use sitestack::stack::{Environment, StackProps};
use sitestack::template::Template;

pub const TEST_DOMAIN: &str = "example.com";
pub const TEST_ZONE_ID: &str = "Z0123456789ABCDEFGHIJ";
pub const TEST_ACCOUNT: &str = "123456789012";

/// Builder for `StackProps` with a fixed account so output is reproducible.
pub struct PropsBuilder {
    domain_name: Option<String>,
    hosted_zone_id: Option<String>,
    stack_name: Option<String>,
    env: Environment,
}

impl PropsBuilder {
    pub fn new() -> Self {
        Self {
            domain_name: Some(TEST_DOMAIN.to_string()),
            hosted_zone_id: None,
            stack_name: None,
            env: Environment::with_account(TEST_ACCOUNT),
        }
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.domain_name = Some(domain.to_string());
        self
    }

    pub fn no_domain(mut self) -> Self {
        self.domain_name = None;
        self
    }

    pub fn existing_zone(mut self, zone_id: &str) -> Self {
        self.hosted_zone_id = Some(zone_id.to_string());
        self
    }

    pub fn stack_name(mut self, name: &str) -> Self {
        self.stack_name = Some(name.to_string());
        self
    }

    pub fn unresolved_account(mut self) -> Self {
        self.env = Environment::unresolved();
        self
    }

    pub fn build(self) -> StackProps {
        let mut props = StackProps::default().with_env(self.env);
        props.domain_name = self.domain_name;
        props.hosted_zone_id = self.hosted_zone_id;
        if let Some(name) = self.stack_name {
            props.stack_name = name;
        }
        props
    }
}

impl Default for PropsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A temporary config directory that is removed on drop.
pub struct ConfigDir {
    temp_dir: TempDir,
}

impl ConfigDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write config file");
        path
    }
}

/// Path to a directory under `tests/fixtures`.
pub fn fixtures_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// The `Properties` of a declared resource, as JSON.
pub fn properties(template: &Template, logical_id: &str) -> Value {
    template
        .resource(logical_id)
        .unwrap_or_else(|| panic!("{} not declared", logical_id))
        .properties
        .clone()
}

/// The `Ref` target of a value such as `{"Ref": "X"}`.
pub fn ref_target(value: &Value) -> Option<&str> {
    value.get("Ref").and_then(Value::as_str)
}

/// The resource named by `{"Fn::GetAtt": ["X", "Attr"]}`.
pub fn get_att_target(value: &Value) -> Option<&str> {
    value
        .get("Fn::GetAtt")
        .and_then(|v| v.get(0))
        .and_then(Value::as_str)
}

/// Every `Ref` and `Fn::GetAtt` target inside `value`, in document order.
pub fn referenced_ids(value: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    collect_ids(value, &mut ids);
    ids
}

fn collect_ids(value: &Value, ids: &mut Vec<String>) {
    if let Some(target) = ref_target(value).or_else(|| get_att_target(value)) {
        ids.push(target.to_string());
        return;
    }
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_ids(v, ids)),
        Value::Object(map) => map.values().for_each(|v| collect_ids(v, ids)),
        _ => {}
    }
}
