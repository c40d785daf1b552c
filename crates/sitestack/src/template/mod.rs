//! CloudFormation template document model.
//!
//! A [`Template`] keeps resources and outputs in declaration order so the
//! rendered JSON is stable between runs.

pub mod intrinsic;
pub mod policy;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::error::SynthError;

pub use intrinsic::{get_att, join, ref_to, sub, ACCOUNT_ID, PARTITION};
pub use policy::{Effect, PolicyDocument, Principal, Statement};

/// The only template format version CloudFormation accepts.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// What CloudFormation does with a resource when it leaves the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    Delete,
    Retain,
}

/// A single entry in the template's `Resources` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDecl {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(rename = "Properties", skip_serializing_if = "Value::is_null")]
    pub properties: Value,

    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,

    #[serde(rename = "UpdateReplacePolicy", skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<DeletionPolicy>,
}

impl ResourceDecl {
    pub fn new(resource_type: impl Into<String>, properties: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    /// Adds an explicit ordering edge that no property reference expresses.
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    /// Sets both the deletion and the update-replace policy.
    pub fn removal_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }

    /// Looks up a top-level property.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// Export block of an output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Export {
    #[serde(rename = "Name")]
    pub name: Value,
}

/// A single entry in the template's `Outputs` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDecl {
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Value")]
    pub value: Value,

    #[serde(rename = "Export", skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

impl OutputDecl {
    pub fn new(value: Value) -> Self {
        Self {
            description: None,
            value,
            export: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Exports the output under `name` for cross-stack imports.
    pub fn exported_as(mut self, name: Value) -> Self {
        self.export = Some(Export { name });
        self
    }
}

/// A CloudFormation template.
#[derive(Debug, Clone, Default)]
pub struct Template {
    description: Option<String>,
    resources: Vec<(String, ResourceDecl)>,
    outputs: Vec<(String, OutputDecl)>,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            resources: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declares a resource. Logical ids must be unique within the template.
    pub fn add_resource(
        &mut self,
        logical_id: impl Into<String>,
        decl: ResourceDecl,
    ) -> Result<(), SynthError> {
        let logical_id = logical_id.into();
        if self.has_resource(&logical_id) || self.output(&logical_id).is_some() {
            return Err(SynthError::DuplicateLogicalId(logical_id));
        }
        log::debug!("Declared {} ({})", logical_id, decl.resource_type);
        self.resources.push((logical_id, decl));
        Ok(())
    }

    /// Declares an output. Output ids share the namespace with resources.
    pub fn add_output(
        &mut self,
        logical_id: impl Into<String>,
        output: OutputDecl,
    ) -> Result<(), SynthError> {
        let logical_id = logical_id.into();
        if self.has_resource(&logical_id) || self.output(&logical_id).is_some() {
            return Err(SynthError::DuplicateLogicalId(logical_id));
        }
        self.outputs.push((logical_id, output));
        Ok(())
    }

    pub fn has_resource(&self, logical_id: &str) -> bool {
        self.resource(logical_id).is_some()
    }

    pub fn resource(&self, logical_id: &str) -> Option<&ResourceDecl> {
        self.resources
            .iter()
            .find(|(id, _)| id == logical_id)
            .map(|(_, decl)| decl)
    }

    /// Resources in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = (&str, &ResourceDecl)> {
        self.resources.iter().map(|(id, decl)| (id.as_str(), decl))
    }

    /// Logical ids of all resources of the given CloudFormation type.
    pub fn resources_of_type<'a>(&'a self, resource_type: &'a str) -> Vec<&'a str> {
        self.resources()
            .filter(|(_, decl)| decl.resource_type == resource_type)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn output(&self, logical_id: &str) -> Option<&OutputDecl> {
        self.outputs
            .iter()
            .find(|(id, _)| id == logical_id)
            .map(|(_, out)| out)
    }

    /// Outputs in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &OutputDecl)> {
        self.outputs.iter().map(|(id, out)| (id.as_str(), out))
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn to_value(&self) -> Result<Value, SynthError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SynthError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Serializes `(id, value)` pairs as a JSON object, keeping their order.
struct Entries<'a, T>(&'a [(String, T)]);

impl<T: Serialize> Serialize for Entries<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, value) in self.0 {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("AWSTemplateFormatVersion", FORMAT_VERSION)?;
        if let Some(description) = &self.description {
            map.serialize_entry("Description", description)?;
        }
        map.serialize_entry("Resources", &Entries(&self.resources))?;
        if !self.outputs.is_empty() {
            map.serialize_entry("Outputs", &Entries(&self.outputs))?;
        }
        map.end()
    }
}
