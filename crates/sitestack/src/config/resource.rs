//! K8s-style resource types for the config directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::dependabot::UpdateEntry;

/// The API version for all sitestack resources.
pub const API_VERSION: &str = "sitestack.io/v1";

/// The kind of resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Site,
    UpdatePolicy,
}

impl ResourceKind {
    /// Returns all resource kinds.
    pub fn all() -> &'static [ResourceKind] {
        &[ResourceKind::Site, ResourceKind::UpdatePolicy]
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Site => write!(f, "Site"),
            ResourceKind::UpdatePolicy => write!(f, "UpdatePolicy"),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "site" => Ok(ResourceKind::Site),
            "updatepolicy" => Ok(ResourceKind::UpdatePolicy),
            _ => Err(format!("Unknown resource kind: {}", s)),
        }
    }
}

/// Metadata for a resource, following K8s conventions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// The unique name of the resource within its kind.
    pub name: String,

    /// Key-value labels for organizing resources.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: HashMap::new(),
        }
    }
}

/// A generic K8s-style resource wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource<T> {
    /// API version, should always be `sitestack.io/v1`.
    pub api_version: String,

    pub kind: ResourceKind,

    pub metadata: ObjectMeta,

    pub spec: T,
}

impl<T> Resource<T> {
    pub fn new(kind: ResourceKind, name: impl Into<String>, spec: T) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind,
            metadata: ObjectMeta::new(name),
            spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Just enough of a resource to decide how to parse the rest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHeader {
    pub api_version: String,
    pub kind: ResourceKind,
}

// ============================================================================
// Site Resource
// ============================================================================

/// The site to synthesize hosting infrastructure for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSpec {
    /// Apex domain, e.g. `example.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,

    /// Existing Route 53 zone to use instead of creating one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,

    /// CloudFormation stack name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
}

pub type SiteResource = Resource<SiteSpec>;

// ============================================================================
// UpdatePolicy Resource
// ============================================================================

/// Dependency-update policy, rendered to `.github/dependabot.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePolicySpec {
    /// Entries in Dependabot's own format.
    #[serde(default)]
    pub updates: Vec<UpdateEntry>,

    /// Reviewers and assignees applied to every entry that has none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<String>,
}

pub type UpdatePolicyResource = Resource<UpdatePolicySpec>;

/// Any resource, tagged by kind.
#[derive(Debug, Clone)]
pub enum AnyResource {
    Site(SiteResource),
    UpdatePolicy(UpdatePolicyResource),
}

impl AnyResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            AnyResource::Site(_) => ResourceKind::Site,
            AnyResource::UpdatePolicy(_) => ResourceKind::UpdatePolicy,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AnyResource::Site(r) => r.name(),
            AnyResource::UpdatePolicy(r) => r.name(),
        }
    }
}

/// A resource together with the file it was loaded from.
#[derive(Debug, Clone)]
pub struct ResourceWithPath<T> {
    pub resource: T,
    /// Path relative to the config directory.
    pub path: PathBuf,
}

impl<T> ResourceWithPath<T> {
    pub fn new(resource: T, path: impl Into<PathBuf>) -> Self {
        Self {
            resource,
            path: path.into(),
        }
    }
}
