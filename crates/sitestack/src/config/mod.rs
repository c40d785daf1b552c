//! Declarative configuration for sitestack.
//!
//! A config directory holds Kubernetes-style YAML resources:
//! - `Site`: domain name, existing hosted zone and stack name
//! - `UpdatePolicy`: the Dependabot entries and their maintainers
//!
//! Both kinds are optional and at most one of each may exist.

pub mod loader;
pub mod resource;
pub mod validation;

pub use loader::{ConfigLoader, LoadedConfig};
pub use resource::{
    AnyResource, ObjectMeta, Resource, ResourceKind, ResourceWithPath, SiteResource, SiteSpec,
    UpdatePolicyResource, UpdatePolicySpec, API_VERSION,
};
pub use validation::ConfigValidator;
