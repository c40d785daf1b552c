//! Configuration loader for the config directory.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::resource::{
    AnyResource, ResourceHeader, ResourceKind, ResourceWithPath, SiteResource,
    UpdatePolicyResource, API_VERSION,
};
use crate::dependabot::{validate_schema, DependabotConfig, DEPENDABOT_VERSION};
use crate::error::ConfigError;
use crate::stack::{Environment, StackProps};

/// Resources found in the config directory. Both kinds are optional.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub site: Option<ResourceWithPath<SiteResource>>,
    pub update_policy: Option<ResourceWithPath<UpdatePolicyResource>>,
}

impl LoadedConfig {
    /// Returns all resources as a flat list.
    pub fn all_resources(&self) -> Vec<(ResourceKind, &str, &Path)> {
        let mut resources = Vec::new();
        if let Some(site) = &self.site {
            resources.push((ResourceKind::Site, site.resource.name(), site.path.as_path()));
        }
        if let Some(policy) = &self.update_policy {
            resources.push((
                ResourceKind::UpdatePolicy,
                policy.resource.name(),
                policy.path.as_path(),
            ));
        }
        resources
    }

    /// Builds stack props from the `Site` resource, if any.
    ///
    /// Callers layer command-line values on top of the result.
    pub fn stack_props(&self, env: Environment) -> StackProps {
        let mut props = StackProps::default().with_env(env);
        if let Some(site) = &self.site {
            let spec = &site.resource.spec;
            props.domain_name = spec.domain_name.clone();
            props.hosted_zone_id = spec.hosted_zone_id.clone();
            if let Some(stack_name) = &spec.stack_name {
                props.stack_name = stack_name.clone();
            }
        }
        props
    }

    /// Converts the `UpdatePolicy` resource to a Dependabot file.
    ///
    /// Without a policy, or with one that lists no entries, the static-site
    /// default applies. Maintainers fill in entries that name no reviewers or
    /// assignees of their own.
    pub fn to_dependabot_config(&self) -> DependabotConfig {
        let Some(policy) = &self.update_policy else {
            return DependabotConfig::static_site(&[]);
        };
        let spec = &policy.resource.spec;

        if spec.updates.is_empty() {
            return DependabotConfig::static_site(&spec.maintainers);
        }

        let mut config = DependabotConfig {
            updates: spec.updates.clone(),
            ..DependabotConfig::default()
        };
        for entry in &mut config.updates {
            if entry.reviewers.is_empty() {
                entry.reviewers = spec.maintainers.clone();
            }
            if entry.assignees.is_empty() {
                entry.assignees = spec.maintainers.clone();
            }
        }
        config
    }
}

/// Configuration loader for the config directory.
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads every YAML resource under the config directory.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        if !self.config_dir.exists() {
            return Err(ConfigError::ConfigDirNotFound(self.config_dir.clone()));
        }

        let mut loaded = LoadedConfig::default();

        for entry in WalkDir::new(&self.config_dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| ConfigError::ReadDirectory {
                path: self.config_dir.clone(),
                source: e,
            })?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            // Skip hidden files and anything inside hidden directories
            if let Ok(relative) = path.strip_prefix(&self.config_dir) {
                let has_hidden_component = relative.components().any(|c| {
                    c.as_os_str()
                        .to_str()
                        .map(|s| s.starts_with('.'))
                        .unwrap_or(false)
                });
                if has_hidden_component {
                    continue;
                }
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != "yaml" && ext != "yml" {
                continue;
            }

            let resource = match self.load_file(path) {
                Ok(resource) => resource,
                Err(e) => {
                    log::warn!("Failed to load {}: {}", path.display(), e);
                    return Err(e);
                }
            };
            let relative_path = path
                .strip_prefix(&self.config_dir)
                .unwrap_or(path)
                .to_path_buf();
            log::debug!(
                "Loaded {}/{} from {}",
                resource.kind(),
                resource.name(),
                relative_path.display()
            );

            match resource {
                AnyResource::Site(r) => {
                    if let Some(existing) = &loaded.site {
                        return Err(ConfigError::DuplicateResource {
                            kind: ResourceKind::Site.to_string(),
                            name: format!("{} and {}", existing.resource.name(), r.name()),
                        });
                    }
                    loaded.site = Some(ResourceWithPath::new(r, relative_path));
                }
                AnyResource::UpdatePolicy(r) => {
                    if let Some(existing) = &loaded.update_policy {
                        return Err(ConfigError::DuplicateResource {
                            kind: ResourceKind::UpdatePolicy.to_string(),
                            name: format!("{} and {}", existing.resource.name(), r.name()),
                        });
                    }
                    loaded.update_policy = Some(ResourceWithPath::new(r, relative_path));
                }
            }
        }

        Ok(loaded)
    }

    /// Loads a single resource file.
    pub fn load_file(&self, path: &Path) -> Result<AnyResource, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.parse_resource(&content, path)
    }

    /// Parses a resource from YAML content.
    pub fn parse_resource(&self, content: &str, path: &Path) -> Result<AnyResource, ConfigError> {
        let parse_error = |e: serde_yaml::Error| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        // The header decides which spec type the rest is parsed as
        let header: ResourceHeader = serde_yaml::from_str(content).map_err(parse_error)?;

        if header.api_version != API_VERSION {
            return Err(ConfigError::InvalidApiVersion {
                version: header.api_version,
                expected: API_VERSION.to_string(),
            });
        }

        match header.kind {
            ResourceKind::Site => Ok(AnyResource::Site(
                serde_yaml::from_str(content).map_err(parse_error)?,
            )),
            ResourceKind::UpdatePolicy => {
                // Typed parsing would drop misspelled entry keys silently
                let raw: serde_json::Value = serde_yaml::from_str(content).map_err(parse_error)?;
                if let Some(updates) = raw.get("spec").and_then(|spec| spec.get("updates")) {
                    validate_schema(&json!({
                        "version": DEPENDABOT_VERSION,
                        "updates": updates,
                    }))?;
                }

                Ok(AnyResource::UpdatePolicy(
                    serde_yaml::from_str(content).map_err(parse_error)?,
                ))
            }
        }
    }

    /// Writes a resource to `path`, relative to the config directory.
    pub fn write_resource(&self, resource: &AnyResource, path: &Path) -> Result<PathBuf, ConfigError> {
        let full_path = self.config_dir.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::ReadFile {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let yaml_content = match resource {
            AnyResource::Site(r) => serde_yaml::to_string(r),
            AnyResource::UpdatePolicy(r) => serde_yaml::to_string(r),
        }
        .map_err(|e| ConfigError::SerializeYaml(e.to_string()))?;

        fs::write(&full_path, yaml_content).map_err(|e| ConfigError::ReadFile {
            path: full_path.clone(),
            source: e,
        })?;

        Ok(full_path)
    }
}
