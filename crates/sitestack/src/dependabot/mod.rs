//! Dependabot policy for this repository's own manifests.
//!
//! Each [`UpdateEntry`] owns its settings outright. Editing one entry through
//! [`DependabotConfig::entry_mut`] never changes another.

pub mod loader;
pub mod schema;

pub use loader::{load_dependabot_config, validate_schema};
pub use schema::{
    CommitMessage, CommitScope, DependabotConfig, Interval, PackageEcosystem, Schedule,
    UpdateEntry, Weekday, DEPENDABOT_VERSION,
};

use crate::config::ConfigValidator;
use crate::error::ConfigError;

/// Where Dependabot looks for its configuration.
pub const DEFAULT_PATH: &str = ".github/dependabot.yml";

/// Directory holding the infrastructure package's own manifest.
pub const INFRASTRUCTURE_DIRECTORY: &str = "/infrastructure";

impl DependabotConfig {
    /// The policy for a static-site repository: the site's npm manifest, the
    /// infrastructure npm manifest, and the CI workflow actions.
    pub fn static_site(maintainers: &[String]) -> Self {
        let site = UpdateEntry::new(PackageEcosystem::Npm, "/", Schedule::weekly(Weekday::Monday))
            .open_pull_requests_limit(10)
            .reviewers(maintainers)
            .assignees(maintainers)
            .label("dependencies")
            .commit_message(
                CommitMessage::prefix("deps")
                    .development_prefix("deps-dev")
                    .with_scope(),
            );

        let infrastructure = UpdateEntry::new(
            PackageEcosystem::Npm,
            INFRASTRUCTURE_DIRECTORY,
            Schedule::weekly(Weekday::Monday),
        )
        .open_pull_requests_limit(5)
        .reviewers(maintainers)
        .assignees(maintainers)
        .label("dependencies")
        .label("infrastructure")
        .commit_message(CommitMessage::prefix("infra").with_scope());

        let workflows = UpdateEntry::new(PackageEcosystem::GithubActions, "/", Schedule::monthly())
            .open_pull_requests_limit(5)
            .reviewers(maintainers)
            .assignees(maintainers)
            .label("dependencies")
            .label("ci")
            .commit_message(CommitMessage::prefix("ci").with_scope());

        Self {
            version: DEPENDABOT_VERSION,
            updates: vec![site, infrastructure, workflows],
        }
    }

    pub fn entry(&self, ecosystem: PackageEcosystem, directory: &str) -> Option<&UpdateEntry> {
        self.updates
            .iter()
            .find(|e| e.package_ecosystem == ecosystem && e.directory == directory)
    }

    pub fn entry_mut(
        &mut self,
        ecosystem: PackageEcosystem,
        directory: &str,
    ) -> Option<&mut UpdateEntry> {
        self.updates
            .iter_mut()
            .find(|e| e.package_ecosystem == ecosystem && e.directory == directory)
    }

    /// Replaces reviewers and assignees on every entry.
    pub fn set_maintainers(&mut self, maintainers: &[String]) {
        for entry in &mut self.updates {
            entry.reviewers = maintainers.to_vec();
            entry.assignees = maintainers.to_vec();
        }
    }

    /// Runs schema and semantic validation, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let value = serde_json::to_value(self).map_err(|e| {
            ConfigError::Validation(format!("Failed to convert Dependabot config: {}", e))
        })?;
        validate_schema(&value)?;

        let mut validator = ConfigValidator::new();
        validator.validate_update_policy(self)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::SerializeYaml(e.to_string()))
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: DEFAULT_PATH.into(),
            message: e.to_string(),
        })
    }
}
