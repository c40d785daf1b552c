//! Cross-resource validation for the config directory.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::loader::LoadedConfig;
use super::resource::{SiteResource, UpdatePolicyResource};
use crate::dependabot::{DependabotConfig, Interval, UpdateEntry, DEPENDABOT_VERSION};
use crate::error::ConfigError;
use crate::stack::{is_valid_stack_name, DomainName, HostedZoneId};

static RE_SCHEDULE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[01][0-9]|2[0-3]):[0-5][0-9]$").unwrap());

// GitHub logins, optionally `org/team`
static RE_GITHUB_LOGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})(?:/[A-Za-z0-9][A-Za-z0-9_.-]*)?$").unwrap()
});

/// Dependabot refuses more than this many open version-update PRs per entry.
const MAX_OPEN_PULL_REQUESTS: u32 = 100;

/// Dependabot truncates commit prefixes beyond this length.
const MAX_COMMIT_PREFIX_LEN: usize = 50;

/// Validator for the config directory and the Dependabot policy.
pub struct ConfigValidator {
    /// Collected validation errors.
    errors: Vec<String>,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Validates everything the config directory declared.
    pub fn validate(&mut self, config: &LoadedConfig) -> Result<(), ConfigError> {
        self.errors.clear();

        if let Some(site) = &config.site {
            self.validate_site(&site.resource);
        }

        if let Some(policy) = &config.update_policy {
            self.validate_maintainers(&policy.resource);
        }
        self.collect_update_policy(&config.to_dependabot_config());

        self.finish()
    }

    /// Validates a Dependabot policy on its own.
    pub fn validate_update_policy(&mut self, config: &DependabotConfig) -> Result<(), ConfigError> {
        self.errors.clear();
        self.collect_update_policy(config);
        self.finish()
    }

    /// Returns the errors found by the last run.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn finish(&self) -> Result<(), ConfigError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(self.errors.join("; ")))
        }
    }

    fn validate_site(&mut self, site: &SiteResource) {
        let name = site.name();

        if name.is_empty() {
            self.errors.push("Site: metadata.name is required".to_string());
        }

        if let Some(domain) = site.spec.domain_name.as_deref() {
            if let Err(e) = DomainName::parse(domain) {
                self.errors.push(format!("Site '{}': {}", name, e));
            }
        }

        if let Some(zone) = site.spec.hosted_zone_id.as_deref() {
            // Blank means "create a zone"
            if !zone.trim().is_empty() {
                if let Err(e) = HostedZoneId::parse(zone) {
                    self.errors.push(format!("Site '{}': {}", name, e));
                }
            }
        }

        if let Some(stack_name) = site.spec.stack_name.as_deref() {
            if !is_valid_stack_name(stack_name) {
                self.errors.push(format!(
                    "Site '{}': stackName '{}' must start with a letter and contain only letters, digits and hyphens",
                    name, stack_name
                ));
            }
        }
    }

    fn validate_maintainers(&mut self, policy: &UpdatePolicyResource) {
        for login in &policy.spec.maintainers {
            if !RE_GITHUB_LOGIN.is_match(login) {
                self.errors.push(format!(
                    "UpdatePolicy '{}': '{}' is not a GitHub login or team",
                    policy.name(),
                    login
                ));
            }
        }
    }

    fn collect_update_policy(&mut self, config: &DependabotConfig) {
        if config.version != DEPENDABOT_VERSION {
            self.errors.push(format!(
                "Dependabot: version must be {}, got {}",
                DEPENDABOT_VERSION, config.version
            ));
        }

        if config.updates.is_empty() {
            self.errors
                .push("Dependabot: at least one update entry is required".to_string());
        }

        let mut seen = HashSet::new();
        for entry in &config.updates {
            if !seen.insert((entry.package_ecosystem, entry.directory.as_str())) {
                self.errors.push(format!(
                    "Dependabot: duplicate entry for '{}'",
                    entry.key()
                ));
            }
            self.validate_entry(entry);
        }
    }

    fn validate_entry(&mut self, entry: &UpdateEntry) {
        let key = entry.key();

        if !entry.directory.starts_with('/') {
            self.errors.push(format!(
                "Dependabot '{}': directory must start with '/'",
                key
            ));
        }

        if entry.open_pull_requests_limit > MAX_OPEN_PULL_REQUESTS {
            self.errors.push(format!(
                "Dependabot '{}': open-pull-requests-limit must be at most {}",
                key, MAX_OPEN_PULL_REQUESTS
            ));
        }

        let schedule = &entry.schedule;
        if schedule.day.is_some() && schedule.interval != Interval::Weekly {
            self.errors.push(format!(
                "Dependabot '{}': schedule.day is only valid for weekly schedules",
                key
            ));
        }

        if let Some(time) = &schedule.time {
            if !RE_SCHEDULE_TIME.is_match(time) {
                self.errors.push(format!(
                    "Dependabot '{}': schedule.time '{}' must be HH:MM",
                    key, time
                ));
            }
        }

        if let Some(message) = &entry.commit_message {
            let prefixes = std::iter::once(("prefix", Some(&message.prefix))).chain(
                std::iter::once(("prefix-development", message.prefix_development.as_ref())),
            );
            for (field, prefix) in prefixes {
                let Some(prefix) = prefix else { continue };
                if prefix.trim().is_empty() {
                    self.errors.push(format!(
                        "Dependabot '{}': commit-message.{} must not be empty",
                        key, field
                    ));
                } else if prefix.chars().count() > MAX_COMMIT_PREFIX_LEN {
                    self.errors.push(format!(
                        "Dependabot '{}': commit-message.{} must be at most {} characters",
                        key, field, MAX_COMMIT_PREFIX_LEN
                    ));
                }
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
