//! Dependabot `version: 2` configuration file types.

use serde::{Deserialize, Serialize};

/// The only configuration format version Dependabot reads.
pub const DEPENDABOT_VERSION: u8 = 2;

/// Root of `.github/dependabot.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependabotConfig {
    pub version: u8,

    #[serde(default)]
    pub updates: Vec<UpdateEntry>,
}

impl Default for DependabotConfig {
    fn default() -> Self {
        Self {
            version: DEPENDABOT_VERSION,
            updates: Vec::new(),
        }
    }
}

/// One monitored (ecosystem, directory) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateEntry {
    pub package_ecosystem: PackageEcosystem,

    /// Manifest location relative to the repository root, e.g. `/infrastructure`.
    pub directory: String,

    pub schedule: Schedule,

    /// Cap on simultaneously open version-update PRs. Dependabot's default is 5.
    #[serde(default = "default_open_pull_requests_limit")]
    pub open_pull_requests_limit: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<CommitMessage>,
}

fn default_open_pull_requests_limit() -> u32 {
    5
}

impl UpdateEntry {
    pub fn new(
        package_ecosystem: PackageEcosystem,
        directory: impl Into<String>,
        schedule: Schedule,
    ) -> Self {
        Self {
            package_ecosystem,
            directory: directory.into(),
            schedule,
            open_pull_requests_limit: default_open_pull_requests_limit(),
            reviewers: Vec::new(),
            assignees: Vec::new(),
            labels: Vec::new(),
            commit_message: None,
        }
    }

    pub fn open_pull_requests_limit(mut self, limit: u32) -> Self {
        self.open_pull_requests_limit = limit;
        self
    }

    pub fn reviewers(mut self, reviewers: &[String]) -> Self {
        self.reviewers = reviewers.to_vec();
        self
    }

    pub fn assignees(mut self, assignees: &[String]) -> Self {
        self.assignees = assignees.to_vec();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn commit_message(mut self, commit_message: CommitMessage) -> Self {
        self.commit_message = Some(commit_message);
        self
    }

    /// `<ecosystem> <directory>`, used in messages.
    pub fn key(&self) -> String {
        format!("{} {}", self.package_ecosystem, self.directory)
    }
}

/// Package ecosystems this repository has manifests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageEcosystem {
    Npm,
    GithubActions,
    Cargo,
    Docker,
    Pip,
}

impl std::fmt::Display for PackageEcosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageEcosystem::Npm => write!(f, "npm"),
            PackageEcosystem::GithubActions => write!(f, "github-actions"),
            PackageEcosystem::Cargo => write!(f, "cargo"),
            PackageEcosystem::Docker => write!(f, "docker"),
            PackageEcosystem::Pip => write!(f, "pip"),
        }
    }
}

impl std::str::FromStr for PackageEcosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "npm" => Ok(PackageEcosystem::Npm),
            "github-actions" => Ok(PackageEcosystem::GithubActions),
            "cargo" => Ok(PackageEcosystem::Cargo),
            "docker" => Ok(PackageEcosystem::Docker),
            "pip" => Ok(PackageEcosystem::Pip),
            _ => Err(format!("Unknown package ecosystem: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub interval: Interval,

    /// Only meaningful for weekly schedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<Weekday>,

    /// `HH:MM`, in `timezone` (UTC when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Schedule {
    pub fn daily() -> Self {
        Self::every(Interval::Daily)
    }

    pub fn weekly(day: Weekday) -> Self {
        Self {
            day: Some(day),
            ..Self::every(Interval::Weekly)
        }
    }

    pub fn monthly() -> Self {
        Self::every(Interval::Monthly)
    }

    fn every(interval: Interval) -> Self {
        Self {
            interval,
            day: None,
            time: None,
            timezone: None,
        }
    }

    pub fn at(mut self, time: impl Into<String>, timezone: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self.timezone = Some(timezone.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Commit message conventions for Dependabot's PRs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommitMessage {
    pub prefix: String,

    /// Prefix for development-dependency updates, where the ecosystem has them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_development: Option<String>,

    /// `scope` appends `deps` / `deps-dev` after the prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<CommitScope>,
}

impl CommitMessage {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            prefix_development: None,
            include: None,
        }
    }

    pub fn development_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix_development = Some(prefix.into());
        self
    }

    pub fn with_scope(mut self) -> Self {
        self.include = Some(CommitScope::Scope);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitScope {
    Scope,
}
