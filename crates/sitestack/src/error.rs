use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitestackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Synthesis error: {0}")]
    Synth(#[from] SynthError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config directory not found: {0}")]
    ConfigDirNotFound(PathBuf),

    #[error("Failed to parse YAML in '{path}': {message}")]
    ParseYaml { path: PathBuf, message: String },

    #[error("Failed to serialize YAML: {0}")]
    SerializeYaml(String),

    #[error("Invalid API version '{version}', expected '{expected}'")]
    InvalidApiVersion { version: String, expected: String },

    #[error("Duplicate resource of kind '{kind}': '{name}'")]
    DuplicateResource { kind: String, name: String },

    #[error("A domain name is required (pass --domain-name, set DOMAIN_NAME, or declare a Site resource)")]
    MissingDomainName,

    #[error("Invalid domain name '{domain}': {reason}")]
    InvalidDomainName { domain: String, reason: String },

    #[error("Invalid hosted zone id '{0}'")]
    InvalidHostedZoneId(String),

    #[error("Invalid AWS account id '{0}', expected 12 digits")]
    InvalidAccountId(String),

    #[error("Invalid stack name '{0}'")]
    InvalidStackName(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("Duplicate logical id '{0}'")]
    DuplicateLogicalId(String),

    #[error("Resource '{from}' references undeclared resource '{target}'")]
    DanglingReference { from: String, target: String },

    #[error("Cyclic reference between resources: {}", .0.join(" -> "))]
    CyclicReference(Vec<String>),

    #[error("Failed to render template JSON: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Failed to write '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SitestackError>;
