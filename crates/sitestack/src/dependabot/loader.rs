use std::path::Path;

use crate::dependabot::schema::DependabotConfig;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/dependabot-v2.json");

/// Reads, schema-checks and validates an existing `dependabot.yml`.
pub fn load_dependabot_config<P: AsRef<Path>>(path: P) -> Result<DependabotConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let value: serde_json::Value =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate_schema(&value)?;

    let config: DependabotConfig =
        serde_json::from_value(value).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    config.validate()?;

    Ok(config)
}

/// Validates a document against the embedded Dependabot v2 schema.
pub fn validate_schema(value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value = serde_json::from_str(SCHEMA_JSON)
        .map_err(|e| ConfigError::Validation(format!("Invalid embedded schema JSON: {}", e)))?;

    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| ConfigError::Validation(format!("Failed to compile JSON schema: {}", e)))?;

    let error_messages: Vec<String> = validator.iter_errors(value).map(|e| e.to_string()).collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}
