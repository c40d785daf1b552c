//! Synthesis inputs and their fail-fast validation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ConfigError;
use crate::template::{ref_to, ACCOUNT_ID};

/// CloudFront only accepts ACM certificates issued in this region.
pub const DEPLOYMENT_REGION: &str = "us-east-1";

/// Stack name used when none is configured.
pub const DEFAULT_STACK_NAME: &str = "StaticSiteStack";

/// Environment variables consulted for the account id, in order.
pub const ACCOUNT_ENV_VARS: &[&str] = &["CDK_DEFAULT_ACCOUNT", "AWS_ACCOUNT_ID"];

/// S3 bucket names are limited to 63 characters.
const MAX_BUCKET_NAME_LEN: usize = 63;

const BUCKET_SUFFIX: &str = "-website";
const LOG_BUCKET_SUFFIX: &str = "-logs";

/// Bucket name prefixes S3 refuses.
const RESERVED_BUCKET_PREFIXES: &[&str] = &["xn--", "sthree-"];

static RE_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z](?:[a-z0-9-]{0,61}[a-z0-9])?$")
        .unwrap()
});

static RE_HOSTED_ZONE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Z[A-Z0-9]{1,31}$").unwrap());

static RE_ACCOUNT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{12}$").unwrap());

static RE_STACK_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]{0,127}$").unwrap());

/// Account and region the stack is synthesized for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    account: Option<String>,
}

impl Environment {
    /// Reads the account id from the process environment.
    pub fn from_env() -> Self {
        let account = ACCOUNT_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());

        if account.is_none() {
            log::debug!(
                "No account id in {}; the template will resolve it at deploy time",
                ACCOUNT_ENV_VARS.join(" or ")
            );
        }

        Self { account }
    }

    pub fn with_account(account: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
        }
    }

    /// An environment whose account is only known at deploy time.
    pub fn unresolved() -> Self {
        Self { account: None }
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn region(&self) -> &'static str {
        DEPLOYMENT_REGION
    }

    /// The account as a template value: the literal id, or `AWS::AccountId`.
    pub fn account_value(&self) -> Value {
        match &self.account {
            Some(account) => Value::String(account.clone()),
            None => ref_to(ACCOUNT_ID),
        }
    }

    /// `aws://<account>/<region>`, as used in cloud assembly manifests.
    pub fn uri(&self) -> String {
        format!(
            "aws://{}/{}",
            self.account.as_deref().unwrap_or("unknown-account"),
            DEPLOYMENT_REGION
        )
    }
}

/// Raw inputs to synthesis, as gathered from flags, environment and config.
#[derive(Debug, Clone)]
pub struct StackProps {
    pub stack_name: String,
    pub domain_name: Option<String>,
    pub hosted_zone_id: Option<String>,
    pub env: Environment,
}

impl Default for StackProps {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            domain_name: None,
            hosted_zone_id: None,
            env: Environment::unresolved(),
        }
    }
}

impl StackProps {
    pub fn new(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: Some(domain_name.into()),
            ..Self::default()
        }
    }

    pub fn with_hosted_zone_id(mut self, hosted_zone_id: impl Into<String>) -> Self {
        self.hosted_zone_id = Some(hosted_zone_id.into());
        self
    }

    pub fn with_stack_name(mut self, stack_name: impl Into<String>) -> Self {
        self.stack_name = stack_name.into();
        self
    }

    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Checks every input and resolves the zone strategy.
    ///
    /// Runs before anything is declared, so a bad input never yields a
    /// partial template.
    pub fn validate(&self) -> Result<SiteParams, ConfigError> {
        let domain_name = self
            .domain_name
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::MissingDomainName)?;
        let domain = DomainName::parse(domain_name)?;

        let zone = match self
            .hosted_zone_id
            .as_deref()
            .map(str::trim)
            .filter(|z| !z.is_empty())
        {
            Some(id) => ZoneSource::Existing(HostedZoneId::parse(id)?),
            None => ZoneSource::Create,
        };

        if !is_valid_stack_name(&self.stack_name) {
            return Err(ConfigError::InvalidStackName(self.stack_name.clone()));
        }

        if let Some(account) = self.env.account() {
            if !RE_ACCOUNT_ID.is_match(account) {
                return Err(ConfigError::InvalidAccountId(account.to_string()));
            }
        }

        Ok(SiteParams {
            stack_name: self.stack_name.clone(),
            domain,
            zone,
            env: self.env.clone(),
        })
    }
}

/// Whether `name` is usable as a CloudFormation stack name.
pub fn is_valid_stack_name(name: &str) -> bool {
    RE_STACK_NAME.is_match(name)
}

/// Validated synthesis inputs.
#[derive(Debug, Clone)]
pub struct SiteParams {
    pub stack_name: String,
    pub domain: DomainName,
    pub zone: ZoneSource,
    pub env: Environment,
}

/// Where the site's DNS zone comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneSource {
    /// A zone that already exists and is only referenced.
    Existing(HostedZoneId),
    /// A zone declared by this stack.
    Create,
}

/// A lower-cased, fully qualified apex domain without trailing dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainName(String);

impl DomainName {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let normalized = raw.trim().trim_end_matches('.').to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(ConfigError::MissingDomainName);
        }

        if normalized.len() > 253 {
            return Err(ConfigError::InvalidDomainName {
                domain: raw.to_string(),
                reason: "longer than 253 characters".to_string(),
            });
        }

        if !RE_DOMAIN.is_match(&normalized) {
            return Err(ConfigError::InvalidDomainName {
                domain: raw.to_string(),
                reason: "expected a fully qualified name such as example.com".to_string(),
            });
        }

        let domain = Self(normalized);
        if domain.bucket_name().len() > MAX_BUCKET_NAME_LEN {
            return Err(ConfigError::InvalidDomainName {
                domain: raw.to_string(),
                reason: format!(
                    "derived bucket name '{}' exceeds {} characters",
                    domain.bucket_name(),
                    MAX_BUCKET_NAME_LEN
                ),
            });
        }

        let bucket_name = domain.bucket_name();
        if let Some(prefix) = RESERVED_BUCKET_PREFIXES
            .iter()
            .find(|prefix| bucket_name.starts_with(*prefix))
        {
            return Err(ConfigError::InvalidDomainName {
                domain: raw.to_string(),
                reason: format!(
                    "derived bucket name '{}' uses reserved prefix '{}'",
                    bucket_name, prefix
                ),
            });
        }

        Ok(domain)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `www.` alias of the apex.
    pub fn www(&self) -> String {
        format!("www.{}", self.0)
    }

    /// The domain with dots replaced by dashes, usable in resource names.
    pub fn slug(&self) -> String {
        self.0.replace('.', "-")
    }

    pub fn bucket_name(&self) -> String {
        format!("{}{}", self.slug(), BUCKET_SUFFIX)
    }

    /// Name of the bucket receiving access logs; never longer than
    /// [`bucket_name`](Self::bucket_name).
    pub fn log_bucket_name(&self) -> String {
        format!("{}{}", self.slug(), LOG_BUCKET_SUFFIX)
    }

    pub fn website_url(&self) -> String {
        format!("https://{}", self.0)
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Route 53 hosted zone id such as `Z0123456789ABCDEFGHIJ`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZoneId(String);

impl HostedZoneId {
    /// Accepts the bare id or the `/hostedzone/<id>` form the API returns.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let id = trimmed.strip_prefix("/hostedzone/").unwrap_or(trimmed);
        if RE_HOSTED_ZONE_ID.is_match(id) {
            Ok(Self(id.to_string()))
        } else {
            Err(ConfigError::InvalidHostedZoneId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostedZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_domain_name() {
        let err = StackProps::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingDomainName));

        let err = StackProps::new("   ").validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingDomainName));
    }

    #[test]
    fn test_domain_normalized() {
        let domain = DomainName::parse(" Example.COM. ").unwrap();
        assert_eq!(domain.as_str(), "example.com");
        assert_eq!(domain.www(), "www.example.com");
        assert_eq!(domain.bucket_name(), "example-com-website");
        assert_eq!(domain.log_bucket_name(), "example-com-logs");
        assert_eq!(domain.website_url(), "https://example.com");
    }

    #[test]
    fn test_invalid_domains() {
        for raw in [
            "localhost",
            "exa mple.com",
            "-bad.com",
            "bad-.com",
            "example.123",
            "a..b.com",
            "xn--80ak6aa92e.com",
            "sthree-site.com",
        ] {
            let err = DomainName::parse(raw).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidDomainName { .. }),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_reserved_bucket_prefix_reason() {
        let err = DomainName::parse("xn--80ak6aa92e.com").unwrap_err();
        match err {
            ConfigError::InvalidDomainName { reason, .. } => {
                assert!(reason.contains("reserved prefix 'xn--'"), "{reason}")
            }
            other => panic!("unexpected error: {other}"),
        }
        // Only the leading label matters
        assert!(DomainName::parse("shop.xn--80ak6aa92e.com").is_ok());
    }

    #[test]
    fn test_domain_too_long_for_bucket() {
        let raw = format!("{}.example.com", "a".repeat(50));
        let err = DomainName::parse(&raw).unwrap_err();
        match err {
            ConfigError::InvalidDomainName { reason, .. } => assert!(reason.contains("bucket")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_hosted_zone_id_forms() {
        assert_eq!(HostedZoneId::parse("Z0123456789ABC").unwrap().as_str(), "Z0123456789ABC");
        assert_eq!(
            HostedZoneId::parse("/hostedzone/Z0123456789ABC").unwrap().as_str(),
            "Z0123456789ABC"
        );
        assert!(HostedZoneId::parse("not-a-zone").is_err());
        assert!(HostedZoneId::parse("z123").is_err());
    }

    #[test]
    fn test_zone_source() {
        let site = StackProps::new("example.com").validate().unwrap();
        assert_eq!(site.zone, ZoneSource::Create);

        let site = StackProps::new("example.com")
            .with_hosted_zone_id("Z0123456789ABC")
            .validate()
            .unwrap();
        assert!(matches!(site.zone, ZoneSource::Existing(ref id) if id.as_str() == "Z0123456789ABC"));

        // A blank id means "no id", not an invalid one.
        let site = StackProps::new("example.com")
            .with_hosted_zone_id("  ")
            .validate()
            .unwrap();
        assert_eq!(site.zone, ZoneSource::Create);
    }

    #[test]
    fn test_invalid_account_and_stack_name() {
        let err = StackProps::new("example.com")
            .with_env(Environment::with_account("12345"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAccountId(_)));

        let err = StackProps::new("example.com")
            .with_stack_name("1-bad name")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStackName(_)));
    }

    #[test]
    fn test_environment_values() {
        let env = Environment::with_account("123456789012");
        assert_eq!(env.account_value(), json!("123456789012"));
        assert_eq!(env.uri(), "aws://123456789012/us-east-1");

        let env = Environment::unresolved();
        assert_eq!(env.account_value(), json!({ "Ref": "AWS::AccountId" }));
        assert_eq!(env.region(), "us-east-1");
    }

    #[test]
    #[serial_test::serial]
    fn test_environment_from_env() {
        std::env::remove_var("CDK_DEFAULT_ACCOUNT");
        std::env::set_var("AWS_ACCOUNT_ID", "210987654321");
        assert_eq!(Environment::from_env().account(), Some("210987654321"));

        std::env::set_var("CDK_DEFAULT_ACCOUNT", "123456789012");
        assert_eq!(Environment::from_env().account(), Some("123456789012"));

        std::env::remove_var("CDK_DEFAULT_ACCOUNT");
        std::env::remove_var("AWS_ACCOUNT_ID");
        assert_eq!(Environment::from_env().account(), None);
    }
}
