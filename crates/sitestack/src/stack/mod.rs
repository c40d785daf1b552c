//! Static-site hosting stack.
//!
//! [`synthesize`] turns [`StackProps`] into a CloudFormation template with:
//! - a private, versioned S3 bucket holding the site
//! - an origin access control and a bucket policy scoped to one distribution
//! - a hosted zone (referenced or created) and a DNS-validated certificate
//! - a CloudFront distribution with a security-headers policy
//! - apex and `www` alias records
//! - an IAM user and policy for the CI pipeline

mod cdn;
mod deployer;
mod dns;
pub mod props;
mod storage;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;

use crate::error::{Result, SynthError};
use crate::graph::ResourceGraph;
use crate::template::{get_att, ref_to, sub, OutputDecl, Template};

pub use cdn::{
    CACHING_OPTIMIZED_POLICY_ID, CDN_LOG_PREFIX, CUSTOM_HEADERS, DEFAULT_ROOT_OBJECT,
    ERROR_PAGE_PATH, MINIMUM_PROTOCOL_VERSION, PRICE_CLASS,
};
pub use deployer::OBJECT_ACTIONS;
pub use dns::CLOUDFRONT_HOSTED_ZONE_ID;
pub use props::{
    is_valid_stack_name, DomainName, Environment, HostedZoneId, SiteParams, StackProps,
    ZoneSource, ACCOUNT_ENV_VARS, DEFAULT_STACK_NAME, DEPLOYMENT_REGION,
};
pub use storage::{ACCESS_LOG_PREFIX, LOG_DELIVERY_SERVICE};

/// Logical ids of everything the stack declares.
pub mod ids {
    pub const BUCKET: &str = "WebsiteBucket";
    pub const BUCKET_POLICY: &str = "WebsiteBucketPolicy";
    pub const LOG_BUCKET: &str = "SiteLogBucket";
    pub const LOG_BUCKET_POLICY: &str = "SiteLogBucketPolicy";
    pub const ORIGIN_ACCESS_CONTROL: &str = "WebsiteOriginAccessControl";
    pub const HOSTED_ZONE: &str = "HostedZone";
    pub const CERTIFICATE: &str = "SiteCertificate";
    pub const HEADERS_POLICY: &str = "SecurityHeadersPolicy";
    pub const DISTRIBUTION: &str = "SiteDistribution";
    pub const APEX_RECORD: &str = "ApexAliasRecord";
    pub const WWW_RECORD: &str = "WwwAliasRecord";
    pub const DEPLOYMENT_USER: &str = "DeploymentUser";
    pub const DEPLOYMENT_POLICY: &str = "DeploymentPolicy";
}

/// Output ids.
pub mod outputs {
    pub const BUCKET_NAME: &str = "BucketName";
    pub const DISTRIBUTION_ID: &str = "DistributionId";
    pub const DISTRIBUTION_DOMAIN_NAME: &str = "DistributionDomainName";
    pub const DEPLOYMENT_USER_NAME: &str = "DeploymentUserName";
    pub const WEBSITE_URL: &str = "WebsiteUrl";
    pub const NAME_SERVERS: &str = "NameServers";
}

/// Manifest schema version written next to the template.
const MANIFEST_VERSION: &str = "1";

/// The result of one synthesis pass.
#[derive(Debug, Clone)]
pub struct StackArtifact {
    pub stack_name: String,
    pub domain: DomainName,
    pub environment: Environment,
    pub template: Template,
}

impl StackArtifact {
    pub fn template_file_name(&self) -> String {
        format!("{}.template.json", self.stack_name)
    }

    /// The order in which the provisioning engine will create resources.
    pub fn creation_order(&self) -> std::result::Result<Vec<String>, SynthError> {
        ResourceGraph::from_template(&self.template).topological_order()
    }

    pub fn manifest(&self) -> Manifest {
        Manifest {
            version: MANIFEST_VERSION,
            stack_name: self.stack_name.clone(),
            environment: self.environment.uri(),
            region: self.environment.region(),
            template_file: self.template_file_name(),
        }
    }

    /// Writes the template and `manifest.json` into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> std::result::Result<Vec<PathBuf>, SynthError> {
        fs::create_dir_all(dir).map_err(|e| SynthError::WriteFile {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let template_path = dir.join(self.template_file_name());
        write_file(&template_path, &self.template.to_json_pretty()?)?;

        let manifest_path = dir.join("manifest.json");
        write_file(&manifest_path, &serde_json::to_string_pretty(&self.manifest())?)?;

        log::info!(
            "Wrote {} and {}",
            template_path.display(),
            manifest_path.display()
        );

        Ok(vec![template_path, manifest_path])
    }
}

fn write_file(path: &Path, content: &str) -> std::result::Result<(), SynthError> {
    fs::write(path, format!("{}\n", content)).map_err(|e| SynthError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Describes a synthesized stack for whoever deploys it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: &'static str,
    pub stack_name: String,
    /// `aws://<account>/<region>`.
    pub environment: String,
    pub region: &'static str,
    pub template_file: String,
}

/// Synthesizes the static-site stack.
///
/// All inputs are validated before the first resource is declared. The
/// reference graph of the finished template is checked before it is returned.
pub fn synthesize(props: &StackProps) -> Result<StackArtifact> {
    let _span = tracing::info_span!("stack.synthesize", stack = %props.stack_name).entered();

    let site = props.validate()?;
    let mut template = Template::new(format!("Static website hosting for {}", site.domain));

    storage::declare_log_bucket(&mut template, &site)?;
    storage::declare_bucket(&mut template, &site)?;
    storage::declare_log_bucket_policy(&mut template, &site)?;
    storage::declare_origin_access_control(&mut template, &site)?;
    let zone_id = dns::resolve_zone(&mut template, &site)?;
    dns::declare_certificate(&mut template, &site, &zone_id)?;
    cdn::declare_security_headers_policy(&mut template, &site)?;
    cdn::declare_distribution(&mut template, &site)?;
    storage::declare_bucket_policy(&mut template, &site)?;
    dns::declare_alias_records(&mut template, &site, &zone_id)?;
    deployer::declare_deployment_identity(&mut template, &site)?;
    declare_outputs(&mut template, &site)?;

    ResourceGraph::from_template(&template).validate()?;

    log::info!(
        "Synthesized stack {} for {} ({} resources)",
        site.stack_name,
        site.domain,
        template.resource_count()
    );

    Ok(StackArtifact {
        stack_name: site.stack_name,
        domain: site.domain,
        environment: site.env,
        template,
    })
}

fn declare_outputs(template: &mut Template, site: &SiteParams) -> std::result::Result<(), SynthError> {
    let exported = [
        (
            outputs::BUCKET_NAME,
            ref_to(ids::BUCKET),
            "Bucket holding the site content",
        ),
        (
            outputs::DISTRIBUTION_ID,
            ref_to(ids::DISTRIBUTION),
            "Distribution id, for cache invalidations",
        ),
        (
            outputs::DISTRIBUTION_DOMAIN_NAME,
            get_att(ids::DISTRIBUTION, "DomainName"),
            "CloudFront domain name of the distribution",
        ),
        (
            outputs::DEPLOYMENT_USER_NAME,
            ref_to(ids::DEPLOYMENT_USER),
            "IAM user the CI pipeline deploys with",
        ),
    ];

    for (id, value, description) in exported {
        template.add_output(
            id,
            OutputDecl::new(value)
                .with_description(description)
                .exported_as(sub(&format!("${{AWS::StackName}}-{}", id))),
        )?;
    }

    template.add_output(
        outputs::WEBSITE_URL,
        OutputDecl::new(json!(site.domain.website_url())).with_description("Public site URL"),
    )?;

    if site.zone == ZoneSource::Create {
        template.add_output(
            outputs::NAME_SERVERS,
            // NameServers is already a list, so it is joined directly.
            OutputDecl::new(json!({ "Fn::Join": [", ", get_att(ids::HOSTED_ZONE, "NameServers")] }))
                .with_description("Name servers to register with the domain registrar"),
        )?;
    }

    Ok(())
}
