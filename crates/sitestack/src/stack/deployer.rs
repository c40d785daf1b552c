//! Deployment identity for the CI pipeline.

use serde_json::json;

use super::ids;
use super::props::SiteParams;
use super::storage::distribution_arn;
use crate::error::SynthError;
use crate::template::{get_att, join, ref_to, PolicyDocument, ResourceDecl, Statement, Template};

/// Object-level actions the pipeline needs to sync site content.
pub const OBJECT_ACTIONS: &[&str] = &["s3:PutObject", "s3:GetObject", "s3:DeleteObject"];

/// Declares the pipeline user and a policy scoped to this stack's bucket and
/// distribution. No statement uses a wildcard resource.
pub(crate) fn declare_deployment_identity(
    template: &mut Template,
    site: &SiteParams,
) -> Result<(), SynthError> {
    template.add_resource(
        ids::DEPLOYMENT_USER,
        ResourceDecl::new(
            "AWS::IAM::User",
            json!({
                "Tags": [ { "Key": "site", "Value": site.domain.as_str() } ]
            }),
        ),
    )?;

    let document = PolicyDocument::new(vec![
        Statement::allow(&["s3:ListBucket"])
            .sid("ListSiteBucket")
            .on(get_att(ids::BUCKET, "Arn")),
        Statement::allow(OBJECT_ACTIONS)
            .sid("ManageSiteObjects")
            .on(join("", vec![get_att(ids::BUCKET, "Arn"), json!("/*")])),
        Statement::allow(&["cloudfront:CreateInvalidation"])
            .sid("InvalidateSiteCache")
            .on(distribution_arn(site)),
    ])
    .to_value()?;

    template.add_resource(
        ids::DEPLOYMENT_POLICY,
        ResourceDecl::new(
            "AWS::IAM::Policy",
            json!({
                "PolicyName": format!("{}-deployment", site.domain.slug()),
                "Users": [ref_to(ids::DEPLOYMENT_USER)],
                "PolicyDocument": document
            }),
        ),
    )
}
