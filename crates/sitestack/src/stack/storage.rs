//! Origin and log buckets, the origin access control, and their resource policies.
//!
//! Access logs go to a separate bucket so the distribution, which can read
//! every object in the origin bucket, never serves them.

use serde_json::{json, Value};

use super::ids;
use super::props::SiteParams;
use crate::error::SynthError;
use crate::template::{
    get_att, join, ref_to, DeletionPolicy, PolicyDocument, Principal, ResourceDecl, Statement,
    Template,
};

pub const ACCESS_LOG_PREFIX: &str = "access-logs/";
pub(crate) const NONCURRENT_VERSION_EXPIRATION_DAYS: u32 = 30;
const ABORT_INCOMPLETE_UPLOAD_DAYS: u32 = 7;
pub(crate) const LOG_EXPIRATION_DAYS: u32 = 90;

/// Service principal that delivers S3 server access logs.
pub const LOG_DELIVERY_SERVICE: &str = "logging.s3.amazonaws.com";

fn secure_transport_only(bucket_arn: Value, objects_arn: Value) -> Statement {
    Statement::deny(&["s3:*"])
        .sid("DenyInsecureTransport")
        .principal(Principal::Any)
        .on(bucket_arn)
        .on(objects_arn)
        .when("Bool", "aws:SecureTransport", json!("false"))
}

fn private_bucket_block() -> Value {
    json!({
        "BlockPublicAcls": true,
        "BlockPublicPolicy": true,
        "IgnorePublicAcls": true,
        "RestrictPublicBuckets": true
    })
}

/// Bucket receiving S3 server access logs and CloudFront standard logs.
pub(crate) fn declare_log_bucket(
    template: &mut Template,
    site: &SiteParams,
) -> Result<(), SynthError> {
    let properties = json!({
        "BucketName": site.domain.log_bucket_name(),
        "PublicAccessBlockConfiguration": private_bucket_block(),
        "LifecycleConfiguration": {
            "Rules": [
                {
                    "Id": "expire-logs",
                    "Status": "Enabled",
                    "ExpirationInDays": LOG_EXPIRATION_DAYS
                }
            ]
        },
        "BucketEncryption": {
            "ServerSideEncryptionConfiguration": [
                { "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" } }
            ]
        },
        // CloudFront standard logging writes through ACLs
        "OwnershipControls": {
            "Rules": [ { "ObjectOwnership": "BucketOwnerPreferred" } ]
        },
        "Tags": [ { "Key": "site", "Value": site.domain.as_str() } ]
    });

    template.add_resource(
        ids::LOG_BUCKET,
        ResourceDecl::new("AWS::S3::Bucket", properties).removal_policy(DeletionPolicy::Delete),
    )
}

/// Lets S3 deliver the origin bucket's access logs, and nothing else.
pub(crate) fn declare_log_bucket_policy(
    template: &mut Template,
    site: &SiteParams,
) -> Result<(), SynthError> {
    let log_bucket_arn = get_att(ids::LOG_BUCKET, "Arn");
    let log_objects_arn = join("", vec![get_att(ids::LOG_BUCKET, "Arn"), json!("/*")]);
    let access_logs_arn = join(
        "",
        vec![
            get_att(ids::LOG_BUCKET, "Arn"),
            json!(format!("/{}*", ACCESS_LOG_PREFIX)),
        ],
    );

    let document = PolicyDocument::new(vec![
        Statement::allow(&["s3:PutObject"])
            .sid("AllowServerAccessLogDelivery")
            .principal(Principal::Service(LOG_DELIVERY_SERVICE.to_string()))
            .on(access_logs_arn)
            .when("ArnLike", "aws:SourceArn", get_att(ids::BUCKET, "Arn"))
            .when("StringEquals", "aws:SourceAccount", site.env.account_value()),
        secure_transport_only(log_bucket_arn, log_objects_arn),
    ])
    .to_value()?;

    let properties = json!({
        "Bucket": ref_to(ids::LOG_BUCKET),
        "PolicyDocument": document
    });

    template.add_resource(
        ids::LOG_BUCKET_POLICY,
        ResourceDecl::new("AWS::S3::BucketPolicy", properties),
    )
}

pub(crate) fn declare_bucket(template: &mut Template, site: &SiteParams) -> Result<(), SynthError> {
    let properties = json!({
        "BucketName": site.domain.bucket_name(),
        "PublicAccessBlockConfiguration": private_bucket_block(),
        "VersioningConfiguration": { "Status": "Enabled" },
        "LifecycleConfiguration": {
            "Rules": [
                {
                    "Id": "expire-noncurrent-versions",
                    "Status": "Enabled",
                    "NoncurrentVersionExpiration": {
                        "NoncurrentDays": NONCURRENT_VERSION_EXPIRATION_DAYS
                    },
                    "AbortIncompleteMultipartUpload": {
                        "DaysAfterInitiation": ABORT_INCOMPLETE_UPLOAD_DAYS
                    }
                }
            ]
        },
        "LoggingConfiguration": {
            "DestinationBucketName": ref_to(ids::LOG_BUCKET),
            "LogFilePrefix": ACCESS_LOG_PREFIX
        },
        "BucketEncryption": {
            "ServerSideEncryptionConfiguration": [
                { "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" } }
            ]
        },
        "OwnershipControls": {
            "Rules": [ { "ObjectOwnership": "BucketOwnerEnforced" } ]
        },
        "Tags": [ { "Key": "site", "Value": site.domain.as_str() } ]
    });

    template.add_resource(
        ids::BUCKET,
        ResourceDecl::new("AWS::S3::Bucket", properties).removal_policy(DeletionPolicy::Delete),
    )
}

pub(crate) fn declare_origin_access_control(
    template: &mut Template,
    site: &SiteParams,
) -> Result<(), SynthError> {
    let properties = json!({
        "OriginAccessControlConfig": {
            "Name": format!("{}-oac", site.domain.slug()),
            "Description": format!("Lets CloudFront read the {} site bucket", site.domain),
            "OriginAccessControlOriginType": "s3",
            "SigningBehavior": "always",
            "SigningProtocol": "sigv4"
        }
    });

    template.add_resource(
        ids::ORIGIN_ACCESS_CONTROL,
        ResourceDecl::new("AWS::CloudFront::OriginAccessControl", properties),
    )
}

/// Grants read access to this stack's distribution only and rejects plain HTTP.
///
/// Declared as its own resource so the bucket itself never references the
/// distribution, which keeps the graph acyclic.
pub(crate) fn declare_bucket_policy(
    template: &mut Template,
    site: &SiteParams,
) -> Result<(), SynthError> {
    let bucket_arn = get_att(ids::BUCKET, "Arn");
    let objects_arn = join("", vec![get_att(ids::BUCKET, "Arn"), json!("/*")]);

    let document = PolicyDocument::new(vec![
        Statement::allow(&["s3:GetObject"])
            .sid("AllowCloudFrontServicePrincipalReadOnly")
            .principal(Principal::Service("cloudfront.amazonaws.com".to_string()))
            .on(objects_arn.clone())
            .when("StringEquals", "AWS:SourceArn", distribution_arn(site)),
        secure_transport_only(bucket_arn, objects_arn),
    ])
    .to_value()?;

    let properties = json!({
        "Bucket": ref_to(ids::BUCKET),
        "PolicyDocument": document
    });

    template.add_resource(
        ids::BUCKET_POLICY,
        ResourceDecl::new("AWS::S3::BucketPolicy", properties),
    )
}

/// `arn:aws:cloudfront::<account>:distribution/<id>` for this stack's distribution.
pub(crate) fn distribution_arn(site: &SiteParams) -> Value {
    join(
        "",
        vec![
            json!("arn:"),
            ref_to(crate::template::PARTITION),
            json!(":cloudfront::"),
            site.env.account_value(),
            json!(":distribution/"),
            ref_to(ids::DISTRIBUTION),
        ],
    )
}
