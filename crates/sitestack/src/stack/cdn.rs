//! Security-headers policy and the CloudFront distribution.

use serde_json::json;

use super::ids;
use super::props::SiteParams;
use crate::error::SynthError;
use crate::template::{get_att, ref_to, ResourceDecl, Template};

/// Provider-managed "CachingOptimized" cache policy.
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

pub const MINIMUM_PROTOCOL_VERSION: &str = "TLSv1.2_2021";

/// North America and Europe edge locations only.
pub const PRICE_CLASS: &str = "PriceClass_100";

pub const DEFAULT_ROOT_OBJECT: &str = "index.html";

pub const ERROR_PAGE_PATH: &str = "/404.html";

pub const CDN_LOG_PREFIX: &str = "cdn-logs/";

const ORIGIN_ID: &str = "SiteBucketOrigin";

/// Two years.
const HSTS_MAX_AGE_SECS: u64 = 63_072_000;

const ERROR_CACHING_MIN_TTL_SECS: u64 = 300;

/// Headers added to every response on top of the standard security headers.
pub const CUSTOM_HEADERS: &[(&str, &str)] = &[
    (
        "Permissions-Policy",
        "camera=(), microphone=(), geolocation=(), interest-cohort=()",
    ),
    ("Cross-Origin-Opener-Policy", "same-origin"),
    ("Cross-Origin-Resource-Policy", "same-origin"),
    ("X-Permitted-Cross-Domain-Policies", "none"),
];

pub(crate) fn declare_security_headers_policy(
    template: &mut Template,
    site: &SiteParams,
) -> Result<(), SynthError> {
    let custom_headers: Vec<_> = CUSTOM_HEADERS
        .iter()
        .map(|(header, value)| json!({ "Header": header, "Value": value, "Override": true }))
        .collect();

    let properties = json!({
        "ResponseHeadersPolicyConfig": {
            "Name": format!("{}-security-headers", site.domain.slug()),
            "Comment": format!("Security headers for {}", site.domain),
            "SecurityHeadersConfig": {
                "StrictTransportSecurity": {
                    "AccessControlMaxAgeSec": HSTS_MAX_AGE_SECS,
                    "IncludeSubdomains": true,
                    "Preload": true,
                    "Override": true
                },
                "ContentTypeOptions": { "Override": true },
                "FrameOptions": { "FrameOption": "DENY", "Override": true },
                "ReferrerPolicy": {
                    "ReferrerPolicy": "strict-origin-when-cross-origin",
                    "Override": true
                }
            },
            "CustomHeadersConfig": { "Items": custom_headers }
        }
    });

    template.add_resource(
        ids::HEADERS_POLICY,
        ResourceDecl::new("AWS::CloudFront::ResponseHeadersPolicy", properties),
    )
}

pub(crate) fn declare_distribution(
    template: &mut Template,
    site: &SiteParams,
) -> Result<(), SynthError> {
    let error_responses: Vec<_> = [403, 404]
        .iter()
        .map(|code| {
            json!({
                "ErrorCode": code,
                "ResponseCode": 404,
                "ResponsePagePath": ERROR_PAGE_PATH,
                "ErrorCachingMinTTL": ERROR_CACHING_MIN_TTL_SECS
            })
        })
        .collect();

    let properties = json!({
        "DistributionConfig": {
            "Enabled": true,
            "Comment": format!("Static site {}", site.domain),
            "Aliases": [site.domain.as_str(), site.domain.www()],
            "DefaultRootObject": DEFAULT_ROOT_OBJECT,
            "HttpVersion": "http2and3",
            "IPV6Enabled": true,
            "PriceClass": PRICE_CLASS,
            "Origins": [
                {
                    "Id": ORIGIN_ID,
                    "DomainName": get_att(ids::BUCKET, "RegionalDomainName"),
                    "OriginAccessControlId": get_att(ids::ORIGIN_ACCESS_CONTROL, "Id"),
                    // Empty identity: access goes through the origin access control.
                    "S3OriginConfig": { "OriginAccessIdentity": "" }
                }
            ],
            "DefaultCacheBehavior": {
                "TargetOriginId": ORIGIN_ID,
                "ViewerProtocolPolicy": "redirect-to-https",
                "AllowedMethods": ["GET", "HEAD"],
                "CachedMethods": ["GET", "HEAD"],
                "Compress": true,
                "CachePolicyId": CACHING_OPTIMIZED_POLICY_ID,
                "ResponseHeadersPolicyId": ref_to(ids::HEADERS_POLICY)
            },
            "CustomErrorResponses": error_responses,
            "ViewerCertificate": {
                "AcmCertificateArn": ref_to(ids::CERTIFICATE),
                "SslSupportMethod": "sni-only",
                "MinimumProtocolVersion": MINIMUM_PROTOCOL_VERSION
            },
            "Logging": {
                "Bucket": get_att(ids::LOG_BUCKET, "DomainName"),
                "Prefix": CDN_LOG_PREFIX,
                "IncludeCookies": false
            }
        }
    });

    template.add_resource(
        ids::DISTRIBUTION,
        ResourceDecl::new("AWS::CloudFront::Distribution", properties),
    )
}
