//! Integration tests for stack synthesis.

mod common;

use std::collections::BTreeSet;

use serde_json::{json, Value};
use tempfile::TempDir;

use common::*;
use sitestack::error::{ConfigError, SitestackError};
use sitestack::graph::ResourceGraph;
use sitestack::stack::{
    ids, outputs, synthesize, ACCESS_LOG_PREFIX, CDN_LOG_PREFIX, CLOUDFRONT_HOSTED_ZONE_ID,
    ERROR_PAGE_PATH, LOG_DELIVERY_SERVICE,
};

fn policy_statements(properties: &Value) -> Vec<Value> {
    properties["PolicyDocument"]["Statement"]
        .as_array()
        .expect("Statement array")
        .clone()
}

fn is_pseudo(id: &str) -> bool {
    id.starts_with("AWS::")
}

#[test]
fn test_creates_zone_when_no_id_given() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let template = &artifact.template;

    let zone = template.resource(ids::HOSTED_ZONE).expect("zone declared");
    assert_eq!(zone.resource_type, "AWS::Route53::HostedZone");
    assert_eq!(zone.properties["Name"], TEST_DOMAIN);

    let name_servers = template.output(outputs::NAME_SERVERS).expect("NameServers output");
    assert_eq!(
        name_servers.value,
        json!({ "Fn::Join": [", ", { "Fn::GetAtt": [ids::HOSTED_ZONE, "NameServers"] }] })
    );

    let records = properties(template, ids::APEX_RECORD);
    assert_eq!(ref_target(&records["HostedZoneId"]), Some(ids::HOSTED_ZONE));
}

#[test]
fn test_references_existing_zone() {
    let artifact = synthesize(&PropsBuilder::new().existing_zone(TEST_ZONE_ID).build()).unwrap();
    let template = &artifact.template;

    assert!(!template.has_resource(ids::HOSTED_ZONE));
    assert!(template.output(outputs::NAME_SERVERS).is_none());

    for id in [ids::APEX_RECORD, ids::WWW_RECORD] {
        assert_eq!(properties(template, id)["HostedZoneId"], TEST_ZONE_ID);
    }
    let certificate = properties(template, ids::CERTIFICATE);
    for option in certificate["DomainValidationOptions"].as_array().unwrap() {
        assert_eq!(option["HostedZoneId"], TEST_ZONE_ID);
    }
}

#[test]
fn test_api_style_zone_id_is_accepted() {
    let zone = format!("/hostedzone/{}", TEST_ZONE_ID);
    let artifact = synthesize(&PropsBuilder::new().existing_zone(&zone).build()).unwrap();
    assert_eq!(
        properties(&artifact.template, ids::APEX_RECORD)["HostedZoneId"],
        TEST_ZONE_ID
    );
}

#[test]
fn test_missing_domain_fails() {
    for props in [
        PropsBuilder::new().no_domain().build(),
        PropsBuilder::new().domain("   ").build(),
    ] {
        let err = synthesize(&props).unwrap_err();
        assert!(
            matches!(err, SitestackError::Config(ConfigError::MissingDomainName)),
            "unexpected error: {}",
            err
        );
    }
}

#[test]
fn test_invalid_inputs_fail_fast() {
    struct TestCase {
        name: &'static str,
        props: sitestack::StackProps,
    }

    let test_cases = vec![
        TestCase {
            name: "malformed domain",
            props: PropsBuilder::new().domain("not_a_domain").build(),
        },
        TestCase {
            name: "malformed zone id",
            props: PropsBuilder::new().existing_zone("zone-1").build(),
        },
        TestCase {
            name: "bad stack name",
            props: PropsBuilder::new().stack_name("my stack").build(),
        },
    ];

    for tc in test_cases {
        let result = synthesize(&tc.props);
        assert!(
            matches!(result, Err(SitestackError::Config(_))),
            "{}: expected a config error",
            tc.name
        );
    }
}

#[test]
fn test_bucket_is_private_and_versioned() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let bucket = artifact.template.resource(ids::BUCKET).unwrap();

    assert_eq!(bucket.properties["BucketName"], "example-com-website");
    let block = &bucket.properties["PublicAccessBlockConfiguration"];
    for key in [
        "BlockPublicAcls",
        "BlockPublicPolicy",
        "IgnorePublicAcls",
        "RestrictPublicBuckets",
    ] {
        assert_eq!(block[key], true, "{}", key);
    }
    assert_eq!(bucket.properties["VersioningConfiguration"]["Status"], "Enabled");

    let rendered = artifact.template.to_value().unwrap();
    assert_eq!(rendered["Resources"][ids::BUCKET]["DeletionPolicy"], "Delete");
}

#[test]
fn test_bucket_policy_scoped_to_own_distribution() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let policy = properties(&artifact.template, ids::BUCKET_POLICY);
    let statements = policy_statements(&policy);

    let read = statements
        .iter()
        .find(|s| s["Effect"] == "Allow")
        .expect("allow statement");
    assert_eq!(read["Principal"], json!({ "Service": "cloudfront.amazonaws.com" }));
    assert_eq!(read["Action"], json!(["s3:GetObject"]));

    let source_arn = &read["Condition"]["StringEquals"]["AWS:SourceArn"];
    let targets: Vec<_> = referenced_ids(source_arn)
        .into_iter()
        .filter(|id| !is_pseudo(id))
        .collect();
    assert_eq!(targets, [ids::DISTRIBUTION]);

    // The account is baked in when known
    let parts = source_arn["Fn::Join"][1].as_array().unwrap();
    assert!(parts.contains(&json!(TEST_ACCOUNT)));

    let deny = statements
        .iter()
        .find(|s| s["Effect"] == "Deny")
        .expect("deny statement");
    assert_eq!(deny["Condition"]["Bool"]["aws:SecureTransport"], "false");
}

#[test]
fn test_logs_stay_out_of_the_served_bucket() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let template = &artifact.template;

    let log_bucket = properties(template, ids::LOG_BUCKET);
    assert_eq!(log_bucket["BucketName"], "example-com-logs");
    assert_eq!(
        log_bucket["PublicAccessBlockConfiguration"]["RestrictPublicBuckets"],
        true
    );

    let site_bucket = properties(template, ids::BUCKET);
    let logging = &site_bucket["LoggingConfiguration"];
    assert_eq!(ref_target(&logging["DestinationBucketName"]), Some(ids::LOG_BUCKET));
    assert_eq!(logging["LogFilePrefix"], ACCESS_LOG_PREFIX);

    let cdn_logging = &properties(template, ids::DISTRIBUTION)["DistributionConfig"]["Logging"];
    assert_eq!(get_att_target(&cdn_logging["Bucket"]), Some(ids::LOG_BUCKET));
    assert_eq!(cdn_logging["Prefix"], CDN_LOG_PREFIX);

    // CloudFront may read the site bucket only
    let policy = properties(template, ids::BUCKET_POLICY);
    let read = policy_statements(&policy)
        .into_iter()
        .find(|s| s["Effect"] == "Allow")
        .expect("allow statement");
    let targets: BTreeSet<_> = read["Resource"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(referenced_ids)
        .filter(|id| !is_pseudo(id))
        .collect();
    assert_eq!(targets, BTreeSet::from([ids::BUCKET.to_string()]));
}

#[test]
fn test_log_delivery_grant_scoped_to_site_bucket() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let policy = properties(&artifact.template, ids::LOG_BUCKET_POLICY);
    assert_eq!(ref_target(&policy["Bucket"]), Some(ids::LOG_BUCKET));

    let statements = policy_statements(&policy);
    let delivery = statements
        .iter()
        .find(|s| s["Effect"] == "Allow")
        .expect("allow statement");
    assert_eq!(delivery["Principal"], json!({ "Service": LOG_DELIVERY_SERVICE }));
    assert_eq!(delivery["Action"], json!(["s3:PutObject"]));

    let resource = &delivery["Resource"][0];
    assert_eq!(referenced_ids(resource), [ids::LOG_BUCKET]);
    assert_eq!(resource["Fn::Join"][1][1], format!("/{}*", ACCESS_LOG_PREFIX));

    let source_arn = &delivery["Condition"]["ArnLike"]["aws:SourceArn"];
    assert_eq!(get_att_target(source_arn), Some(ids::BUCKET));
    assert_eq!(
        delivery["Condition"]["StringEquals"]["aws:SourceAccount"],
        TEST_ACCOUNT
    );

    let deny = statements
        .iter()
        .find(|s| s["Effect"] == "Deny")
        .expect("deny statement");
    assert_eq!(deny["Condition"]["Bool"]["aws:SecureTransport"], "false");

    let cloudfront = json!({ "Service": "cloudfront.amazonaws.com" });
    assert!(statements.iter().all(|s| s["Principal"] != cloudfront));
}

#[test]
fn test_unresolved_account_uses_pseudo_parameter() {
    let artifact = synthesize(&PropsBuilder::new().unresolved_account().build()).unwrap();
    let policy = properties(&artifact.template, ids::BUCKET_POLICY);
    let statements = policy_statements(&policy);
    let source_arn = &statements[0]["Condition"]["StringEquals"]["AWS:SourceArn"];

    assert!(referenced_ids(source_arn).contains(&"AWS::AccountId".to_string()));
    assert_eq!(artifact.manifest().environment, "aws://unknown-account/us-east-1");
}

#[test]
fn test_deployment_policy_least_privilege() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let policy = properties(&artifact.template, ids::DEPLOYMENT_POLICY);

    assert_eq!(ref_target(&policy["Users"][0]), Some(ids::DEPLOYMENT_USER));

    let mut targets = BTreeSet::new();
    let mut actions = BTreeSet::new();
    for statement in policy_statements(&policy) {
        assert_eq!(statement["Effect"], "Allow");
        for resource in statement["Resource"].as_array().unwrap() {
            assert_ne!(resource, "*", "wildcard resource in {}", statement);
            targets.extend(referenced_ids(resource).into_iter().filter(|id| !is_pseudo(id)));
        }
        for action in statement["Action"].as_array().unwrap() {
            let action = action.as_str().unwrap().to_string();
            assert!(!action.ends_with('*'), "wildcard action {}", action);
            actions.insert(action);
        }
    }

    assert_eq!(
        targets,
        BTreeSet::from([ids::BUCKET.to_string(), ids::DISTRIBUTION.to_string()])
    );
    assert_eq!(
        actions,
        BTreeSet::from(
            [
                "cloudfront:CreateInvalidation",
                "s3:DeleteObject",
                "s3:GetObject",
                "s3:ListBucket",
                "s3:PutObject",
            ]
            .map(String::from)
        )
    );
}

#[test]
fn test_alias_records_share_distribution() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let template = &artifact.template;

    let apex = properties(template, ids::APEX_RECORD);
    let www = properties(template, ids::WWW_RECORD);

    assert_eq!(apex["Name"], TEST_DOMAIN);
    assert_eq!(www["Name"], "www.example.com");
    for record in [&apex, &www] {
        assert_eq!(record["Type"], "A");
        assert_eq!(get_att_target(&record["AliasTarget"]["DNSName"]), Some(ids::DISTRIBUTION));
        assert_eq!(record["AliasTarget"]["HostedZoneId"], CLOUDFRONT_HOSTED_ZONE_ID);
    }
    assert_eq!(apex["AliasTarget"], www["AliasTarget"]);
}

#[test]
fn test_distribution_configuration() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let distribution = properties(&artifact.template, ids::DISTRIBUTION);
    let config = &distribution["DistributionConfig"];

    assert_eq!(config["Aliases"], json!(["example.com", "www.example.com"]));
    assert_eq!(
        config["DefaultCacheBehavior"]["ViewerProtocolPolicy"],
        "redirect-to-https"
    );
    assert_eq!(
        ref_target(&config["DefaultCacheBehavior"]["ResponseHeadersPolicyId"]),
        Some(ids::HEADERS_POLICY)
    );
    assert_eq!(
        ref_target(&config["ViewerCertificate"]["AcmCertificateArn"]),
        Some(ids::CERTIFICATE)
    );
    assert_eq!(
        get_att_target(&config["Origins"][0]["OriginAccessControlId"]),
        Some(ids::ORIGIN_ACCESS_CONTROL)
    );

    let error_codes: Vec<_> = config["CustomErrorResponses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            assert_eq!(r["ResponsePagePath"], ERROR_PAGE_PATH);
            r["ErrorCode"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(error_codes, [403, 404]);
}

#[test]
fn test_security_headers() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let policy = properties(&artifact.template, ids::HEADERS_POLICY);
    let security = &policy["ResponseHeadersPolicyConfig"]["SecurityHeadersConfig"];

    assert_eq!(
        security["StrictTransportSecurity"]["AccessControlMaxAgeSec"],
        63_072_000
    );
    assert_eq!(security["FrameOptions"]["FrameOption"], "DENY");

    let custom = policy["ResponseHeadersPolicyConfig"]["CustomHeadersConfig"]["Items"]
        .as_array()
        .unwrap();
    assert_eq!(custom.len(), sitestack::stack::CUSTOM_HEADERS.len());
}

#[test]
fn test_references_resolve_and_order_is_safe() {
    let artifact = synthesize(&PropsBuilder::new().build()).unwrap();
    let graph = ResourceGraph::from_template(&artifact.template);
    graph.validate().unwrap();

    let order = artifact.creation_order().unwrap();
    assert_eq!(order.len(), artifact.template.resource_count());

    let position = |id: &str| order.iter().position(|o| o == id).unwrap();
    assert!(position(ids::BUCKET) < position(ids::DISTRIBUTION));
    assert!(position(ids::CERTIFICATE) < position(ids::DISTRIBUTION));
    assert!(position(ids::HOSTED_ZONE) < position(ids::CERTIFICATE));
    for later in [ids::APEX_RECORD, ids::WWW_RECORD, ids::DEPLOYMENT_POLICY, ids::BUCKET_POLICY] {
        assert!(position(ids::DISTRIBUTION) < position(later), "{}", later);
    }
}

#[test]
fn test_outputs() {
    let artifact = synthesize(&PropsBuilder::new().stack_name("Marketing").build()).unwrap();
    let template = &artifact.template;

    let url = template.output(outputs::WEBSITE_URL).unwrap();
    assert_eq!(url.value, "https://example.com");
    assert!(url.export.is_none());

    let bucket = template.output(outputs::BUCKET_NAME).unwrap();
    assert_eq!(ref_target(&bucket.value), Some(ids::BUCKET));
    assert_eq!(
        bucket.export.as_ref().unwrap().name,
        json!({ "Fn::Sub": "${AWS::StackName}-BucketName" })
    );

    let ids_out: Vec<_> = template.outputs().map(|(id, _)| id).collect();
    assert_eq!(
        ids_out,
        [
            outputs::BUCKET_NAME,
            outputs::DISTRIBUTION_ID,
            outputs::DISTRIBUTION_DOMAIN_NAME,
            outputs::DEPLOYMENT_USER_NAME,
            outputs::WEBSITE_URL,
            outputs::NAME_SERVERS,
        ]
    );
}

#[test]
fn test_synthesis_is_deterministic() {
    let props = PropsBuilder::new().build();
    let first = synthesize(&props).unwrap().template.to_json_pretty().unwrap();
    let second = synthesize(&props).unwrap().template.to_json_pretty().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_write_cloud_assembly() {
    let artifact = synthesize(&PropsBuilder::new().stack_name("Marketing").build()).unwrap();
    let out = TempDir::new().unwrap();
    let dir = out.path().join("cdk.out");

    let written = artifact.write_to(&dir).unwrap();
    assert_eq!(
        written,
        [dir.join("Marketing.template.json"), dir.join("manifest.json")]
    );

    let template: Value =
        serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    assert!(template["Resources"][ids::DISTRIBUTION].is_object());

    let manifest: Value =
        serde_json::from_str(&std::fs::read_to_string(&written[1]).unwrap()).unwrap();
    assert_eq!(manifest["stackName"], "Marketing");
    assert_eq!(manifest["templateFile"], "Marketing.template.json");
    assert_eq!(manifest["environment"], "aws://123456789012/us-east-1");
    assert_eq!(manifest["region"], "us-east-1");
}
