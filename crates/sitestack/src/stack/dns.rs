//! Hosted zone resolution, the site certificate, and alias records.

use serde_json::{json, Value};

use super::ids;
use super::props::{SiteParams, ZoneSource};
use crate::error::SynthError;
use crate::template::{get_att, ref_to, ResourceDecl, Template};

/// Hosted zone id CloudFront distributions live in, for alias records.
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// References the supplied zone, or declares a new one for the domain.
///
/// Returns the template value that resolves to the zone id.
pub(crate) fn resolve_zone(template: &mut Template, site: &SiteParams) -> Result<Value, SynthError> {
    match &site.zone {
        ZoneSource::Existing(id) => {
            log::info!("Using existing hosted zone {} for {}", id, site.domain);
            Ok(Value::String(id.as_str().to_string()))
        }
        ZoneSource::Create => {
            log::info!("Declaring a new hosted zone for {}", site.domain);
            let properties = json!({
                "Name": site.domain.as_str(),
                "HostedZoneConfig": {
                    "Comment": format!("Managed by the {} stack", site.stack_name)
                }
            });
            template.add_resource(
                ids::HOSTED_ZONE,
                ResourceDecl::new("AWS::Route53::HostedZone", properties),
            )?;
            Ok(ref_to(ids::HOSTED_ZONE))
        }
    }
}

/// Certificate for the apex and `www`, validated through DNS in the zone.
pub(crate) fn declare_certificate(
    template: &mut Template,
    site: &SiteParams,
    zone_id: &Value,
) -> Result<(), SynthError> {
    let apex = site.domain.as_str();
    let www = site.domain.www();

    let properties = json!({
        "DomainName": apex,
        "SubjectAlternativeNames": [www],
        "ValidationMethod": "DNS",
        "DomainValidationOptions": [
            { "DomainName": apex, "HostedZoneId": zone_id },
            { "DomainName": www, "HostedZoneId": zone_id }
        ]
    });

    template.add_resource(
        ids::CERTIFICATE,
        ResourceDecl::new("AWS::CertificateManager::Certificate", properties),
    )
}

/// `A` alias records for the apex and `www`, both pointing at the distribution.
pub(crate) fn declare_alias_records(
    template: &mut Template,
    site: &SiteParams,
    zone_id: &Value,
) -> Result<(), SynthError> {
    let records = [
        (ids::APEX_RECORD, site.domain.as_str().to_string()),
        (ids::WWW_RECORD, site.domain.www()),
    ];

    for (logical_id, name) in records {
        let properties = json!({
            "HostedZoneId": zone_id,
            "Name": name,
            "Type": "A",
            "AliasTarget": {
                "DNSName": get_att(ids::DISTRIBUTION, "DomainName"),
                "HostedZoneId": CLOUDFRONT_HOSTED_ZONE_ID,
                "EvaluateTargetHealth": false
            }
        });
        template.add_resource(
            logical_id,
            ResourceDecl::new("AWS::Route53::RecordSet", properties),
        )?;
    }

    Ok(())
}
