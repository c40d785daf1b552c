//! Intrinsic function helpers.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

// `${Name}` or `${Name.Attr}`; `${!Literal}` is an escape
static RE_SUB_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^!}][^}.]*)(?:\.[^}]*)?\}").unwrap());

/// Pseudo parameter resolving to the deploying account.
pub const ACCOUNT_ID: &str = "AWS::AccountId";

/// Pseudo parameter resolving to the partition (`aws`, `aws-cn`, ...).
pub const PARTITION: &str = "AWS::Partition";

/// `{ "Ref": id }`
pub fn ref_to(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{ "Fn::GetAtt": [id, attribute] }`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{ "Fn::Join": [delimiter, parts] }`
pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

/// `{ "Fn::Sub": template }`
pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}

/// Returns true for names CloudFormation resolves itself (`AWS::Region`, ...).
pub fn is_pseudo_parameter(name: &str) -> bool {
    name.starts_with("AWS::")
}

/// Extracts the names referenced by `${...}` placeholders in an `Fn::Sub` string.
///
/// `${Id.Attr}` yields `Id`; escaped `${!Literal}` placeholders are skipped.
pub fn sub_placeholders(template: &str) -> Vec<String> {
    RE_SUB_PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
