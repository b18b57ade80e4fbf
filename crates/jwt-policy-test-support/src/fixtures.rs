//! Canned administrative write requests.

use serde_json::{Value, json};

/// Full write request whose every field is derived from `tag`.
///
/// Two requests with different tags share no field values, so a document that
/// mixes fields from two of them is detectable with [`crate::assert::document_tag`].
#[must_use]
pub fn tagged_update(tag: u64) -> Value {
    json!({
        "key_ttl": format!("{}m", tag + 1),
        "jwt_ttl": format!("{}s", tag + 1),
        "set_iat": tag % 2 == 0,
        "set_jti": tag % 3 == 0,
        "set_nbf": tag % 5 == 0,
        "issuer": format!("issuer-{tag}"),
        "audience_pattern": format!("^aud-{tag}$"),
        "subject_pattern": format!("^sub-{tag}$"),
        "max_audiences": tag,
        "allowed_claims": [format!("claim-{tag}"), "aud"],
    })
}

/// Write request touching only the issuer.
#[must_use]
pub fn issuer_only(issuer: &str) -> Value {
    json!({ "issuer": issuer })
}

/// Write request using the descriptive field aliases.
#[must_use]
pub fn aliased_update() -> Value {
    json!({
        "rotation-period": "24h",
        "token-ttl": "15m",
        "set-iat": false,
        "set-jti": true,
        "set-nbf": false,
        "audience-pattern": "^api\\.",
        "subject-pattern": "^user:[0-9]+$",
        "max-audiences": 2,
        "allowed-claims": ["aud", "sub", "scope"],
    })
}
