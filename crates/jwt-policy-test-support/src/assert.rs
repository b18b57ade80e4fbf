//! Assertions over rendered policy documents.

use anyhow::{Context, Result, anyhow, ensure};
use serde_json::Value;

/// Recover the tag of a document produced by [`crate::fixtures::tagged_update`].
///
/// # Errors
///
/// Returns an error if any tagged field is missing or carries a value from a
/// different tag than the issuer, i.e. the document mixes two writes.
pub fn document_tag(document: &Value) -> Result<u64> {
    let issuer = string_field(document, "issuer")?;
    let tag: u64 = issuer
        .strip_prefix("issuer-")
        .ok_or_else(|| anyhow!("issuer '{issuer}' is not tagged"))?
        .parse()
        .with_context(|| format!("issuer '{issuer}' has a non-numeric tag"))?;

    let expect_string = |field: &str, expected: String| -> Result<()> {
        let actual = string_field(document, field)?;
        ensure!(
            actual == expected,
            "field '{field}' is '{actual}', expected '{expected}' for tag {tag}"
        );
        Ok(())
    };
    let expect_duration = |field: &str, raw: String, seconds: u64| -> Result<()> {
        let actual = string_field(document, field)?;
        let rendered = rendered_seconds(seconds);
        ensure!(
            actual == raw || actual == rendered,
            "field '{field}' is '{actual}', expected '{rendered}' for tag {tag}"
        );
        Ok(())
    };
    expect_duration("key_ttl", format!("{}m", tag + 1), (tag + 1) * 60)?;
    expect_duration("jwt_ttl", format!("{}s", tag + 1), tag + 1)?;

    expect_string("audience_pattern", format!("^aud-{tag}$"))?;
    expect_string("subject_pattern", format!("^sub-{tag}$"))?;

    let expect_bool = |field: &str, expected: bool| -> Result<()> {
        let actual = document
            .get(field)
            .and_then(Value::as_bool)
            .ok_or_else(|| anyhow!("field '{field}' missing or not a bool"))?;
        ensure!(actual == expected, "field '{field}' mixes writes for tag {tag}");
        Ok(())
    };
    expect_bool("set_iat", tag % 2 == 0)?;
    expect_bool("set_jti", tag % 3 == 0)?;
    expect_bool("set_nbf", tag % 5 == 0)?;

    let max = document
        .get("max_audiences")
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("field 'max_audiences' missing or negative"))?;
    ensure!(max == tag, "max_audiences {max} does not match tag {tag}");

    let first_claim = document
        .get("allowed_claims")
        .and_then(Value::as_array)
        .and_then(|claims| claims.first())
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("field 'allowed_claims' missing or empty"))?;
    ensure!(
        first_claim == format!("claim-{tag}"),
        "allowed_claims '{first_claim}' does not match tag {tag}"
    );

    Ok(tag)
}

/// Assert that every field name in `expected` is present in `document`.
///
/// # Errors
///
/// Returns an error naming the first missing field.
pub fn has_fields(document: &Value, expected: &[&str]) -> Result<()> {
    let object = document
        .as_object()
        .ok_or_else(|| anyhow!("document is not an object"))?;
    for field in expected {
        ensure!(object.contains_key(*field), "document lacks '{field}'");
    }
    Ok(())
}

/// Canonical rendering of a whole number of seconds (`42s`, `1m30s`, `8h21m0s`).
#[must_use]
pub fn rendered_seconds(total: u64) -> String {
    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn string_field<'a>(document: &'a Value, field: &str) -> Result<&'a str> {
    document
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("field '{field}' missing or not a string"))
}
