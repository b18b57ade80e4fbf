//! Validation helpers for duration and pattern fields.

use std::time::Duration;

use regex::Regex;

use crate::duration;
use crate::error::{PolicyError, PolicyResult};

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_positive_duration(field: &'static str, value: &str) -> PolicyResult<Duration> {
    let parsed = duration::parse(value).map_err(|err| PolicyError::InvalidDuration {
        field,
        value: value.to_string(),
        reason: err.reason(),
    })?;

    if parsed.is_zero() {
        return Err(PolicyError::InvalidDuration {
            field,
            value: value.to_string(),
            reason: "duration must be positive",
        });
    }

    Ok(parsed)
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn compile_pattern(field: &'static str, value: &str) -> PolicyResult<Regex> {
    Regex::new(value).map_err(|source| PolicyError::InvalidPattern {
        field,
        value: value.to_string(),
        source,
    })
}
