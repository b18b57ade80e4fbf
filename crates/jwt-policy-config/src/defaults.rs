//! Default values installed when a policy store is created.
//!
//! # Design
//! - Centralize defaults so the store, CLI, and tests agree on the initial record.
//! - Keep time-based defaults explicit for auditability.

use std::time::Duration;

use uuid::Uuid;

/// Default lifetime of a signing key for new tokens (15 minutes).
pub const KEY_ROTATION_PERIOD: Duration = Duration::from_secs(15 * 60);
/// Default validity window of an issued token (5 minutes).
pub const TOKEN_TTL: Duration = Duration::from_secs(5 * 60);
/// Whether `iat` is generated by default.
pub const SET_IAT: bool = true;
/// Whether `jti` is generated by default.
pub const SET_JTI: bool = true;
/// Whether `nbf` is generated by default.
pub const SET_NBF: bool = true;
/// Pattern that accepts any audience.
pub const AUDIENCE_PATTERN: &str = ".*";
/// Pattern that accepts any subject.
pub const SUBJECT_PATTERN: &str = ".*";
/// Sentinel for an unlimited audience count.
pub const UNLIMITED_AUDIENCES: i64 = -1;
/// Claims callers may set out of the box.
pub const ALLOWED_CLAIMS: &[&str] = &["aud"];
/// Prefix of the generated default issuer.
pub const ISSUER_PREFIX: &str = "jwt-policy";

/// Generate a unique default issuer (`jwt-policy:<uuid>`).
#[must_use]
pub fn issuer() -> String {
    format!("{ISSUER_PREFIX}:{}", Uuid::new_v4())
}
