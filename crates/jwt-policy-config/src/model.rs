//! Typed policy models, update payloads, and wire documents.
//!
//! # Design
//! - `PolicyConfig` is the live record; `PolicySnapshot` is an owned copy handed to callers.
//! - `PolicyUpdate` is the sparse write payload, `PolicyDocument` the flat read payload.
//! - The allowed-claims membership set is private to `AllowedClaims` and only built from a full list.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::duration;
use crate::schema;

/// Live token policy governing issuance and verification.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// How long a signing key remains active for new tokens.
    pub key_rotation_period: Duration,
    /// Validity window of an issued token.
    pub token_ttl: Duration,
    /// Whether the issuer generates the `iat` claim.
    pub set_iat: bool,
    /// Whether the issuer generates the `jti` claim.
    pub set_jti: bool,
    /// Whether the issuer generates the `nbf` claim.
    pub set_nbf: bool,
    /// Value of the `iss` claim; empty omits the claim.
    pub issuer: String,
    /// Pattern every requested audience must match.
    pub audience_pattern: Regex,
    /// Pattern the requested subject must match.
    pub subject_pattern: Regex,
    /// Maximum audiences per token; negative means unlimited.
    pub max_audiences: i64,
    /// Claims callers may set beyond the generated ones.
    pub allowed_claims: AllowedClaims,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            key_rotation_period: defaults::KEY_ROTATION_PERIOD,
            token_ttl: defaults::TOKEN_TTL,
            set_iat: defaults::SET_IAT,
            set_jti: defaults::SET_JTI,
            set_nbf: defaults::SET_NBF,
            issuer: defaults::issuer(),
            audience_pattern: DEFAULT_AUDIENCE_PATTERN.clone(),
            subject_pattern: DEFAULT_SUBJECT_PATTERN.clone(),
            max_audiences: defaults::UNLIMITED_AUDIENCES,
            allowed_claims: defaults::ALLOWED_CLAIMS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

static DEFAULT_AUDIENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(defaults::AUDIENCE_PATTERN).expect("default audience pattern"));
static DEFAULT_SUBJECT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(defaults::SUBJECT_PATTERN).expect("default subject pattern"));

/// Outcome of checking a set of requested audiences against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudienceVerdict {
    /// Every audience is acceptable.
    Allowed,
    /// More audiences were requested than `max_audiences` permits.
    TooMany {
        /// Number of audiences requested.
        count: usize,
        /// Configured limit.
        limit: i64,
    },
    /// An audience did not match `audience_pattern`.
    PatternMismatch {
        /// First rejected audience.
        audience: String,
    },
}

impl PolicyConfig {
    /// Whether callers may set the named claim.
    #[must_use]
    pub fn allows_claim(&self, name: &str) -> bool {
        self.allowed_claims.contains(name)
    }

    /// Whether a single audience value matches `audience_pattern`.
    #[must_use]
    pub fn audience_matches(&self, audience: &str) -> bool {
        self.audience_pattern.is_match(audience)
    }

    /// Whether the subject matches `subject_pattern`.
    #[must_use]
    pub fn subject_matches(&self, subject: &str) -> bool {
        self.subject_pattern.is_match(subject)
    }

    /// Whether `count` audiences fit within `max_audiences`.
    #[must_use]
    pub fn audience_count_allowed(&self, count: usize) -> bool {
        usize::try_from(self.max_audiences)
            .ok()
            .is_none_or(|limit| count <= limit)
    }

    /// Check requested audiences for count and pattern, reporting the first violation.
    #[must_use]
    pub fn check_audiences<'a, I>(&self, audiences: I) -> AudienceVerdict
    where
        I: IntoIterator<Item = &'a str>,
    {
        let audiences: Vec<&str> = audiences.into_iter().collect();
        if !self.audience_count_allowed(audiences.len()) {
            return AudienceVerdict::TooMany {
                count: audiences.len(),
                limit: self.max_audiences,
            };
        }

        audiences
            .into_iter()
            .find(|audience| !self.audience_matches(audience))
            .map_or(AudienceVerdict::Allowed, |audience| {
                AudienceVerdict::PatternMismatch {
                    audience: audience.to_string(),
                }
            })
    }

    /// Claims the issuer stamps on every token under this policy.
    #[must_use]
    pub fn generated_claims(&self) -> Vec<&'static str> {
        let mut claims = Vec::with_capacity(5);
        if !self.issuer.is_empty() {
            claims.push("iss");
        }
        claims.push("exp");
        if self.set_iat {
            claims.push("iat");
        }
        if self.set_jti {
            claims.push("jti");
        }
        if self.set_nbf {
            claims.push("nbf");
        }
        claims
    }

    /// Render the record using the wire field names.
    #[must_use]
    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument::from(self)
    }
}

/// Ordered allow-list of claim names with a derived membership set.
///
/// The set is rebuilt from the list on construction and never mutated on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedClaims {
    names: Vec<String>,
    lookup: HashSet<String>,
}

impl AllowedClaims {
    /// Build the allow-list and its membership set from a complete list.
    #[must_use]
    pub fn from_list(names: Vec<String>) -> Self {
        let lookup = names.iter().cloned().collect();
        Self { names, lookup }
    }

    /// Whether the claim is on the allow-list.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }

    /// Claim names in the order they were supplied.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    /// Number of entries in the list, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for AllowedClaims {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self::from_list(iter.into_iter().collect())
    }
}

/// Sparse update payload; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyUpdate {
    /// New key rotation period as a duration string.
    #[serde(default, alias = "rotation-period", skip_serializing_if = "Option::is_none")]
    pub key_ttl: Option<String>,
    /// New token TTL as a duration string.
    #[serde(default, alias = "token-ttl", skip_serializing_if = "Option::is_none")]
    pub jwt_ttl: Option<String>,
    /// New `iat` generation flag.
    #[serde(default, alias = "set-iat", skip_serializing_if = "Option::is_none")]
    pub set_iat: Option<bool>,
    /// New `jti` generation flag.
    #[serde(default, alias = "set-jti", skip_serializing_if = "Option::is_none")]
    pub set_jti: Option<bool>,
    /// New `nbf` generation flag.
    #[serde(default, alias = "set-nbf", skip_serializing_if = "Option::is_none")]
    pub set_nbf: Option<bool>,
    /// New issuer; empty omits the claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// New audience pattern source.
    #[serde(default, alias = "audience-pattern", skip_serializing_if = "Option::is_none")]
    pub audience_pattern: Option<String>,
    /// New subject pattern source.
    #[serde(default, alias = "subject-pattern", skip_serializing_if = "Option::is_none")]
    pub subject_pattern: Option<String>,
    /// New audience limit; `-1` for unlimited.
    #[serde(default, alias = "max-audiences", skip_serializing_if = "Option::is_none")]
    pub max_audiences: Option<i64>,
    /// Replacement allow-list.
    #[serde(default, alias = "allowed-claims", skip_serializing_if = "Option::is_none")]
    pub allowed_claims: Option<Vec<String>>,
}

impl PolicyUpdate {
    /// Whether the update carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.key_ttl.is_none()
            && self.jwt_ttl.is_none()
            && self.set_iat.is_none()
            && self.set_jti.is_none()
            && self.set_nbf.is_none()
            && self.issuer.is_none()
            && self.audience_pattern.is_none()
            && self.subject_pattern.is_none()
            && self.max_audiences.is_none()
            && self.allowed_claims.is_none()
    }

    /// Wire names of the fields present, in validation order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        [
            (schema::KEY_TTL, self.key_ttl.is_some()),
            (schema::JWT_TTL, self.jwt_ttl.is_some()),
            (schema::SET_IAT, self.set_iat.is_some()),
            (schema::SET_JTI, self.set_jti.is_some()),
            (schema::SET_NBF, self.set_nbf.is_some()),
            (schema::ISSUER, self.issuer.is_some()),
            (schema::AUDIENCE_PATTERN, self.audience_pattern.is_some()),
            (schema::SUBJECT_PATTERN, self.subject_pattern.is_some()),
            (schema::MAX_AUDIENCES, self.max_audiences.is_some()),
            (schema::ALLOWED_CLAIMS, self.allowed_claims.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

/// Flat read payload keyed by the wire field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Key rotation period in canonical duration form.
    pub key_ttl: String,
    /// Token TTL in canonical duration form.
    pub jwt_ttl: String,
    /// `iat` generation flag.
    pub set_iat: bool,
    /// `jti` generation flag.
    pub set_jti: bool,
    /// `nbf` generation flag.
    pub set_nbf: bool,
    /// Issuer claim value.
    pub issuer: String,
    /// Audience pattern source.
    pub audience_pattern: String,
    /// Subject pattern source.
    pub subject_pattern: String,
    /// Audience limit.
    pub max_audiences: i64,
    /// Allow-listed claim names.
    pub allowed_claims: Vec<String>,
}

impl From<&PolicyConfig> for PolicyDocument {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            key_ttl: duration::format(config.key_rotation_period),
            jwt_ttl: duration::format(config.token_ttl),
            set_iat: config.set_iat,
            set_jti: config.set_jti,
            set_nbf: config.set_nbf,
            issuer: config.issuer.clone(),
            audience_pattern: config.audience_pattern.as_str().to_string(),
            subject_pattern: config.subject_pattern.as_str().to_string(),
            max_audiences: config.max_audiences,
            allowed_claims: config.allowed_claims.as_slice().to_vec(),
        }
    }
}

impl From<PolicyDocument> for PolicyUpdate {
    fn from(document: PolicyDocument) -> Self {
        Self {
            key_ttl: Some(document.key_ttl),
            jwt_ttl: Some(document.jwt_ttl),
            set_iat: Some(document.set_iat),
            set_jti: Some(document.set_jti),
            set_nbf: Some(document.set_nbf),
            issuer: Some(document.issuer),
            audience_pattern: Some(document.audience_pattern),
            subject_pattern: Some(document.subject_pattern),
            max_audiences: Some(document.max_audiences),
            allowed_claims: Some(document.allowed_claims),
        }
    }
}

/// Owned copy of the policy at a point in time.
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    /// Monotonic revision; `0` is the initial record.
    pub revision: u64,
    /// When the current revision was committed.
    pub updated_at: DateTime<Utc>,
    /// Policy values at this revision.
    pub config: PolicyConfig,
}

impl PolicySnapshot {
    /// Render the snapshot using the wire field names.
    #[must_use]
    pub fn to_document(&self) -> PolicyDocument {
        self.config.to_document()
    }
}
