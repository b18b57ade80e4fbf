//! Field names and help metadata for the policy configuration surface.
//!
//! # Design
//! - Wire names are defined once here and shared by the update and document types.
//! - Help text is static metadata rendered by administrative tooling.

/// Duration before a key stops being used to sign new tokens.
pub const KEY_TTL: &str = "key_ttl";
/// Duration a token is valid for.
pub const JWT_TTL: &str = "jwt_ttl";
/// Whether the `iat` claim is generated.
pub const SET_IAT: &str = "set_iat";
/// Whether the `jti` claim is generated.
pub const SET_JTI: &str = "set_jti";
/// Whether the `nbf` claim is generated.
pub const SET_NBF: &str = "set_nbf";
/// Value stamped into the `iss` claim.
pub const ISSUER: &str = "issuer";
/// Pattern incoming `aud` values must match.
pub const AUDIENCE_PATTERN: &str = "audience_pattern";
/// Pattern incoming `sub` values must match.
pub const SUBJECT_PATTERN: &str = "subject_pattern";
/// Maximum number of audiences, `-1` for unlimited.
pub const MAX_AUDIENCES: &str = "max_audiences";
/// Claims callers may set in addition to generated ones.
pub const ALLOWED_CLAIMS: &str = "allowed_claims";

/// Value type accepted for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Duration string such as `24h` or `15m`.
    Duration,
    /// Boolean flag.
    Bool,
    /// Free-form string.
    String,
    /// Regular expression source.
    Pattern,
    /// Signed integer.
    Int,
    /// List of strings.
    StringList,
}

impl FieldKind {
    /// Render the kind as a short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Pattern => "pattern",
            Self::Int => "int",
            Self::StringList => "string list",
        }
    }
}

/// Static description of a single configuration field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Canonical wire name.
    pub name: &'static str,
    /// Descriptive alias accepted on input.
    pub alias: &'static str,
    /// Value type.
    pub kind: FieldKind,
    /// Human-readable description.
    pub description: &'static str,
}

/// Every field in validation order.
pub const FIELDS: [FieldSpec; 10] = [
    FieldSpec {
        name: KEY_TTL,
        alias: "rotation-period",
        kind: FieldKind::Duration,
        description: "Duration before a key stops being used to sign new tokens.",
    },
    FieldSpec {
        name: JWT_TTL,
        alias: "token-ttl",
        kind: FieldKind::Duration,
        description: "Duration a token is valid for.",
    },
    FieldSpec {
        name: SET_IAT,
        alias: "set-iat",
        kind: FieldKind::Bool,
        description: "Whether or not the 'iat' claim is generated and set.",
    },
    FieldSpec {
        name: SET_JTI,
        alias: "set-jti",
        kind: FieldKind::Bool,
        description: "Whether or not the 'jti' claim is generated and set.",
    },
    FieldSpec {
        name: SET_NBF,
        alias: "set-nbf",
        kind: FieldKind::Bool,
        description: "Whether or not the 'nbf' claim is generated and set.",
    },
    FieldSpec {
        name: ISSUER,
        alias: "issuer",
        kind: FieldKind::String,
        description: "Value to set as the 'iss' claim. Claim is omitted if empty.",
    },
    FieldSpec {
        name: AUDIENCE_PATTERN,
        alias: "audience-pattern",
        kind: FieldKind::Pattern,
        description: "Regular expression which must match incoming 'aud' claims.",
    },
    FieldSpec {
        name: SUBJECT_PATTERN,
        alias: "subject-pattern",
        kind: FieldKind::Pattern,
        description: "Regular expression which must match incoming 'sub' claims.",
    },
    FieldSpec {
        name: MAX_AUDIENCES,
        alias: "max-audiences",
        kind: FieldKind::Int,
        description: "Maximum number of allowed audiences, or -1 for no limit.",
    },
    FieldSpec {
        name: ALLOWED_CLAIMS,
        alias: "allowed-claims",
        kind: FieldKind::StringList,
        description: "Claims which are able to be set in addition to ones generated by the issuer. \
                      'aud' and 'sub' should be in this list to allow setting them.",
    },
];

/// One-line summary of the configuration surface.
pub const HELP_SYNOPSIS: &str = "Configure token signing and validation policy.";

/// Long-form help for the configuration surface.
pub const HELP_DESCRIPTION: &str = "\
Configure token signing and validation policy.

key_ttl:          Duration before a key stops signing new tokens and a new one is generated.
                  After this period the public key remains available to verify tokens.
jwt_ttl:          Duration before a token expires.
set_iat:          Whether or not the 'iat' claim is generated and set.
set_jti:          Whether or not the 'jti' claim is generated and set.
set_nbf:          Whether or not the 'nbf' claim is generated and set.
issuer:           Value to set as the 'iss' claim. Claim omitted if empty.
audience_pattern: Regular expression which must match incoming 'aud' claims.
subject_pattern:  Regular expression which must match incoming 'sub' claims.
max_audiences:    Maximum number of allowed audiences, or -1 for no limit.
allowed_claims:   Claims which are able to be set in addition to ones generated by the issuer.
                  'aud' and 'sub' should be in this list to allow setting them.
";

/// Look up a field by canonical name or alias.
#[must_use]
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS
        .iter()
        .find(|spec| spec.name == name || spec.alias == name)
}
