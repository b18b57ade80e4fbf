use jwt_policy_config::{AudienceVerdict, PolicyConfig};
use serde::Serialize;

use crate::cli::{EvaluateArgs, OutputFormat};
use crate::context::{AppContext, CliResult};
use crate::output::render_evaluation;

/// How the current policy treats a prospective token request.
#[derive(Debug, Serialize)]
pub(crate) struct Evaluation {
    pub(crate) revision: u64,
    pub(crate) audiences: String,
    pub(crate) subject_allowed: Option<bool>,
    pub(crate) generated_claims: Vec<&'static str>,
    pub(crate) claims: Vec<ClaimEvaluation>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClaimEvaluation {
    pub(crate) name: String,
    pub(crate) allowed: bool,
    pub(crate) generated: bool,
}

pub(crate) fn handle_evaluate(
    ctx: &AppContext,
    args: &EvaluateArgs,
    format: OutputFormat,
) -> CliResult<String> {
    let snapshot = ctx.store.snapshot();
    let mut evaluation = evaluate(&snapshot.config, args);
    evaluation.revision = snapshot.revision;
    render_evaluation(&evaluation, format)
}

fn evaluate(config: &PolicyConfig, args: &EvaluateArgs) -> Evaluation {
    let audiences = match config.check_audiences(args.audiences.iter().map(String::as_str)) {
        AudienceVerdict::Allowed => "allowed".to_string(),
        AudienceVerdict::TooMany { count, limit } => {
            format!("rejected: {count} audiences exceed limit {limit}")
        }
        AudienceVerdict::PatternMismatch { audience } => {
            format!("rejected: '{audience}' does not match audience_pattern")
        }
    };

    let generated_claims = config.generated_claims();
    let claims = args
        .claims
        .iter()
        .map(|name| ClaimEvaluation {
            name: name.clone(),
            allowed: config.allows_claim(name),
            generated: generated_claims.contains(&name.as_str()),
        })
        .collect();

    Evaluation {
        revision: 0,
        audiences,
        subject_allowed: args
            .subject
            .as_deref()
            .map(|subject| config.subject_matches(subject)),
        generated_claims,
        claims,
    }
}
