//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use jwt_policy_config::{FIELDS, HELP_DESCRIPTION, PolicyDocument};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::evaluate::Evaluation;
use crate::context::{CliError, CliResult};

pub(crate) fn render_document(document: &PolicyDocument, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_pretty_json(document),
        OutputFormat::Table => {
            let value = serde_json::to_value(document)
                .map_err(|err| CliError::failure(anyhow!("failed to format policy: {err}")))?;
            let mut out = String::new();
            for spec in &FIELDS {
                let rendered = value.get(spec.name).map_or_else(String::new, display_value);
                out.push_str(&format!("{:<18} {rendered}\n", spec.name));
            }
            Ok(out)
        }
    }
}

pub(crate) fn render_schema(format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            let fields: Vec<Value> = FIELDS
                .iter()
                .map(|spec| {
                    serde_json::json!({
                        "name": spec.name,
                        "alias": spec.alias,
                        "kind": spec.kind.as_str(),
                        "description": spec.description,
                    })
                })
                .collect();
            to_pretty_json(&fields)
        }
        OutputFormat::Table => {
            let mut out = String::from(HELP_DESCRIPTION);
            out.push('\n');
            out.push_str(&format!("{:<18} {:<18} KIND\n", "FIELD", "ALIAS"));
            for spec in &FIELDS {
                out.push_str(&format!(
                    "{:<18} {:<18} {}\n",
                    spec.name,
                    spec.alias,
                    spec.kind.as_str()
                ));
            }
            Ok(out)
        }
    }
}

pub(crate) fn render_evaluation(evaluation: &Evaluation, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_pretty_json(evaluation),
        OutputFormat::Table => {
            let mut out = format!("revision           {}\n", evaluation.revision);
            out.push_str(&format!("audiences          {}\n", evaluation.audiences));
            if let Some(allowed) = evaluation.subject_allowed {
                out.push_str(&format!("subject            {}\n", verdict(allowed)));
            }
            out.push_str(&format!(
                "generated          {}\n",
                evaluation.generated_claims.join(", ")
            ));
            for claim in &evaluation.claims {
                let note = if claim.generated { " (generated)" } else { "" };
                out.push_str(&format!(
                    "claim {:<12} {}{note}\n",
                    claim.name,
                    verdict(claim.allowed)
                ));
            }
            Ok(out)
        }
    }
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) if text.is_empty() => "<empty>".to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

const fn verdict(allowed: bool) -> &'static str {
    if allowed { "allowed" } else { "rejected" }
}
