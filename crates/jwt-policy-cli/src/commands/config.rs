use jwt_policy_config::PolicyDocument;
use tracing::info;

use crate::cli::{ApplyArgs, OutputFormat};
use crate::context::{AppContext, CliError, CliResult, read_update};
use crate::output::{render_document, render_schema};

pub(crate) fn handle_show(ctx: &AppContext, format: OutputFormat) -> CliResult<String> {
    let snapshot = ctx.store.snapshot();
    render_document(&snapshot.to_document(), format)
}

pub(crate) fn handle_apply(
    ctx: &AppContext,
    args: &ApplyArgs,
    format: OutputFormat,
) -> CliResult<String> {
    let document = apply_file(ctx, args)?;
    render_document(&document, format)
}

pub(crate) fn handle_schema(format: OutputFormat) -> CliResult<String> {
    render_schema(format)
}

fn apply_file(ctx: &AppContext, args: &ApplyArgs) -> CliResult<PolicyDocument> {
    let update = read_update(&args.file)?;
    let snapshot = ctx
        .store
        .apply_update(update)
        .map_err(|err| CliError::policy(&err))?;
    info!(revision = snapshot.revision, file = %args.file.display(), "policy update applied");
    Ok(snapshot.to_document())
}
