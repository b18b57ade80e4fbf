//! Command-line surface for inspecting and updating a JWT issuance policy.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use jwt_policy_config::{HELP_DESCRIPTION, HELP_SYNOPSIS};
use jwt_policy_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use tracing::debug;

use crate::commands::config::{handle_apply, handle_schema, handle_show};
use crate::commands::evaluate::handle_evaluate;
use crate::context::{AppContext, CliError, CliResult};

/// Parses CLI arguments, executes the requested command, and prints the
/// rendered result. Returns the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(rendered) => {
            print!("{rendered}");
            0
        }
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn dispatch(cli: Cli) -> CliResult<String> {
    install_logging(&cli)?;
    debug!(command = command_label(&cli.command), seed = ?cli.seed, "dispatching command");

    let seed = cli.seed.as_deref();
    match cli.command {
        Command::Schema => handle_schema(cli.output),
        Command::Show => handle_show(&AppContext::load(seed)?, cli.output),
        Command::Apply(args) => handle_apply(&AppContext::load(seed)?, &args, cli.output),
        Command::Evaluate(args) => handle_evaluate(&AppContext::load(seed)?, &args, cli.output),
    }
}

fn install_logging(cli: &Cli) -> CliResult<()> {
    let format = cli
        .log_format
        .parse::<LogFormat>()
        .map_err(|err| CliError::validation(format!("{err} '{}'", cli.log_format)))?;
    let config = LoggingConfig {
        level: &cli.log_level,
        format,
        build_sha: env!("CARGO_PKG_VERSION"),
    };
    init_logging(&config).map_err(CliError::failure)
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Show => "show",
        Command::Apply(_) => "apply",
        Command::Schema => "schema",
        Command::Evaluate(_) => "evaluate",
    }
}

#[derive(Parser)]
#[command(name = "jwt-policy", about = HELP_SYNOPSIS, long_about = HELP_DESCRIPTION)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "JWT_POLICY_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL
    )]
    log_level: String,
    #[arg(
        long,
        global = true,
        env = "JWT_POLICY_LOG_FORMAT",
        default_value = "auto",
        help = "Log format: json, pretty, or auto"
    )]
    log_format: String,
    #[arg(
        long,
        global = true,
        env = "JWT_POLICY_SEED",
        help = "JSON policy update applied on top of the defaults before the command runs"
    )]
    seed: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the effective policy.
    Show,
    /// Apply a JSON policy update and print the resulting policy.
    Apply(ApplyArgs),
    /// Describe every policy field.
    Schema,
    /// Check audiences, a subject and claim names against the policy.
    Evaluate(EvaluateArgs),
}

#[derive(Args)]
pub(crate) struct ApplyArgs {
    #[arg(long, short = 'f', help = "Path to a JSON policy update")]
    pub(crate) file: PathBuf,
}

#[derive(Args)]
pub(crate) struct EvaluateArgs {
    #[arg(long = "audience", help = "Requested audience; repeat for several")]
    pub(crate) audiences: Vec<String>,
    #[arg(long, help = "Requested subject")]
    pub(crate) subject: Option<String>,
    #[arg(long = "claim", help = "Claim name to check; repeat for several")]
    pub(crate) claims: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}
