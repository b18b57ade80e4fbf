//! Shared policy context and error types for the CLI.

use std::error::Error as _;
use std::path::Path;

use anyhow::Context;
use jwt_policy_config::{PolicyError, PolicyStore, PolicyUpdate};
use tracing::debug;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Policy rejections are caller mistakes, so they map to validation failures.
    pub(crate) fn policy(error: &PolicyError) -> Self {
        let mut message = format!("{error} (value '{}')", error.value());
        if let Some(source) = error.source() {
            message.push_str(": ");
            message.push_str(&source.to_string());
        }
        Self::Validation(message)
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) store: PolicyStore,
}

impl AppContext {
    /// Build the store from defaults, overlaid with the seed update when one is given.
    pub(crate) fn load(seed: Option<&Path>) -> CliResult<Self> {
        let store = match seed {
            Some(path) => {
                let update = read_update(path)?;
                debug!(seed = %path.display(), fields = ?update.field_names(), "seeding policy");
                PolicyStore::seeded(update).map_err(|err| CliError::policy(&err))?
            }
            None => PolicyStore::new(),
        };
        Ok(Self { store })
    }
}

/// Read a JSON policy update from disk.
pub(crate) fn read_update(path: &Path) -> CliResult<PolicyUpdate> {
    let payload = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(CliError::failure)?;

    serde_json::from_str(&payload).map_err(|err| {
        CliError::validation(format!(
            "{} is not a valid policy update: {err}",
            path.display()
        ))
    })
}
