//! Dispatch, error reporting, and the command error type.

use std::io;

use cuentas_config::ConfigError;
use cuentas_core::CoreError;
use strsim::levenshtein;

pub use crate::cli::shell_context::{CliMode, ShellContext};
pub use crate::errors::CliError;

use super::io as cli_io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

/// Largest edit distance still offered as a suggestion.
const SUGGESTION_DISTANCE: usize = 3;

impl ShellContext {
    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        if let Some(best) = closest_command(self.registry.names(), input) {
            cli_io::print_info(format!("Suggestion: `{best}`?"));
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Exit shell?", true)
            .map_err(|err| CliError::Command(err.to_string()))
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::NotSignedIn => {
                cli_io::print_error(CommandError::NotSignedIn);
                cli_io::print_hint("Try `register ana` to get started.");
            }
            CommandError::Core(CoreError::QuotaExceeded { .. }) => {
                cli_io::print_error(err);
                cli_io::print_hint("Remove old receipts or raise `config set quota_bytes`.");
            }
            other => cli_io::print_error(other),
        }
        Ok(())
    }
}

pub(crate) fn closest_command<'a>(
    names: impl Iterator<Item = &'a str>,
    input: &str,
) -> Option<&'a str> {
    let input = input.to_lowercase();
    names
        .map(|name| (levenshtein(name, &input), name))
        .min_by_key(|(distance, _)| *distance)
        .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
        .map(|(_, name)| name)
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("No profile signed in. Use `login <name>` first.")]
    NotSignedIn,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Core(CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotSignedIn => CommandError::NotSignedIn,
            CoreError::Validation(message) => CommandError::InvalidArguments(message),
            other => CommandError::Core(other),
        }
    }
}

impl From<CliError> for CommandError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::App(inner) => CommandError::Message(inner.to_string()),
            CliError::Input(message) | CliError::Command(message) => {
                CommandError::InvalidArguments(message)
            }
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_stay_close() {
        let names = ["budget", "backup", "dashboard", "tx"];
        assert_eq!(closest_command(names.into_iter(), "budgte"), Some("budget"));
        assert_eq!(closest_command(names.into_iter(), "DASHBORD"), Some("dashboard"));
        assert_eq!(closest_command(names.into_iter(), "configuracion"), None);
    }

    #[test]
    fn validation_errors_read_as_usage_problems() {
        let err = CommandError::from(CoreError::Validation("amount must be positive".into()));
        assert!(matches!(err, CommandError::InvalidArguments(_)));
        assert!(matches!(
            CommandError::from(CoreError::NotSignedIn),
            CommandError::NotSignedIn
        ));
    }
}
