pub mod backup;
pub mod budget;
pub mod dashboard;
pub mod lookup;
pub mod profile;
pub mod receipt;
pub mod settings;
pub mod system;
pub mod transaction;

use crate::cli::core::CommandError;
use crate::cli::registry::{CommandEntry, CommandRegistry};

const ROOT_COMMAND_ORDER: &[&str] = &[
    "register",
    "login",
    "logout",
    "whoami",
    "profiles",
    "switch",
    "delete-profile",
    "tx",
    "chat",
    "category",
    "method",
    "person",
    "budget",
    "folder",
    "receipt",
    "dashboard",
    "settings",
    "people",
    "config",
    "backup",
    "help",
    "version",
    "exit",
];

pub(crate) fn all_entries() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(profile::definitions());
    commands.extend(transaction::definitions());
    commands.extend(lookup::definitions());
    commands.extend(budget::definitions());
    commands.extend(receipt::definitions());
    commands.extend(dashboard::definitions());
    commands.extend(settings::definitions());
    commands.extend(backup::definitions());
    commands.extend(system::definitions());
    commands
}

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let mut entries = all_entries();
    entries.sort_by_key(|entry| {
        ROOT_COMMAND_ORDER
            .iter()
            .position(|name| entry.name.eq_ignore_ascii_case(name))
            .unwrap_or(ROOT_COMMAND_ORDER.len())
    });
    for entry in entries {
        registry.register(entry);
    }
}

/// Splits `<action> [args..]`, failing with `usage` when no action is given.
pub(crate) fn split_action<'a>(
    args: &'a [&'a str],
    usage: &str,
) -> Result<(String, &'a [&'a str]), CommandError> {
    match args.split_first() {
        Some((action, rest)) => Ok((action.to_lowercase(), rest)),
        None => Err(usage_error(usage)),
    }
}

pub(crate) fn usage_error(usage: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {usage}"))
}

/// Reads `--name value` pairs after the positional arguments.
pub(crate) fn flag_value<'a>(args: &[&'a str], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|pair| pair[0].eq_ignore_ascii_case(flag))
        .map(|pair| pair[1])
}

/// Arguments before the first `--flag`.
pub(crate) fn positional<'a>(args: &'a [&'a str]) -> &'a [&'a str] {
    let end = args
        .iter()
        .position(|arg| arg.starts_with("--"))
        .unwrap_or(args.len());
    &args[..end]
}

pub(crate) fn parse_amount_arg(raw: &str) -> Result<f64, CommandError> {
    let normalized = raw.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{raw}` is not a positive amount"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_follows_root_order() {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"register"));
        assert_eq!(names.last(), Some(&"exit"));
        assert_eq!(names.len(), ROOT_COMMAND_ORDER.len());
    }

    #[test]
    fn flags_split_from_positionals() {
        let args = ["Super", "500", "--date", "2024-07-01", "--person", "Ana"];
        assert_eq!(positional(&args), &["Super", "500"]);
        assert_eq!(flag_value(&args, "--person"), Some("Ana"));
        assert_eq!(flag_value(&args, "--method"), None);
    }

    #[test]
    fn amounts_accept_comma_decimals() {
        assert_eq!(parse_amount_arg("1500,50").unwrap(), 1500.5);
        assert!(parse_amount_arg("-3").is_err());
        assert!(parse_amount_arg("mil").is_err());
    }
}
