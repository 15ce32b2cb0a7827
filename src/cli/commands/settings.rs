//! Per-profile settings, the people list, and CLI configuration.

use cuentas_config::Config;
use cuentas_core::{KeyValueStore, SettingsService};

use crate::cli::core::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{self, OutputPreferences};
use crate::cli::registry::CommandEntry;

use super::{split_action, usage_error};

const SETTINGS_USAGE: &str =
    "settings <show|set <currency|dark_mode|live_with_others> <value>>";
const PEOPLE_USAGE: &str = "people <add <name>|rm <name>>";
const CONFIG_USAGE: &str =
    "config [show|set <key> <value>|backup [note]|backups|restore <name>]";

/// Keys that only apply the next time the shell starts.
const RESTART_KEYS: &[&str] = &["quota_bytes", "backup_retention", "log_filter", "data_dir"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "settings",
            "Show or change profile settings",
            SETTINGS_USAGE,
            cmd_settings,
        ),
        CommandEntry::new(
            "people",
            "Manage who shares expenses with you",
            PEOPLE_USAGE,
            cmd_people,
        ),
        CommandEntry::new(
            "config",
            "View and manage CLI preferences",
            CONFIG_USAGE,
            cmd_config,
        ),
    ]
}

fn cmd_settings(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let db = context.db();
    match args {
        [] | ["show"] => {
            let settings = SettingsService::load(db, &user.id)?;
            output::section(format!("Settings for {}", user.username));
            io::print_info(format!("  Currency         : {}", settings.currency));
            io::print_info(format!("  Dark mode        : {}", on_off(settings.dark_mode)));
            io::print_info(format!(
                "  Live with others : {}",
                on_off(settings.live_with_others)
            ));
            let people = if settings.people.is_empty() {
                "(none)".to_string()
            } else {
                settings.people.join(", ")
            };
            io::print_info(format!("  People           : {people}"));
            Ok(())
        }
        ["set", key, value] => {
            match key.to_lowercase().as_str() {
                "currency" => {
                    let settings = SettingsService::set_currency(db, &user.id, value)?;
                    io::print_success(format!("Currency set to {}.", settings.currency));
                }
                "dark_mode" | "dark-mode" => {
                    SettingsService::set_dark_mode(db, &user.id, parse_switch(value)?)?;
                    io::print_success("Dark mode updated.");
                }
                "live_with_others" | "live-with-others" => {
                    SettingsService::set_live_with_others(db, &user.id, parse_switch(value)?)?;
                    io::print_success("Household setting updated.");
                }
                other => {
                    return Err(CommandError::InvalidArguments(format!(
                        "unknown setting `{other}`"
                    )))
                }
            }
            Ok(())
        }
        _ => Err(usage_error(SETTINGS_USAGE)),
    }
}

fn cmd_people(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let (action, rest) = split_action(args, PEOPLE_USAGE)?;
    let name = rest.join(" ");
    if name.trim().is_empty() {
        return Err(usage_error(PEOPLE_USAGE));
    }
    match action.as_str() {
        "add" => {
            let settings = SettingsService::add_person(context.db(), &user.id, &name)?;
            io::print_success(format!("People: {}.", settings.people.join(", ")));
        }
        "rm" | "remove" => {
            let before = SettingsService::load(context.db(), &user.id)?.people.len();
            let settings = SettingsService::remove_person(context.db(), &user.id, &name)?;
            if settings.people.len() == before {
                io::print_warning(format!("`{}` was not listed.", name.trim()));
            } else {
                io::print_success(format!("`{}` removed.", name.trim()));
            }
        }
        _ => return Err(usage_error(PEOPLE_USAGE)),
    }
    Ok(())
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["show"] => {
            show_config(context);
            Ok(())
        }
        ["set", key, value @ ..] if !value.is_empty() => {
            let key = key.to_lowercase();
            context.config.set(&key, &value.join(" "))?;
            context.persist_config()?;
            if key == "color" {
                output::set_preferences(OutputPreferences {
                    color: context.config.color && context.mode == CliMode::Interactive,
                });
            }
            io::print_success("Configuration updated.");
            if RESTART_KEYS.contains(&key.as_str()) {
                io::print_hint("Restart the shell for this change to take effect.");
            }
            Ok(())
        }
        ["backup", note @ ..] => {
            let note = (!note.is_empty()).then(|| note.join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            io::print_success(format!("Configuration backed up as `{name}`."));
            Ok(())
        }
        ["backups"] => {
            let names = context.config_manager.list_backups()?;
            if names.is_empty() {
                io::print_info("No configuration backups yet.");
            }
            for name in names {
                io::print_info(format!("  {name}"));
            }
            Ok(())
        }
        ["restore", name] => {
            context.config = context.config_manager.restore(name)?;
            io::print_success(format!("Configuration restored from `{name}`."));
            Ok(())
        }
        _ => Err(usage_error(CONFIG_USAGE)),
    }
}

fn show_config(context: &ShellContext) {
    let config: &Config = &context.config;
    output::section("Configuration");
    io::print_info(format!("  Locale           : {}", config.locale));
    io::print_info(format!("  Currency         : {}", config.currency));
    io::print_info(format!(
        "  Quota            : {}",
        config
            .quota_bytes
            .map(|bytes| format!("{bytes} bytes"))
            .unwrap_or_else(|| "none".into())
    ));
    io::print_info(format!("  Backup retention : {}", config.backup_retention));
    io::print_info(format!("  Log filter       : {}", config.log_filter));
    io::print_info(format!("  Color            : {}", on_off(config.color)));
    io::print_info(format!(
        "  Last user        : {}",
        config.last_user.as_deref().unwrap_or("(none)")
    ));
    io::print_info(format!("  Data directory   : {}", context.paths.data.display()));
    if let Some(store) = &context.backups {
        if let Ok(usage) = store.usage() {
            io::print_info(format!("  Store usage      : {} bytes", usage.used_bytes));
        }
    } else {
        io::print_info("  Store            : in memory (this session only)");
    }
}

fn parse_switch(raw: &str) -> Result<bool, CommandError> {
    match raw.to_lowercase().as_str() {
        "on" | "true" | "yes" | "si" | "sí" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(CommandError::InvalidArguments(format!(
            "expected on or off, got `{other}`"
        ))),
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
