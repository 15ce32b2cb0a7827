//! Shared runtime state for CLI interactions and command execution.

use std::sync::Arc;

use dialoguer::theme::ColorfulTheme;
use tracing::debug;

use cuentas_config::{base_dir, Config, ConfigManager};
use cuentas_core::{
    format::{CurrencyFormatter, DateFormatter, EsArFormat},
    parser::ChatAssistant,
    Database, KeyValueStore, MemoryStore, Session, SettingsService,
};
use cuentas_domain::{EntityId, Identifiable, NamedEntity, Profile};
use cuentas_storage_json::JsonFileStore;

use super::{
    commands,
    core::{CliError, CommandError, CommandResult},
    io as cli_io,
    output::{self, OutputPreferences},
    registry::{CommandEntry, CommandRegistry},
    shell::CliOptions,
};
use crate::utils::paths::AppPaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// Shortest id prefix accepted in place of a full id.
const MIN_ID_PREFIX: usize = 4;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub paths: AppPaths,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub session: Session,
    /// Present when the session is backed by files; `--memory` sessions have none.
    pub backups: Option<Arc<JsonFileStore>>,
    pub assistant: ChatAssistant,
    pub format: EsArFormat,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode, options: &CliOptions) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let base = base_dir();
        let config_manager = ConfigManager::with_base_dir(&base)?;
        let config = config_manager.load()?;
        crate::init_with_filter(&config.log_filter);
        output::set_preferences(OutputPreferences {
            color: config.color && mode == CliMode::Interactive,
        });
        let paths = AppPaths::resolve(&base, &config);

        let (store, backups) = if options.memory {
            let store: Arc<dyn KeyValueStore> = match config.quota_bytes {
                Some(quota) => Arc::new(MemoryStore::with_quota(quota)),
                None => Arc::new(MemoryStore::new()),
            };
            (store, None)
        } else {
            let files = Arc::new(JsonFileStore::with_retention(
                &paths.data,
                config.quota_bytes,
                config.backup_retention,
            )?);
            let store: Arc<dyn KeyValueStore> = files.clone();
            (store, Some(files))
        };
        debug!(data = %paths.data.display(), memory = options.memory, "store opened");

        let context = ShellContext {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            paths,
            config_manager,
            config,
            session: Session::new(Database::new(store)),
            backups,
            assistant: ChatAssistant::new(),
            format: EsArFormat,
            last_command: None,
            running: true,
        };
        context.greet()?;
        Ok(context)
    }

    fn greet(&self) -> Result<(), CliError> {
        if self.mode != CliMode::Interactive {
            return Ok(());
        }
        match self.session.current()? {
            Some(profile) => cli_io::print_info(format!("Signed in as `{}`.", profile.username)),
            None => {
                if let Some(last) = &self.config.last_user {
                    cli_io::print_hint(format!("Last profile: `{last}`. Use `login {last}`."));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn prompt(&self) -> String {
        match self.session.current() {
            Ok(Some(profile)) => format!("cuentas[{}]> ", profile.username),
            _ => "cuentas> ".to_string(),
        }
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn db(&self) -> &Database {
        self.session.database()
    }

    /// The signed-in profile.
    pub(crate) fn user(&self) -> Result<Profile, CommandError> {
        Ok(self.session.require_user()?)
    }

    pub(crate) fn currency(&self, user_id: &EntityId) -> Result<String, CommandError> {
        Ok(SettingsService::load(self.db(), user_id)?.currency)
    }

    pub(crate) fn money(&self, amount: f64, currency: &str) -> String {
        self.format.format_amount(amount, currency)
    }

    pub(crate) fn date(&self, date: chrono::NaiveDate) -> String {
        self.format.format_date(date)
    }

    /// Asks before destructive actions; scripts always proceed.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn require_backups(&self) -> Result<&JsonFileStore, CommandError> {
        self.backups.as_deref().ok_or_else(|| {
            CommandError::Message("Backups are unavailable in a `--memory` session.".into())
        })
    }
}

pub(crate) fn short_id(id: &EntityId) -> String {
    id.as_str().chars().take(8).collect()
}

/// Finds a record by full id or by an unambiguous id prefix.
pub(crate) fn resolve_id<'a, T: Identifiable>(
    items: &'a [T],
    reference: &str,
    entity: &str,
) -> Result<&'a T, CommandError> {
    let reference = reference.trim();
    if let Some(exact) = items.iter().find(|item| item.id().as_str() == reference) {
        return Ok(exact);
    }
    if reference.len() < MIN_ID_PREFIX {
        return Err(CommandError::InvalidArguments(format!(
            "{entity} `{reference}` not found"
        )));
    }
    let mut matches = items
        .iter()
        .filter(|item| item.id().as_str().starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(found), None) => Ok(found),
        (Some(_), Some(_)) => Err(CommandError::InvalidArguments(format!(
            "{entity} id `{reference}` is ambiguous; use more characters"
        ))),
        (None, _) => Err(CommandError::InvalidArguments(format!(
            "{entity} `{reference}` not found"
        ))),
    }
}

/// Finds a named record by case-insensitive name, falling back to its id.
pub(crate) fn resolve_named<'a, T: Identifiable + NamedEntity>(
    items: &'a [T],
    reference: &str,
    entity: &str,
) -> Result<&'a T, CommandError> {
    let needle = reference.trim().to_lowercase();
    match items.iter().find(|item| item.name().to_lowercase() == needle) {
        Some(found) => Ok(found),
        None => resolve_id(items, reference, entity),
    }
}
