//! Whole-store snapshots for the file-backed store.

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};

use super::{split_action, usage_error};

const USAGE: &str = "backup <create [note]|list|restore <id>>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "backup",
        "Snapshot or restore every stored record",
        USAGE,
        cmd_backup,
    )]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    match action.as_str() {
        "create" | "new" => {
            let note = (!rest.is_empty()).then(|| rest.join(" "));
            let info = context.require_backups()?.backup(note.as_deref())?;
            io::print_success(format!("Backup `{}` written.", info.id));
            Ok(())
        }
        "list" | "ls" => {
            let backups = context.require_backups()?.list_backups()?;
            if backups.is_empty() {
                io::print_info("No backups yet. Use `backup create` to make one.");
                return Ok(());
            }
            output::section("Backups");
            let mut table = Table::new(vec![
                TableColumn::left("Id"),
                TableColumn::left("Created"),
                TableColumn::right("Size"),
            ]);
            for info in &backups {
                table.push(vec![
                    info.id.clone(),
                    info.created_at
                        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".into()),
                    format!("{} B", info.size_bytes),
                ]);
            }
            output::plain(table.render());
            Ok(())
        }
        "restore" => {
            let [id] = rest else {
                return Err(usage_error(USAGE));
            };
            let prompt = format!("Replace all stored data with `{id}`?");
            if !context.confirm(&prompt)? {
                io::print_info("Restore cancelled.");
                return Ok(());
            }
            let keys = context.require_backups()?.restore(id)?;
            context.assistant.reset();
            io::print_success(format!("Restored {keys} keys from `{id}`."));
            if context.session.current()?.is_none() {
                io::print_hint("The restored data has no signed-in profile. Use `login <name>`.");
            }
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown backup action `{other}`"
        ))),
    }
}
