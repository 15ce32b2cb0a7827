use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new(
            "version",
            "Show build metadata",
            "version",
            cmd_version,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first() {
        None => help::print_overview(&context.registry),
        Some(name) => match context.command(name) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        },
    }
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("Cuentas {}", meta.version));
    io::print_info(format!("  Commit   : {} ({})", meta.git_hash, meta.git_status));
    io::print_info(format!("  Built    : {}", meta.timestamp));
    io::print_info(format!("  Profile  : {}", meta.profile));
    io::print_info(format!("  Compiler : {}", meta.rustc));
    Ok(())
}

fn cmd_exit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.running = false;
    Err(CommandError::ExitRequested)
}
