use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::short_id;
use crate::cli::table::{Table, TableColumn};
use crate::cli::output;

use super::usage_error;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "register",
            "Create a profile and sign in",
            "register <username> [profile-type]",
            cmd_register,
        ),
        CommandEntry::new(
            "login",
            "Sign in, creating the profile if needed",
            "login <username> [profile-type]",
            cmd_login,
        ),
        CommandEntry::new("logout", "Sign out", "logout", cmd_logout),
        CommandEntry::new("whoami", "Show the signed-in profile", "whoami", cmd_whoami),
        CommandEntry::new("profiles", "List every profile", "profiles", cmd_profiles),
        CommandEntry::new(
            "switch",
            "Switch to an existing profile",
            "switch <username>",
            cmd_switch,
        ),
        CommandEntry::new(
            "delete-profile",
            "Delete a profile record (defaults to the signed-in one)",
            "delete-profile [username]",
            cmd_delete_profile,
        ),
    ]
}

fn cmd_register(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let username = args
        .first()
        .ok_or_else(|| usage_error("register <username> [profile-type]"))?;
    let profile_type = args.get(1).copied().unwrap_or_default();
    let profile = context.session.register_profile(username, profile_type)?;
    context.assistant.reset();
    remember_user(context, &profile.username)?;
    io::print_success(format!(
        "Profile `{}` created ({}).",
        profile.username, profile.profile_type
    ));
    Ok(())
}

fn cmd_login(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let username = args
        .first()
        .ok_or_else(|| usage_error("login <username> [profile-type]"))?;
    let existed = context.session.find_profile(username)?.is_some();
    let profile = context.session.sign_in(username, args.get(1).copied())?;
    context.assistant.reset();
    remember_user(context, &profile.username)?;
    if existed {
        io::print_success(format!("Signed in as `{}`.", profile.username));
    } else {
        io::print_success(format!(
            "Profile `{}` created and signed in.",
            profile.username
        ));
    }
    Ok(())
}

fn cmd_logout(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.session.sign_out()?;
    context.assistant.reset();
    io::print_success("Signed out.");
    Ok(())
}

fn cmd_whoami(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let profile = context.user()?;
    io::print_info(format!(
        "{} ({}) since {}",
        profile.username,
        profile.profile_type,
        profile.created_at.format("%d/%m/%Y")
    ));
    Ok(())
}

fn cmd_profiles(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let profiles = context.session.profiles()?;
    if profiles.is_empty() {
        io::print_info("No profiles yet. Use `register <username>`.");
        return Ok(());
    }
    let current = context.session.current()?.map(|profile| profile.id);
    let mut table = Table::new(vec![
        TableColumn::left(""),
        TableColumn::left("ID"),
        TableColumn::left("USERNAME"),
        TableColumn::left("TYPE"),
    ]);
    for profile in &profiles {
        let marker = if current.as_ref() == Some(&profile.id) { "*" } else { "" };
        table.push(vec![
            marker.into(),
            short_id(&profile.id),
            profile.username.clone(),
            profile.profile_type.clone(),
        ]);
    }
    output::plain(table.render());
    Ok(())
}

fn cmd_switch(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let username = args.first().ok_or_else(|| usage_error("switch <username>"))?;
    let profile = context.session.switch_profile(username)?;
    context.assistant.reset();
    remember_user(context, &profile.username)?;
    io::print_success(format!("Switched to `{}`.", profile.username));
    Ok(())
}

fn cmd_delete_profile(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let profile = match args.first() {
        Some(username) => context
            .session
            .find_profile(username)?
            .ok_or_else(|| CommandError::InvalidArguments(format!("profile `{username}` not found")))?,
        None => context.user()?,
    };
    if !context.confirm(&format!("Delete profile `{}`?", profile.username))? {
        io::print_info("Operation cancelled.");
        return Ok(());
    }
    if context.session.delete_profile(&profile.id)? {
        if context
            .config
            .last_user
            .as_deref()
            .is_some_and(|last| profile.matches_username(last))
        {
            context.config.last_user = None;
            context.persist_config()?;
        }
        io::print_success(format!("Profile `{}` deleted.", profile.username));
    } else {
        io::print_warning(format!("Profile `{}` was already gone.", profile.username));
    }
    Ok(())
}

fn remember_user(context: &mut ShellContext, username: &str) -> CommandResult {
    if context.config.last_user.as_deref() != Some(username) {
        context.config.last_user = Some(username.to_string());
        context.persist_config()?;
    }
    Ok(())
}
