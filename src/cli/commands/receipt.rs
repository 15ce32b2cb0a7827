//! Receipt folders and uploads.

use std::{fs, path::Path};

use cuentas_core::{
    AttachmentService, DataUrl, FolderScope, FolderService, NoRecompression, Upload, UploadStep,
};
use cuentas_domain::{Attachment, EntityId, Folder};

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::{resolve_id, resolve_named, short_id};
use crate::cli::table::{Table, TableColumn};

use super::{flag_value, positional, split_action, usage_error};

const FOLDER_USAGE: &str = "folder <add <name>|list|rename <name> <new>|rm <name>>";
const RECEIPT_USAGE: &str = "receipt <upload <path> [--folder name] [--description text]|list [--folder name|root] [--search text]|move <id> <folder|root>|describe <id> <text>|save <id> <path>|rm <id>>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("folder", "Group receipts into folders", FOLDER_USAGE, cmd_folder),
        CommandEntry::new(
            "receipt",
            "Upload and organize receipts (PDF, JPEG, PNG)",
            RECEIPT_USAGE,
            cmd_receipt,
        ),
    ]
}

fn cmd_folder(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let db = context.db();
    let (action, rest) = split_action(args, FOLDER_USAGE)?;
    match (action.as_str(), rest) {
        ("add", name) if !name.is_empty() => {
            let folder = FolderService::create(db, &user.id, &name.join(" "))?;
            io::print_success(format!("Folder `{}` created.", folder.name));
        }
        ("list" | "ls", []) => {
            let folders = FolderService::list(db, &user.id)?;
            if folders.is_empty() {
                io::print_info("No folders yet.");
                return Ok(());
            }
            let receipts = AttachmentService::list(db, &user.id, &FolderScope::All, None)?;
            let mut table = Table::new(vec![
                TableColumn::left("ID"),
                TableColumn::left("NAME"),
                TableColumn::right("RECEIPTS"),
            ]);
            for folder in &folders {
                let count = receipts
                    .iter()
                    .filter(|receipt| receipt.folder_id.as_ref() == Some(&folder.id))
                    .count();
                table.push(vec![short_id(&folder.id), folder.name.clone(), count.to_string()]);
            }
            output::plain(table.render());
        }
        ("rename", [reference, new_name @ ..]) if !new_name.is_empty() => {
            let folders = FolderService::list(db, &user.id)?;
            let id = resolve_named(&folders, reference, "Folder")?.id.clone();
            let folder = FolderService::rename(db, &user.id, &id, &new_name.join(" "))?;
            io::print_success(format!("Folder renamed to `{}`.", folder.name));
        }
        ("rm" | "remove", name) if !name.is_empty() => {
            let folders = FolderService::list(db, &user.id)?;
            let folder = resolve_named(&folders, &name.join(" "), "Folder")?;
            if !context.confirm(&format!(
                "Delete folder `{}`? Its receipts move to the root.",
                folder.name
            ))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            FolderService::remove(db, &user.id, &folder.id)?;
            io::print_success(format!("Folder `{}` deleted.", folder.name));
        }
        _ => return Err(usage_error(FOLDER_USAGE)),
    }
    Ok(())
}

fn cmd_receipt(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, RECEIPT_USAGE)?;
    match action.as_str() {
        "upload" | "add" => handle_upload(context, rest),
        "list" | "ls" => handle_list(context, rest),
        "move" | "mv" => handle_move(context, rest),
        "describe" => handle_describe(context, rest),
        "save" => handle_save(context, rest),
        "rm" | "remove" => handle_remove(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown receipt subcommand `{other}`"
        ))),
    }
}

fn handle_upload(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let [path] = positional(args) else {
        return Err(usage_error(RECEIPT_USAGE));
    };
    let path = Path::new(path);
    let file_type = mime_for(path).ok_or_else(|| {
        CommandError::InvalidArguments(format!(
            "`{}` is not a PDF, JPEG, or PNG file",
            path.display()
        ))
    })?;
    let bytes = fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("comprobante")
        .to_string();

    let mut upload = Upload::new(filename, file_type, bytes);
    if let Some(folder) = flag_value(args, "--folder") {
        let folders = FolderService::list(context.db(), &user.id)?;
        upload = upload.in_folder(resolve_named(&folders, folder, "Folder")?.id.clone());
    }
    if let Some(description) = flag_value(args, "--description") {
        upload = upload.described(description);
    }

    let outcome = AttachmentService::upload(context.db(), &user.id, upload, &NoRecompression)?;
    match outcome.step {
        UploadStep::Stored => {}
        UploadStep::Recompressed => {
            io::print_warning("Storage was full; the image was stored at reduced quality.")
        }
        UploadStep::AfterEviction => io::print_warning(format!(
            "Storage was full; removed {} older receipt(s) to make room.",
            outcome.evicted.len()
        )),
    }
    io::print_success(format!(
        "Receipt `{}` uploaded ({}).",
        outcome.attachment.filename,
        short_id(&outcome.attachment.id)
    ));
    Ok(())
}

fn handle_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let folders = FolderService::list(context.db(), &user.id)?;
    let scope = match flag_value(args, "--folder") {
        None => FolderScope::All,
        Some(raw) if raw.eq_ignore_ascii_case("root") => FolderScope::Root,
        Some(raw) => FolderScope::Folder(resolve_named(&folders, raw, "Folder")?.id.clone()),
    };
    let receipts =
        AttachmentService::list(context.db(), &user.id, &scope, flag_value(args, "--search"))?;
    if receipts.is_empty() {
        io::print_info("No receipts found.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("ID"),
        TableColumn::left("DATE"),
        TableColumn::left("FILE").capped(28),
        TableColumn::left("TYPE"),
        TableColumn::left("FOLDER"),
        TableColumn::right("SIZE"),
        TableColumn::left("DESCRIPTION").capped(28),
    ]);
    for receipt in &receipts {
        table.push(vec![
            short_id(&receipt.id),
            context.date(receipt.date.date_naive()),
            receipt.filename.clone(),
            receipt.file_type.clone(),
            folder_name(&folders, receipt.folder_id.as_ref()),
            format_size(receipt.payload_len()),
            receipt.description.clone().unwrap_or_default(),
        ]);
    }
    output::plain(table.render());
    Ok(())
}

fn handle_move(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let [reference, target @ ..] = args else {
        return Err(usage_error("receipt move <id> <folder|root>"));
    };
    if target.is_empty() {
        return Err(usage_error("receipt move <id> <folder|root>"));
    }
    let target = target.join(" ");
    let receipt = find_receipt(context, &user.id, reference)?;
    let folders = FolderService::list(context.db(), &user.id)?;
    let folder_id = if target.eq_ignore_ascii_case("root") {
        None
    } else {
        Some(resolve_named(&folders, &target, "Folder")?.id.clone())
    };
    let moved =
        AttachmentService::move_to_folder(context.db(), &user.id, &receipt.id, folder_id.as_ref())?;
    io::print_success(format!(
        "Receipt `{}` moved to {}.",
        moved.filename,
        folder_name(&folders, moved.folder_id.as_ref())
    ));
    Ok(())
}

fn handle_describe(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let [reference, text @ ..] = args else {
        return Err(usage_error("receipt describe <id> <text>"));
    };
    let receipt = find_receipt(context, &user.id, reference)?;
    let text = text.join(" ");
    let updated = AttachmentService::update_description(
        context.db(),
        &user.id,
        &receipt.id,
        Some(text.as_str()),
    )?;
    match updated.description {
        Some(_) => io::print_success(format!("Description of `{}` updated.", updated.filename)),
        None => io::print_success(format!("Description of `{}` cleared.", updated.filename)),
    }
    Ok(())
}

/// Writes the stored payload back to disk.
fn handle_save(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let [reference, path] = args else {
        return Err(usage_error("receipt save <id> <path>"));
    };
    let receipt = find_receipt(context, &user.id, reference)?;
    let Some(raw) = receipt.file_data.as_deref() else {
        return Err(CommandError::Message(format!(
            "`{}` is stored at {}; nothing to save locally.",
            receipt.filename,
            receipt.file_url.as_deref().unwrap_or("an external location")
        )));
    };
    let payload = DataUrl::parse(raw)?;
    fs::write(path, &payload.bytes)?;
    io::print_success(format!(
        "Saved `{}` to {} ({}).",
        receipt.filename,
        path,
        format_size(payload.bytes.len())
    ));
    Ok(())
}

fn handle_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let [reference] = args else {
        return Err(usage_error("receipt rm <id>"));
    };
    let receipt = find_receipt(context, &user.id, reference)?;
    if !context.confirm(&format!("Delete receipt `{}`?", receipt.filename))? {
        io::print_info("Operation cancelled.");
        return Ok(());
    }
    AttachmentService::remove(context.db(), &user.id, &receipt.id)?;
    io::print_success(format!("Receipt `{}` deleted.", receipt.filename));
    Ok(())
}

fn find_receipt(
    context: &ShellContext,
    user_id: &EntityId,
    reference: &str,
) -> Result<Attachment, CommandError> {
    let receipts = AttachmentService::list(context.db(), user_id, &FolderScope::All, None)?;
    Ok(resolve_id(&receipts, reference, "Receipt")?.clone())
}

fn folder_name(folders: &[Folder], folder_id: Option<&EntityId>) -> String {
    match folder_id {
        None => "root".into(),
        Some(id) => folders
            .iter()
            .find(|folder| &folder.id == id)
            .map(|folder| folder.name.clone())
            .unwrap_or_else(|| short_id(id)),
    }
}

/// Accepted receipt MIME type for a path, from its extension.
pub(crate) fn mime_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

fn format_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < KIB * KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{:.1} MiB", bytes / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_map_to_accepted_types() {
        assert_eq!(mime_for(Path::new("ticket.PDF")), Some("application/pdf"));
        assert_eq!(mime_for(Path::new("foto.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for(Path::new("notas.txt")), None);
        assert_eq!(mime_for(Path::new("sin_extension")), None);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }
}
