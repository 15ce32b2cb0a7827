//! Categories, payment methods, and people.

use cuentas_core::{CategoryService, PaymentMethodService, PersonService};
use cuentas_domain::TransactionKind;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::{resolve_named, short_id};
use crate::cli::table::{Table, TableColumn};

use super::{split_action, usage_error};

const CATEGORY_USAGE: &str =
    "category <add <name> <income|expense>|list [income|expense]|rename <name> <new>|rm <name>>";
const METHOD_USAGE: &str = "method <add <name>|list|rename <name> <new>|rm <name>>";
const PERSON_USAGE: &str = "person <add <name>|list|rename <name> <new>|rm <name>>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "category",
            "Manage income and expense categories",
            CATEGORY_USAGE,
            cmd_category,
        ),
        CommandEntry::new("method", "Manage payment methods", METHOD_USAGE, cmd_method),
        CommandEntry::new(
            "person",
            "Manage people transactions can be assigned to",
            PERSON_USAGE,
            cmd_person,
        ),
    ]
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let db = context.db();
    let (action, rest) = split_action(args, CATEGORY_USAGE)?;
    match (action.as_str(), rest) {
        ("add", [name @ .., kind]) if !name.is_empty() => {
            let kind = TransactionKind::parse(kind).ok_or_else(|| {
                CommandError::InvalidArguments(format!("`{kind}` is not income or expense"))
            })?;
            let category = CategoryService::create(db, &user.id, &name.join(" "), kind)?;
            io::print_success(format!(
                "Category `{}` added ({}).",
                category.name,
                kind.as_str()
            ));
        }
        ("list" | "ls", filter) => {
            let kind = match filter.first() {
                Some(raw) => Some(TransactionKind::parse(raw).ok_or_else(|| {
                    CommandError::InvalidArguments(format!("`{raw}` is not income or expense"))
                })?),
                None => None,
            };
            let categories = CategoryService::list(db, &user.id, kind)?;
            if categories.is_empty() {
                io::print_info("No categories found.");
                return Ok(());
            }
            let mut table = Table::new(vec![
                TableColumn::left("ID"),
                TableColumn::left("NAME"),
                TableColumn::left("KIND"),
            ]);
            for category in &categories {
                table.push(vec![
                    short_id(&category.id),
                    category.name.clone(),
                    category.kind.as_str().to_string(),
                ]);
            }
            output::plain(table.render());
        }
        ("rename", [reference, new_name @ ..]) if !new_name.is_empty() => {
            let categories = CategoryService::list(db, &user.id, None)?;
            let id = resolve_named(&categories, reference, "Category")?.id.clone();
            let category = CategoryService::rename(db, &user.id, &id, &new_name.join(" "))?;
            io::print_success(format!("Category renamed to `{}`.", category.name));
        }
        ("rm" | "remove", [reference]) => {
            let categories = CategoryService::list(db, &user.id, None)?;
            let category = resolve_named(&categories, reference, "Category")?;
            if !context.confirm(&format!("Remove category `{}`?", category.name))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            CategoryService::remove(db, &user.id, &category.id)?;
            io::print_success(format!("Category `{}` removed.", category.name));
        }
        _ => return Err(usage_error(CATEGORY_USAGE)),
    }
    Ok(())
}

fn cmd_method(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let db = context.db();
    let (action, rest) = split_action(args, METHOD_USAGE)?;
    match (action.as_str(), rest) {
        ("add", name) if !name.is_empty() => {
            let method = PaymentMethodService::create(db, &user.id, &name.join(" "))?;
            io::print_success(format!("Payment method `{}` added.", method.name));
        }
        ("list" | "ls", []) => {
            let names: Vec<String> = PaymentMethodService::list(db, &user.id)?
                .into_iter()
                .map(|method| method.name)
                .collect();
            print_names(&names, "No payment methods found.");
        }
        ("rename", [reference, new_name @ ..]) if !new_name.is_empty() => {
            let methods = PaymentMethodService::list(db, &user.id)?;
            let id = resolve_named(&methods, reference, "Payment method")?.id.clone();
            let method = PaymentMethodService::rename(db, &user.id, &id, &new_name.join(" "))?;
            io::print_success(format!("Payment method renamed to `{}`.", method.name));
        }
        ("rm" | "remove", name) if !name.is_empty() => {
            let methods = PaymentMethodService::list(db, &user.id)?;
            let method = resolve_named(&methods, &name.join(" "), "Payment method")?;
            PaymentMethodService::remove(db, &user.id, &method.id)?;
            io::print_success(format!("Payment method `{}` removed.", method.name));
        }
        _ => return Err(usage_error(METHOD_USAGE)),
    }
    Ok(())
}

fn cmd_person(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let db = context.db();
    let (action, rest) = split_action(args, PERSON_USAGE)?;
    match (action.as_str(), rest) {
        ("add", name) if !name.is_empty() => {
            let person = PersonService::create(db, &user.id, &name.join(" "))?;
            io::print_success(format!("Person `{}` added.", person.name));
        }
        ("list" | "ls", []) => {
            let names: Vec<String> = PersonService::list(db, &user.id)?
                .into_iter()
                .map(|person| person.name)
                .collect();
            print_names(&names, "No people found.");
        }
        ("rename", [reference, new_name @ ..]) if !new_name.is_empty() => {
            let people = PersonService::list(db, &user.id)?;
            let id = resolve_named(&people, reference, "Person")?.id.clone();
            let person = PersonService::rename(db, &user.id, &id, &new_name.join(" "))?;
            io::print_success(format!("Person renamed to `{}`.", person.name));
        }
        ("rm" | "remove", name) if !name.is_empty() => {
            let people = PersonService::list(db, &user.id)?;
            let person = resolve_named(&people, &name.join(" "), "Person")?;
            PersonService::remove(db, &user.id, &person.id)?;
            io::print_success(format!("Person `{}` removed.", person.name));
        }
        _ => return Err(usage_error(PERSON_USAGE)),
    }
    Ok(())
}

fn print_names(names: &[String], empty: &str) {
    if names.is_empty() {
        io::print_info(empty);
        return;
    }
    for name in names {
        io::print_info(format!("  {name}"));
    }
}
