use chrono::NaiveDate;

use cuentas_core::{
    AttachmentService, CategoryService, DateRange, FolderScope, NewTransaction,
    TransactionFilter, TransactionService,
};
use cuentas_domain::{parse_iso_date, Transaction, TransactionKind};

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::{resolve_id, short_id};
use crate::cli::table::{Table, TableColumn};

use super::{flag_value, parse_amount_arg, positional, split_action, usage_error};

const USAGE: &str = "tx <add|list|edit|rm|receipt> ...";
const ADD_USAGE: &str =
    "tx add <description> <amount> <category> <income|expense> [method] [--date YYYY-MM-DD] [--person name]";
const LIST_USAGE: &str =
    "tx list [--kind income|expense] [--category name] [--search text] [--range today|week|month|FROM..TO]";
const EDIT_USAGE: &str =
    "tx edit <id> <description|amount|category|kind|method|person|date> <value>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "tx",
        "Record, list, edit, and remove transactions",
        USAGE,
        cmd_tx,
    )]
}

fn cmd_tx(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    match action.as_str() {
        "add" => handle_add(context, rest),
        "list" | "ls" => handle_list(context, rest),
        "edit" => handle_edit(context, rest),
        "rm" | "remove" => handle_remove(context, rest),
        "receipt" => handle_receipt(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown tx subcommand `{other}`"
        ))),
    }
}

fn handle_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let fields = positional(args);
    let [description, amount, category, kind, rest @ ..] = fields else {
        return Err(usage_error(ADD_USAGE));
    };
    let amount = parse_amount_arg(amount)?;
    let kind = parse_kind(kind)?;
    let date = match flag_value(args, "--date") {
        Some(raw) => parse_date(raw)?,
        None => context.db().today(),
    };

    let mut draft = NewTransaction::new(*description, amount, date, *category, kind);
    if let Some(method) = rest.first() {
        draft = draft.payment_method(*method);
    }
    if let Some(person) = flag_value(args, "--person") {
        draft = draft.person(person);
    }
    if CategoryService::find_by_name(context.db(), &user.id, category)?.is_none() {
        io::print_warning(format!("Category `{category}` is not in your list."));
    }

    let txn = TransactionService::create(context.db(), &user.id, draft)?;
    let currency = context.currency(&user.id)?;
    io::print_success(format!(
        "Recorded {} {} `{}` ({}).",
        kind_label(txn.kind),
        context.money(txn.amount, &currency),
        txn.description,
        short_id(&txn.id)
    ));
    Ok(())
}

fn handle_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    if !positional(args).is_empty() {
        return Err(usage_error(LIST_USAGE));
    }
    let filter = TransactionFilter {
        kind: flag_value(args, "--kind").map(parse_kind).transpose()?,
        category: flag_value(args, "--category").map(str::to_string),
        search: flag_value(args, "--search").map(str::to_string),
        range: flag_value(args, "--range").map(parse_range).transpose()?,
    };
    let items = TransactionService::filter(context.db(), &user.id, &filter)?;
    if items.is_empty() {
        io::print_info("No transactions found.");
        return Ok(());
    }
    let currency = context.currency(&user.id)?;
    output::plain(render_transactions(context, &items, &currency));
    let (income, expenses) = items.iter().fold((0.0, 0.0), |(inc, exp), txn| match txn.kind {
        TransactionKind::Income => (inc + txn.amount, exp),
        TransactionKind::Expense => (inc, exp + txn.amount),
    });
    io::print_info(format!(
        "{} transaction(s); income {}, expenses {}.",
        items.len(),
        context.money(income, &currency),
        context.money(expenses, &currency)
    ));
    Ok(())
}

pub(crate) fn render_transactions(
    context: &ShellContext,
    items: &[Transaction],
    currency: &str,
) -> String {
    let mut table = Table::new(vec![
        TableColumn::left("ID"),
        TableColumn::left("DATE"),
        TableColumn::left("DESCRIPTION").capped(32),
        TableColumn::left("CATEGORY"),
        TableColumn::left("METHOD"),
        TableColumn::right("AMOUNT"),
    ]);
    for txn in items {
        let mut method = txn.payment_method.clone().unwrap_or_default();
        if txn.receipt_id.is_some() {
            method.push_str(" 📎");
        }
        table.push(vec![
            short_id(&txn.id),
            context.date(txn.date),
            txn.description.clone(),
            txn.category.clone(),
            method.trim().to_string(),
            context.money(txn.signed_amount(), currency),
        ]);
    }
    table.render()
}

fn handle_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let [reference, field, value @ ..] = args else {
        return Err(usage_error(EDIT_USAGE));
    };
    if value.is_empty() {
        return Err(usage_error(EDIT_USAGE));
    }
    let value = value.join(" ");
    let items = TransactionService::list(context.db(), &user.id)?;
    let id = resolve_id(&items, reference, "Transaction")?.id.clone();

    let field = field.to_lowercase();
    let edit: Box<dyn FnMut(&mut Transaction)> = match field.as_str() {
        "description" => Box::new(move |txn: &mut Transaction| txn.description = value.clone()),
        "amount" => {
            let amount = parse_amount_arg(&value)?;
            Box::new(move |txn: &mut Transaction| txn.amount = amount)
        }
        "category" => Box::new(move |txn: &mut Transaction| txn.category = value.clone()),
        "kind" => {
            let kind = parse_kind(&value)?;
            Box::new(move |txn: &mut Transaction| txn.kind = kind)
        }
        "method" => Box::new(move |txn: &mut Transaction| txn.payment_method = optional(value.clone())),
        "person" => Box::new(move |txn: &mut Transaction| txn.person = optional(value.clone())),
        "date" => {
            let date = parse_date(&value)?;
            Box::new(move |txn: &mut Transaction| txn.date = date)
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown transaction field `{other}`"
            )))
        }
    };
    let txn = TransactionService::update(context.db(), &user.id, &id, edit)?;
    io::print_success(format!("Transaction {} updated.", short_id(&txn.id)));
    Ok(())
}

fn handle_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let reference = args.first().ok_or_else(|| usage_error("tx rm <id>"))?;
    let items = TransactionService::list(context.db(), &user.id)?;
    let txn = resolve_id(&items, reference, "Transaction")?;
    if !context.confirm(&format!("Delete `{}`?", txn.description))? {
        io::print_info("Operation cancelled.");
        return Ok(());
    }
    if TransactionService::remove(context.db(), &user.id, &txn.id)? {
        io::print_success(format!("Transaction {} removed.", short_id(&txn.id)));
    } else {
        io::print_warning("Nothing to remove.");
    }
    Ok(())
}

fn handle_receipt(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let [reference, receipt] = args else {
        return Err(usage_error("tx receipt <id> <receipt-id|none>"));
    };
    let items = TransactionService::list(context.db(), &user.id)?;
    let txn_id = resolve_id(&items, reference, "Transaction")?.id.clone();
    let receipt_id = if receipt.eq_ignore_ascii_case("none") {
        None
    } else {
        let receipts = AttachmentService::list(context.db(), &user.id, &FolderScope::All, None)?;
        Some(resolve_id(&receipts, receipt, "Receipt")?.id.clone())
    };
    let txn =
        TransactionService::attach_receipt(context.db(), &user.id, &txn_id, receipt_id.as_ref())?;
    match txn.receipt_id {
        Some(receipt) => io::print_success(format!(
            "Receipt {} linked to {}.",
            short_id(&receipt),
            short_id(&txn.id)
        )),
        None => io::print_success(format!("Receipt unlinked from {}.", short_id(&txn.id))),
    }
    Ok(())
}

fn parse_kind(raw: &str) -> Result<TransactionKind, CommandError> {
    TransactionKind::parse(raw).ok_or_else(|| {
        CommandError::InvalidArguments(format!("`{raw}` is not income or expense"))
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    parse_iso_date(raw).ok_or_else(|| {
        CommandError::InvalidArguments(format!("invalid date `{raw}` (use YYYY-MM-DD)"))
    })
}

fn parse_range(raw: &str) -> Result<DateRange, CommandError> {
    match raw.to_lowercase().as_str() {
        "today" | "hoy" => Ok(DateRange::Today),
        "week" | "semana" => Ok(DateRange::ThisWeek),
        "month" | "mes" => Ok(DateRange::ThisMonth),
        custom => {
            let (start, end) = custom.split_once("..").unwrap_or((custom, ""));
            Ok(DateRange::Custom {
                start: parse_date(start)?,
                end: match end.trim() {
                    "" => None,
                    end => Some(parse_date(end)?),
                },
            })
        }
    }
}

fn optional(value: String) -> Option<String> {
    match value.trim() {
        "" | "none" | "-" => None,
        _ => Some(value),
    }
}

fn kind_label(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Income => "income",
        TransactionKind::Expense => "expense",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_parse_keywords_and_bounds() {
        assert_eq!(parse_range("week").unwrap(), DateRange::ThisWeek);
        let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
        assert_eq!(
            parse_range("2024-07-01..2024-07-31").unwrap(),
            DateRange::Custom {
                start,
                end: Some(end)
            }
        );
        assert_eq!(
            parse_range("2024-07-01").unwrap(),
            DateRange::Custom { start, end: None }
        );
        assert!(parse_range("ayer").is_err());
    }

    #[test]
    fn blank_optionals_clear_the_field() {
        assert_eq!(optional("none".into()), None);
        assert_eq!(optional("Efectivo".into()).as_deref(), Some("Efectivo"));
    }
}
