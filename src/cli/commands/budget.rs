use cuentas_core::{BudgetProgress, BudgetService, BudgetStatus};
use cuentas_domain::{Budget, BudgetPeriod};

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::{resolve_id, short_id};
use crate::cli::table::{Table, TableColumn};

use super::{parse_amount_arg, split_action, usage_error};

const USAGE: &str = "budget <set <category> <amount> [monthly|yearly]|list|rm <category>>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "budget",
        "Set spending limits per category and track them",
        USAGE,
        cmd_budget,
    )]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    match action.as_str() {
        "set" => handle_set(context, rest),
        "list" | "ls" => handle_list(context),
        "rm" | "remove" => handle_remove(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown budget subcommand `{other}`"
        ))),
    }
}

/// Creates the category's budget, or updates it when one exists.
fn handle_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let (category, amount, period) = match args {
        [category, amount] => (*category, *amount, BudgetPeriod::Monthly),
        [category, amount, period] => (*category, *amount, parse_period(period)?),
        _ => return Err(usage_error(USAGE)),
    };
    let amount = parse_amount_arg(amount)?;
    let currency = context.currency(&user.id)?;
    let budgets = BudgetService::list(context.db(), &user.id)?;

    let budget = match find_budget(&budgets, category) {
        Some(existing) => BudgetService::update(context.db(), &user.id, &existing.id, amount, period)?,
        None => BudgetService::create(context.db(), &user.id, category, amount, period)?,
    };
    io::print_success(format!(
        "Budget for `{}` set to {} ({}).",
        budget.category,
        context.money(budget.amount, &currency),
        budget.period
    ));
    Ok(())
}

fn handle_list(context: &mut ShellContext) -> CommandResult {
    let user = context.user()?;
    let progress = BudgetService::progress(context.db(), &user.id)?;
    if progress.is_empty() {
        io::print_info("No budgets yet. Use `budget set <category> <amount>`.");
        return Ok(());
    }
    let currency = context.currency(&user.id)?;
    let mut table = Table::new(vec![
        TableColumn::left("ID"),
        TableColumn::left("CATEGORY"),
        TableColumn::left("PERIOD"),
        TableColumn::right("LIMIT"),
        TableColumn::right("SPENT"),
        TableColumn::right("LEFT"),
        TableColumn::right("USED"),
        TableColumn::left("STATUS"),
    ]);
    for entry in &progress {
        table.push(progress_row(context, entry, &currency));
    }
    output::plain(table.render());
    let over: Vec<&str> = progress
        .iter()
        .filter(|entry| entry.status == BudgetStatus::Exceeded)
        .map(|entry| entry.budget.category.as_str())
        .collect();
    if !over.is_empty() {
        io::print_warning(format!("Over budget: {}.", over.join(", ")));
    }
    Ok(())
}

fn progress_row(context: &ShellContext, entry: &BudgetProgress, currency: &str) -> Vec<String> {
    vec![
        short_id(&entry.budget.id),
        entry.budget.category.clone(),
        entry.budget.period.to_string(),
        context.money(entry.budget.amount, currency),
        context.money(entry.spent, currency),
        context.money(entry.remaining, currency),
        format!("{:.0}%", entry.percentage),
        status_label(entry.status).to_string(),
    ]
}

fn handle_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let [reference] = args else {
        return Err(usage_error("budget rm <category>"));
    };
    let budgets = BudgetService::list(context.db(), &user.id)?;
    let budget = match find_budget(&budgets, reference) {
        Some(budget) => budget,
        None => resolve_id(&budgets, reference, "Budget")?,
    };
    BudgetService::remove(context.db(), &user.id, &budget.id)?;
    io::print_success(format!("Budget for `{}` removed.", budget.category));
    Ok(())
}

fn find_budget<'a>(budgets: &'a [Budget], category: &str) -> Option<&'a Budget> {
    let needle = category.trim().to_lowercase();
    budgets
        .iter()
        .find(|budget| budget.category.to_lowercase() == needle)
}

fn parse_period(raw: &str) -> Result<BudgetPeriod, CommandError> {
    match raw.to_lowercase().as_str() {
        "monthly" | "mensual" => Ok(BudgetPeriod::Monthly),
        "yearly" | "anual" => Ok(BudgetPeriod::Yearly),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown budget period `{other}` (monthly or yearly)"
        ))),
    }
}

fn status_label(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::OnTrack => "ok",
        BudgetStatus::Warning => "warning",
        BudgetStatus::Exceeded => "exceeded",
    }
}
