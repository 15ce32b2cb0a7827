//! The dashboard and the chat assistant.

use cuentas_core::{
    parser::{AssistantState, ChatReply, PatternBook},
    BudgetService, BudgetStatus, SummaryService, Timeframe,
};
use cuentas_domain::{LearnedPattern, TransactionKind};

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::short_id;
use crate::cli::table::{Table, TableColumn};

use super::{transaction::render_transactions, usage_error};

const BAR_WIDTH: usize = 20;
const CHAT_USAGE: &str = "chat <message>|chat learn <phrase> <multiplier> [income|expense]|chat reset";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "dashboard",
            "Income, expenses, and balance for this month or year",
            "dashboard [month|year]",
            cmd_dashboard,
        ),
        CommandEntry::new(
            "chat",
            "Record a transaction in plain Spanish (\"gasté 500 en el super\")",
            CHAT_USAGE,
            cmd_chat,
        ),
    ]
}

fn cmd_dashboard(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let user = context.user()?;
    let timeframe = match args.first().map(|arg| arg.to_lowercase()) {
        None => Timeframe::Month,
        Some(arg) if matches!(arg.as_str(), "month" | "mes") => Timeframe::Month,
        Some(arg) if matches!(arg.as_str(), "year" | "año" | "anio") => Timeframe::Year,
        Some(_) => return Err(usage_error("dashboard [month|year]")),
    };
    let today = context.db().today();
    let dashboard = SummaryService::dashboard(context.db(), &user.id, timeframe, today)?;
    let currency = context.currency(&user.id)?;
    let money = |amount: f64| context.money(amount, &currency);

    let title = match timeframe {
        Timeframe::Month => format!("Dashboard {}", today.format("%m/%Y")),
        Timeframe::Year => format!("Dashboard {}", today.format("%Y")),
    };
    output::section(title);
    io::print_info(format!("  Income   : {}", money(dashboard.totals.income)));
    io::print_info(format!("  Expenses : {}", money(dashboard.totals.expenses)));
    io::print_info(format!("  Balance  : {}", money(dashboard.totals.balance())));

    if !dashboard.expenses_by_category.is_empty() {
        output::section("Expenses by category");
        let mut table = Table::new(vec![
            TableColumn::left("CATEGORY"),
            TableColumn::right("AMOUNT"),
            TableColumn::right("SHARE"),
            TableColumn::left(""),
        ]);
        for (category, amount) in &dashboard.expenses_by_category {
            let share = share_of(*amount, dashboard.totals.expenses);
            table.push(vec![
                category.clone(),
                money(*amount),
                format!("{share:.0}%"),
                bar(share),
            ]);
        }
        output::plain(table.render());
    }

    let active: Vec<_> = dashboard
        .buckets
        .iter()
        .filter(|bucket| bucket.totals.income > 0.0 || bucket.totals.expenses > 0.0)
        .collect();
    if !active.is_empty() {
        output::section(match timeframe {
            Timeframe::Month => "By day",
            Timeframe::Year => "By month",
        });
        let mut table = Table::new(vec![
            TableColumn::left("PERIOD"),
            TableColumn::right("INCOME"),
            TableColumn::right("EXPENSES"),
        ]);
        for bucket in active {
            table.push(vec![
                bucket.label.clone(),
                money(bucket.totals.income),
                money(bucket.totals.expenses),
            ]);
        }
        output::plain(table.render());
    }

    let assigned = dashboard
        .expenses_by_person
        .iter()
        .any(|(_, amount)| *amount > 0.0);
    if dashboard.expenses_by_person.len() > 1 && assigned {
        output::section("Expenses by person");
        for (person, amount) in &dashboard.expenses_by_person {
            io::print_info(format!("  {person:<16} {}", money(*amount)));
        }
    }

    if !dashboard.recent.is_empty() {
        output::section("Recent");
        output::plain(render_transactions(context, &dashboard.recent, &currency));
    }

    for entry in BudgetService::progress(context.db(), &user.id)? {
        match entry.status {
            BudgetStatus::Exceeded => io::print_warning(format!(
                "Budget `{}` exceeded: {:.0}% used.",
                entry.budget.category, entry.percentage
            )),
            BudgetStatus::Warning => io::print_warning(format!(
                "Budget `{}` at {:.0}%.",
                entry.budget.category, entry.percentage
            )),
            BudgetStatus::OnTrack => {}
        }
    }
    Ok(())
}

fn cmd_chat(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => Err(usage_error(CHAT_USAGE)),
        ["reset"] => {
            context.assistant.reset();
            io::print_info("Pending question discarded.");
            Ok(())
        }
        ["learn", rest @ ..] => handle_learn(context, rest),
        words => {
            let user = context.user()?;
            let message = words.join(" ");
            let db = context.session.database();
            let reply = context.assistant.handle(db, &user.id, &message)?;
            match &reply {
                ChatReply::Recorded { transaction, .. } => {
                    io::print_success(reply.message());
                    io::print_info(format!("Saved as {}.", short_id(&transaction.id)));
                }
                ChatReply::NeedsPaymentMethod { .. } => {
                    io::print_info(reply.message());
                    io::print_hint("Answer with `chat <method>`, e.g. `chat efectivo`.");
                }
                ChatReply::Unrecognized { .. } => io::print_warning(reply.message()),
            }
            Ok(())
        }
    }
}

/// Teaches the parser a slang multiplier, e.g. `chat learn palos 1000000`.
fn handle_learn(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "chat learn <phrase> <multiplier> [income|expense]";
    let (phrase, multiplier, kind) = match args {
        [phrase, multiplier] => (*phrase, *multiplier, TransactionKind::Expense),
        [phrase, multiplier, kind] => (
            *phrase,
            *multiplier,
            TransactionKind::parse(kind).ok_or_else(|| usage_error(usage))?,
        ),
        _ => return Err(usage_error(usage)),
    };
    let multiplier: f64 = multiplier
        .parse()
        .ok()
        .filter(|value: &f64| value.is_finite() && *value > 0.0)
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("`{multiplier}` is not a positive number"))
        })?;
    if matches!(context.assistant.state(), AssistantState::AwaitingPaymentMethod(_)) {
        io::print_warning("A chat question is still pending; `chat reset` discards it.");
    }
    let pattern = PatternBook::learn(
        context.db(),
        LearnedPattern::new(phrase, kind).with_multiplier(multiplier),
    )?;
    io::print_success(format!(
        "Learned `{}` as ×{} (seen {} time(s)).",
        pattern.phrase, multiplier, pattern.count
    ));
    Ok(())
}

fn share_of(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        amount / total * 100.0
    } else {
        0.0
    }
}

fn bar(share: f64) -> String {
    let filled = ((share / 100.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_scale_with_share() {
        assert_eq!(bar(0.0), "");
        assert_eq!(bar(50.0).chars().count(), BAR_WIDTH / 2);
        assert_eq!(bar(250.0).chars().count(), BAR_WIDTH);
        assert_eq!(share_of(25.0, 0.0), 0.0);
    }
}
