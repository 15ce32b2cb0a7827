//! Turns chat messages such as "me mandó 5 lucas" or "gasté 500 en el super"
//! into transactions.

mod amount;
mod assistant;
pub mod rules;
mod vocabulary;

use once_cell::sync::Lazy;
use regex::Regex;

use cuentas_domain::{LearnedPattern, TransactionKind};

pub use amount::parse_amount;
pub use assistant::{AssistantState, ChatAssistant, ChatReply, PAYMENT_QUESTION, UNRECOGNIZED_REPLY};
pub use rules::{Rule, TransferDirection};
pub use vocabulary::{
    PatternBook, Vocabulary, DEFAULT_EXPENSE_VOCABULARY, DEFAULT_INCOME_VOCABULARY,
    DEFAULT_QUICK_METHODS,
};

const OTHERS: &str = "Otros";
const STOP_WORDS: &[&str] = &["para", "como", "donde", "cuando", "porque"];

static AMOUNT_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+|lucas|mil|pesos|ARS|\$").expect("valid pattern"));

/// A transaction read from a message, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub kind: TransactionKind,
    pub payment_method: Option<String>,
    pub person: Option<String>,
    pub transfer: Option<TransferDirection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Complete(ParsedTransaction),
    /// An expense that still needs to know how it was paid.
    NeedsPaymentMethod(ParsedTransaction),
    Unrecognized,
}

pub fn parse_message(
    message: &str,
    vocabulary: &Vocabulary,
    learned: &[LearnedPattern],
) -> ParseOutcome {
    let transfer = rules::transfer_direction(message);
    let kind = match transfer {
        Some(TransferDirection::Received) => TransactionKind::Income,
        Some(TransferDirection::Sent) => TransactionKind::Expense,
        None if rules::looks_like_income(message) => TransactionKind::Income,
        None => TransactionKind::Expense,
    };
    let Some(amount) = parse_amount(message, learned).filter(|amount| *amount > 0.0) else {
        return ParseOutcome::Unrecognized;
    };

    if let Some(direction) = transfer {
        let person = rules::counterparty(message);
        let description = match (direction, &person) {
            (TransferDirection::Received, Some(name)) => format!("Recibido de {name}"),
            (TransferDirection::Sent, Some(name)) => format!("Enviado a {name}"),
            (TransferDirection::Received, None) => "Transferencia recibida".to_string(),
            (TransferDirection::Sent, None) => "Transferencia enviada".to_string(),
        };
        return ParseOutcome::Complete(ParsedTransaction {
            description,
            amount,
            category: rules::TRANSFER.to_string(),
            kind,
            payment_method: Some(rules::TRANSFER.to_string()),
            person,
            transfer: Some(direction),
        });
    }

    let category = match kind {
        TransactionKind::Income => income_category(message, vocabulary),
        TransactionKind::Expense => expense_category(message, vocabulary),
    };
    let Some(category) = category else {
        return ParseOutcome::Unrecognized;
    };
    let parsed = ParsedTransaction {
        description: generate_description(message, &category, kind),
        amount,
        category,
        kind,
        payment_method: None,
        person: None,
        transfer: None,
    };
    match kind {
        TransactionKind::Expense => ParseOutcome::NeedsPaymentMethod(parsed),
        TransactionKind::Income => ParseOutcome::Complete(ParsedTransaction {
            payment_method: Some(vocabulary.default_payment_method()),
            ..parsed
        }),
    }
}

fn income_category(message: &str, vocabulary: &Vocabulary) -> Option<String> {
    if rules::is_salary(message) {
        return Some(rules::SALARY.to_string());
    }
    let lower = message.to_lowercase();
    vocabulary
        .income_categories
        .iter()
        .find(|category| lower.contains(&category.to_lowercase()))
        .or_else(|| vocabulary.income_categories.first())
        .cloned()
}

fn expense_category(message: &str, vocabulary: &Vocabulary) -> Option<String> {
    if let Some(category) = rules::keyword_category(message) {
        return Some(category.to_string());
    }
    let categories = &vocabulary.expense_categories;
    categories
        .iter()
        .find(|category| category.as_str() == OTHERS)
        .or_else(|| categories.last())
        .cloned()
}

/// Up to three meaningful words from the message, or a generic label when
/// fewer than two remain.
pub fn generate_description(message: &str, category: &str, kind: TransactionKind) -> String {
    let words: Vec<&str> = message
        .split(' ')
        .filter(|word| {
            !AMOUNT_WORD.is_match(word)
                && word.chars().count() > 3
                && !STOP_WORDS.contains(&word.to_lowercase().as_str())
        })
        .collect();
    if words.len() >= 2 {
        return words.into_iter().take(3).collect::<Vec<_>>().join(" ");
    }
    match kind {
        TransactionKind::Income => format!("Ingreso - {category}"),
        TransactionKind::Expense => format!("Gasto en {category}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(message: &str) -> ParseOutcome {
        parse_message(message, &Vocabulary::default(), &PatternBook::defaults())
    }

    #[test]
    fn received_transfer_is_complete_income() {
        let ParseOutcome::Complete(parsed) = parse("me mandó 5 lucas") else {
            panic!("expected a complete transaction");
        };
        assert_eq!(parsed.kind, TransactionKind::Income);
        assert_eq!(parsed.amount, 5_000.0);
        assert_eq!(parsed.category, "Transferencia");
        assert_eq!(parsed.payment_method.as_deref(), Some("Transferencia"));
        assert_eq!(parsed.description, "Transferencia recibida");
    }

    #[test]
    fn sent_transfer_names_the_recipient() {
        let ParseOutcome::Complete(parsed) = parse("le mandé a Sofi 2 lucas") else {
            panic!("expected a complete transaction");
        };
        assert_eq!(parsed.kind, TransactionKind::Expense);
        assert_eq!(parsed.description, "Enviado a Sofi");
        assert_eq!(parsed.person.as_deref(), Some("Sofi"));
    }

    #[test]
    fn salary_income_uses_first_quick_method() {
        let ParseOutcome::Complete(parsed) = parse("cobré el sueldo 1.2 palos") else {
            panic!("expected a complete transaction");
        };
        assert_eq!(parsed.category, "Salario");
        assert_eq!(parsed.amount, 1_200_000.0);
        assert_eq!(parsed.payment_method.as_deref(), Some("Efectivo"));
    }

    #[test]
    fn expenses_ask_for_payment_method() {
        let ParseOutcome::NeedsPaymentMethod(parsed) = parse("gasté 500 en el super") else {
            panic!("expected a follow-up question");
        };
        assert_eq!(parsed.category, "Comida");
        assert_eq!(parsed.amount, 500.0);
        assert_eq!(parsed.description, "gasté super");
    }

    #[test]
    fn unknown_expenses_fall_back_to_otros() {
        let ParseOutcome::NeedsPaymentMethod(parsed) = parse("zapatillas 30000") else {
            panic!("expected a follow-up question");
        };
        assert_eq!(parsed.category, "Otros");
        assert_eq!(parsed.description, "Gasto en Otros");
    }

    #[test]
    fn messages_without_amount_are_unrecognized() {
        assert_eq!(parse("hola, ¿cómo va?"), ParseOutcome::Unrecognized);
        assert_eq!(parse("me mandó plata Juan"), ParseOutcome::Unrecognized);
    }

    #[test]
    fn description_skips_amounts_and_stop_words() {
        let text = generate_description("almuerzo para equipo 3 lucas", "Comida", TransactionKind::Expense);
        assert_eq!(text, "almuerzo equipo");
    }
}
