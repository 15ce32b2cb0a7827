use tracing::{debug, info};

use cuentas_domain::{EntityId, Transaction, TransactionKind};

use crate::{
    database::Database,
    format::format_plain,
    transaction_service::{NewTransaction, TransactionService},
    CoreError,
};

use super::{
    parse_message,
    rules::{self, TransferDirection},
    ParseOutcome, ParsedTransaction, PatternBook, Vocabulary,
};

pub const PAYMENT_QUESTION: &str = "¿De qué manera abonaste?";
pub const UNRECOGNIZED_REPLY: &str =
    "No pude identificar una transacción válida. Por favor, indica el monto y proporciona más detalles.";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AssistantState {
    #[default]
    Idle,
    AwaitingPaymentMethod(ParsedTransaction),
}

#[derive(Debug, Clone)]
pub enum ChatReply {
    Recorded {
        transaction: Transaction,
        message: String,
    },
    NeedsPaymentMethod {
        message: String,
    },
    Unrecognized {
        message: String,
    },
}

impl ChatReply {
    pub fn message(&self) -> &str {
        match self {
            ChatReply::Recorded { message, .. }
            | ChatReply::NeedsPaymentMethod { message }
            | ChatReply::Unrecognized { message } => message,
        }
    }
}

/// Conversational front end to the parser. Holds at most one expense
/// waiting for its payment method.
#[derive(Debug, Default)]
pub struct ChatAssistant {
    state: AssistantState,
}

impl ChatAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AssistantState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = AssistantState::Idle;
    }

    pub fn handle(
        &mut self,
        db: &Database,
        user_id: &EntityId,
        message: &str,
    ) -> Result<ChatReply, CoreError> {
        if let AssistantState::AwaitingPaymentMethod(pending) = &self.state {
            let method = rules::payment_method_for(message)
                .map(str::to_string)
                .unwrap_or_else(|| message.trim().to_string());
            debug!(%method, "payment method answered");
            let answered = ParsedTransaction {
                payment_method: Some(method),
                ..pending.clone()
            };
            // A failed write keeps the expense pending so the answer can be retried.
            let reply = Self::record(db, user_id, &answered)?;
            self.state = AssistantState::Idle;
            return Ok(reply);
        }

        let vocabulary = Vocabulary::load(db)?;
        let learned = PatternBook::load(db)?;
        match parse_message(message, &vocabulary, &learned) {
            ParseOutcome::Complete(parsed) => Self::record(db, user_id, &parsed),
            ParseOutcome::NeedsPaymentMethod(parsed) => {
                self.state = AssistantState::AwaitingPaymentMethod(parsed);
                Ok(ChatReply::NeedsPaymentMethod {
                    message: PAYMENT_QUESTION.to_string(),
                })
            }
            ParseOutcome::Unrecognized => Ok(ChatReply::Unrecognized {
                message: UNRECOGNIZED_REPLY.to_string(),
            }),
        }
    }

    fn record(
        db: &Database,
        user_id: &EntityId,
        parsed: &ParsedTransaction,
    ) -> Result<ChatReply, CoreError> {
        let mut draft = NewTransaction::new(
            parsed.description.clone(),
            parsed.amount,
            db.today(),
            parsed.category.clone(),
            parsed.kind,
        );
        draft.payment_method = parsed.payment_method.clone();
        draft.person = parsed.person.clone();
        let transaction = TransactionService::create(db, user_id, draft)?;
        info!(id = %transaction.id, "chat transaction recorded");
        Ok(ChatReply::Recorded {
            message: confirmation(parsed),
            transaction,
        })
    }
}

fn confirmation(parsed: &ParsedTransaction) -> String {
    let what = match parsed.kind {
        TransactionKind::Income => "un ingreso",
        TransactionKind::Expense => "un gasto",
    };
    let amount = format_plain(parsed.amount);
    if let Some(direction) = parsed.transfer {
        let party = match (direction, &parsed.person) {
            (TransferDirection::Received, Some(name)) => format!(" desde {name}"),
            (TransferDirection::Sent, Some(name)) => format!(" hacia {name}"),
            (_, None) => String::new(),
        };
        return format!("He registrado {what} de ${amount} por transferencia{party}.");
    }
    let method = match (parsed.kind, &parsed.payment_method) {
        (TransactionKind::Expense, Some(method)) => format!(" usando {method}"),
        _ => String::new(),
    };
    format!(
        "He registrado {what} de ${amount} en la categoría \"{}\"{method}.",
        parsed.category
    )
}
