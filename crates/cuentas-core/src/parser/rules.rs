//! Rule table for classifying chat messages written in Rioplatense Spanish.

use once_cell::sync::Lazy;
use regex::Regex;

pub const TRANSFER: &str = "Transferencia";
pub const SALARY: &str = "Salario";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Received,
    Sent,
}

#[derive(Debug)]
pub enum Rule {
    Transfer {
        direction: TransferDirection,
        pattern: Regex,
    },
    Salary {
        pattern: Regex,
    },
    Keyword {
        category: &'static str,
        keywords: &'static [&'static str],
    },
}

impl Rule {
    pub fn matches(&self, message: &str) -> bool {
        match self {
            Rule::Transfer { pattern, .. } | Rule::Salary { pattern } => pattern.is_match(message),
            Rule::Keyword { keywords, .. } => {
                let lower = message.to_lowercase();
                keywords.iter().any(|keyword| lower.contains(keyword))
            }
        }
    }
}

/// Compiles one of the literal patterns below.
fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("built-in pattern compiles")
}

/// Evaluated in order; the first matching rule of each kind wins.
pub static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::Transfer {
            direction: TransferDirection::Received,
            pattern: pattern(r"(?i)me\s+mand[óo]"),
        },
        Rule::Transfer {
            direction: TransferDirection::Sent,
            pattern: pattern(r"(?i)le\s+mand[eéó]"),
        },
        Rule::Transfer {
            direction: TransferDirection::Sent,
            pattern: pattern(r"(?i)mand[eéó]\s+a"),
        },
        Rule::Salary {
            pattern: pattern(
                r"(?i)salario|sueldo|pag[oóa] de|cobr[eéó] de|honorarios|fb|facebook|empresa|trabaj[oé]",
            ),
        },
        Rule::Keyword {
            category: "Comida",
            keywords: &[
                "super", "mercado", "supermercado", "almacén", "almacen", "comida", "restaurant",
                "restaurante", "cena", "almuerzo", "desayuno", "cafetería", "café", "kiosco",
                "verdulería", "carnicería", "panadería", "comestibles", "groceries", "compras",
                "dia", "coto", "chino", "carrefour", "walmart",
            ],
        },
        Rule::Keyword {
            category: "Transporte",
            keywords: &[
                "taxi", "uber", "cabify", "didi", "remis", "colectivo", "subte", "tren", "bondi",
                "combustible", "nafta", "gasolina", "sube", "transporte",
            ],
        },
        Rule::Keyword {
            category: "Servicios",
            keywords: &[
                "luz", "agua", "gas", "internet", "wifi", "teléfono", "celular", "alquiler",
                "expensas", "servicio", "factura", "boleta",
            ],
        },
        Rule::Keyword {
            category: "Entretenimiento",
            keywords: &[
                "cine", "teatro", "concierto", "show", "streaming", "netflix", "amazon", "spotify",
                "disney", "juego", "salida", "bar", "disco", "boliche", "fiesta",
            ],
        },
        Rule::Keyword {
            category: "Salud",
            keywords: &[
                "médico", "medico", "farmacia", "remedio", "medicamento", "consulta",
                "obra social", "prepaga", "hospital", "clínica", "dentista", "psicólogo",
            ],
        },
    ]
});

static INCOME_HINT: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"(?i)ingres[oéó]|cobr[eéó]|recib[íi]|me pag[oó]|me deposit[oó]|salario|sueldo|me transfiri[oó]|me envi[oó]",
    )
});

static COUNTERPARTY: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        pattern(r"(?i)(\w+)\s+me\s+mand[óo]"),
        pattern(r"(?i)le\s+mand[eéó]\s+(?:a\s+)?(\w+)"),
        pattern(r"(?i)mand[eéó]\s+(?:a\s+)?(\w+)"),
    ]
});

/// Methods recognised in answers to the payment-method question.
pub const PAYMENT_KEYWORDS: &[(&str, &[&str])] = &[
    ("Efectivo", &["efectivo", "cash", "plata", "billete"]),
    (
        "Tarjeta de crédito",
        &["credito", "crédito", "visa", "mastercard", "amex", "american"],
    ),
    ("Tarjeta de débito", &["debito", "débito", "banco", "caja"]),
    (
        TRANSFER,
        &["transferencia", "mp", "mercado pago", "homebanking", "brubank", "uala", "cuenta"],
    ),
];

pub fn transfer_direction(message: &str) -> Option<TransferDirection> {
    RULES.iter().find_map(|rule| match rule {
        Rule::Transfer { direction, .. } if rule.matches(message) => Some(*direction),
        _ => None,
    })
}

pub fn is_salary(message: &str) -> bool {
    RULES
        .iter()
        .any(|rule| matches!(rule, Rule::Salary { .. }) && rule.matches(message))
}

pub fn keyword_category(message: &str) -> Option<&'static str> {
    RULES.iter().find_map(|rule| match rule {
        Rule::Keyword { category, .. } if rule.matches(message) => Some(*category),
        _ => None,
    })
}

pub fn looks_like_income(message: &str) -> bool {
    INCOME_HINT.is_match(message)
}

/// The other party of a transfer. Captures that are just a number (as in
/// "me mandó 5 lucas") are not names.
pub fn counterparty(message: &str) -> Option<String> {
    COUNTERPARTY.iter().find_map(|regex| {
        regex
            .captures(message)
            .and_then(|captures| captures.get(1))
            .map(|name| name.as_str())
            .filter(|name| !name.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
    })
}

/// Maps a free-form answer to a known payment method.
pub fn payment_method_for(answer: &str) -> Option<&'static str> {
    let lower = answer.to_lowercase();
    PAYMENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(method, _)| *method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_transfer_direction() {
        assert_eq!(transfer_direction("Juan me mandó 5 lucas"), Some(TransferDirection::Received));
        assert_eq!(transfer_direction("le mandé 2000 a Sofi"), Some(TransferDirection::Sent));
        assert_eq!(transfer_direction("mande a Pedro 300"), Some(TransferDirection::Sent));
        assert_eq!(transfer_direction("gasté 500 en el super"), None);
    }

    #[test]
    fn extracts_counterparty_names_only() {
        assert_eq!(counterparty("Juan me mandó 5 lucas").as_deref(), Some("Juan"));
        assert_eq!(counterparty("le mandé a Sofi 2000").as_deref(), Some("Sofi"));
        assert_eq!(counterparty("me mandó 5 lucas"), None);
    }

    #[test]
    fn keyword_tables_are_ordered() {
        assert_eq!(keyword_category("Uber al centro"), Some("Transporte"));
        assert_eq!(keyword_category("Netflix"), Some("Entretenimiento"));
        assert_eq!(keyword_category("compras en el super"), Some("Comida"));
        assert_eq!(keyword_category("zapatillas"), None);
    }

    #[test]
    fn payment_answers() {
        assert_eq!(payment_method_for("con la VISA"), Some("Tarjeta de crédito"));
        assert_eq!(payment_method_for("en efectivo"), Some("Efectivo"));
        assert_eq!(payment_method_for("por mp"), Some(TRANSFER));
        assert_eq!(payment_method_for("vales"), None);
    }
}
