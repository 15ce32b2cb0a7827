use once_cell::sync::Lazy;
use regex::Regex;

use cuentas_domain::LearnedPattern;

static MILLIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:palo|palos)").expect("valid pattern"));

/// Thousands slang (`luca`, `k`) and plain currency suffixes share one pattern;
/// only the former scale the number.
static SUFFIXED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(lucas?|mil|k|pesos|pe|ARS|\$)").expect("valid pattern")
});

static THOUSANDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:lucas?|k)$").expect("valid pattern"));

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("valid pattern"));

/// Extracts the amount from a chat message.
///
/// Slang is applied in this order: `palos` (millions), `lucas`/`k`
/// (thousands) or a plain currency word, learned multipliers, and finally
/// the first bare number.
pub fn parse_amount(message: &str, learned: &[LearnedPattern]) -> Option<f64> {
    if let Some(value) = capture_number(&MILLIONS, message) {
        return Some(value * 1_000_000.0);
    }
    if let Some(captures) = SUFFIXED.captures(message) {
        let value = captures.get(1)?.as_str().parse::<f64>().ok()?;
        let suffix = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        let scale = if THOUSANDS.is_match(suffix) { 1_000.0 } else { 1.0 };
        return Some(value * scale);
    }
    if let Some(value) = learned_multiplier(message, learned) {
        return Some(value);
    }
    capture_number(&NUMBER, message)
}

fn capture_number(regex: &Regex, message: &str) -> Option<f64> {
    regex
        .captures(message)
        .and_then(|captures| captures.get(1))
        .and_then(|number| number.as_str().parse().ok())
}

/// Applies the first learned phrase with a multiplier that follows a number.
fn learned_multiplier(message: &str, learned: &[LearnedPattern]) -> Option<f64> {
    learned.iter().find_map(|pattern| {
        let multiplier = pattern.multiplier?;
        let source = format!(r"(?i)(\d+(?:\.\d+)?)\s*{}", regex::escape(&pattern.phrase));
        let regex = Regex::new(&source).ok()?;
        capture_number(&regex, message).map(|value| value * multiplier)
    })
}

#[cfg(test)]
mod tests {
    use cuentas_domain::TransactionKind;

    use super::*;

    #[test]
    fn argentine_slang() {
        assert_eq!(parse_amount("me mandó 5 lucas", &[]), Some(5_000.0));
        assert_eq!(parse_amount("cobré 1.5 palos", &[]), Some(1_500_000.0));
        assert_eq!(parse_amount("gasté 20k en nafta", &[]), Some(20_000.0));
        assert_eq!(parse_amount("pagué 300 pesos", &[]), Some(300.0));
        assert_eq!(parse_amount("taxi 1500", &[]), Some(1_500.0));
        assert_eq!(parse_amount("sin monto", &[]), None);
    }

    #[test]
    fn learned_multipliers_follow_the_number() {
        let gamba = LearnedPattern::new("gambas", TransactionKind::Expense).with_multiplier(100.0);
        assert_eq!(parse_amount("me salió 3 gambas", &[gamba]), Some(300.0));
    }
}
