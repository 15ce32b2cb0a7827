use chrono::NaiveDate;

/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: f64, currency: &str) -> String;
}

/// Formats dates for presentation.
pub trait DateFormatter: Send + Sync {
    fn format_date(&self, date: NaiveDate) -> String;
}

/// Argentine conventions: `$ 1.234,56` and `17/05/2024`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EsArFormat;

impl CurrencyFormatter for EsArFormat {
    fn format_amount(&self, amount: f64, currency: &str) -> String {
        let symbol = match currency {
            "ARS" | "" => "$",
            "USD" => "US$",
            "EUR" => "€",
            other => other,
        };
        let sign = if amount < 0.0 { "-" } else { "" };
        format!("{sign}{symbol} {}", group_number(amount.abs(), 2))
    }
}

impl DateFormatter for EsArFormat {
    fn format_date(&self, date: NaiveDate) -> String {
        date.format("%d/%m/%Y").to_string()
    }
}

/// Formats like a locale-aware `toLocaleString`: thousands separated by
/// dots, up to three decimals after a comma, trailing zeros dropped.
pub fn format_plain(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = group_number(amount.abs(), 3);
    let trimmed = match fixed.split_once(',') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole},{fraction}")
            }
        }
        None => fixed,
    };
    format!("{sign}{trimmed}")
}

fn group_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    match fraction {
        Some(fraction) => format!("{grouped},{fraction}"),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_pesos() {
        let fmt = EsArFormat;
        assert_eq!(fmt.format_amount(1234.56, "ARS"), "$ 1.234,56");
        assert_eq!(fmt.format_amount(-5.0, "ARS"), "-$ 5,00");
        assert_eq!(fmt.format_amount(1_000_000.0, "USD"), "US$ 1.000.000,00");
    }

    #[test]
    fn plain_numbers_drop_trailing_zeros() {
        assert_eq!(format_plain(5000.0), "5.000");
        assert_eq!(format_plain(1500.5), "1.500,5");
        assert_eq!(format_plain(999.0), "999");
    }

    #[test]
    fn dates_use_day_first() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(EsArFormat.format_date(date), "17/05/2024");
    }
}
