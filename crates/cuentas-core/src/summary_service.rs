//! Dashboard figures for the current month or year.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use cuentas_domain::{EntityId, Transaction, TransactionKind};

use crate::{
    database::Database,
    settings_service::SettingsService,
    transaction_service::{sort_newest_first, TransactionService},
    CoreError,
};

pub const UNASSIGNED: &str = "Sin asignar";
pub const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];
const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Month,
    Year,
}

impl Timeframe {
    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Timeframe::Month => date.year() == today.year() && date.month() == today.month(),
            Timeframe::Year => date.year() == today.year(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expenses: f64,
}

impl Totals {
    pub fn balance(&self) -> f64 {
        self.income - self.expenses
    }

    fn add(&mut self, txn: &Transaction) {
        match txn.kind {
            TransactionKind::Income => self.income += txn.amount,
            TransactionKind::Expense => self.expenses += txn.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub label: String,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub timeframe: Timeframe,
    pub totals: Totals,
    /// Largest first.
    pub expenses_by_category: Vec<(String, f64)>,
    /// Days `"1"..` of the month, or `Ene..Dic` for a year.
    pub buckets: Vec<Bucket>,
    pub recent: Vec<Transaction>,
    /// Configured people in order, then [`UNASSIGNED`].
    pub expenses_by_person: Vec<(String, f64)>,
}

pub struct SummaryService;

impl SummaryService {
    pub fn dashboard(
        db: &Database,
        user_id: &EntityId,
        timeframe: Timeframe,
        today: NaiveDate,
    ) -> Result<Dashboard, CoreError> {
        let people = SettingsService::load(db, user_id)?.people;
        let transactions = TransactionService::list(db, user_id)?;
        Ok(Self::summarize(&transactions, &people, timeframe, today))
    }

    pub fn summarize(
        transactions: &[Transaction],
        people: &[String],
        timeframe: Timeframe,
        today: NaiveDate,
    ) -> Dashboard {
        let mut in_frame: Vec<Transaction> = transactions
            .iter()
            .filter(|txn| timeframe.contains(txn.date, today))
            .cloned()
            .collect();
        sort_newest_first(&mut in_frame);

        let mut buckets = empty_buckets(timeframe, today);
        let mut totals = Totals::default();
        let mut by_category: HashMap<String, f64> = HashMap::new();
        let mut by_person: Vec<(String, f64)> =
            people.iter().map(|person| (person.clone(), 0.0)).collect();
        let mut unassigned = 0.0;

        for txn in &in_frame {
            totals.add(txn);
            let slot = match timeframe {
                Timeframe::Month => txn.date.day0() as usize,
                Timeframe::Year => txn.date.month0() as usize,
            };
            if let Some(bucket) = buckets.get_mut(slot) {
                bucket.totals.add(txn);
            }
            if !txn.is_expense() {
                continue;
            }
            *by_category.entry(txn.category.clone()).or_default() += txn.amount;
            match person_index(txn, people) {
                Some(index) => by_person[index].1 += txn.amount,
                None => unassigned += txn.amount,
            }
        }
        by_person.push((UNASSIGNED.to_string(), unassigned));

        let mut expenses_by_category: Vec<(String, f64)> = by_category.into_iter().collect();
        expenses_by_category.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Dashboard {
            timeframe,
            totals,
            expenses_by_category,
            buckets,
            recent: in_frame.into_iter().take(RECENT_LIMIT).collect(),
            expenses_by_person: by_person,
        }
    }
}

fn empty_buckets(timeframe: Timeframe, today: NaiveDate) -> Vec<Bucket> {
    let labels: Vec<String> = match timeframe {
        Timeframe::Year => MONTH_LABELS.iter().map(|label| label.to_string()).collect(),
        Timeframe::Month => (1..=days_in_month(today)).map(|day| day.to_string()).collect(),
    };
    labels
        .into_iter()
        .map(|label| Bucket {
            label,
            totals: Totals::default(),
        })
        .collect()
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// The configured person an expense belongs to: its `person` field when that
/// names someone configured, else the first name found in the description.
fn person_index(txn: &Transaction, people: &[String]) -> Option<usize> {
    let explicit = txn.person.as_deref().and_then(|person| {
        people
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(person))
    });
    explicit.or_else(|| {
        let description = txn.description.to_lowercase();
        people
            .iter()
            .position(|person| description.contains(&person.to_lowercase()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn txn(description: &str, amount: f64, date: NaiveDate, category: &str, kind: TransactionKind) -> Transaction {
        Transaction::new("ana".into(), description, amount, date, category, kind)
    }

    #[test]
    fn month_view_buckets_by_day() {
        let today = day(2024, 2, 20);
        let txns = vec![
            txn("Sueldo", 1000.0, day(2024, 2, 1), "Salario", TransactionKind::Income),
            txn("Super", 200.0, day(2024, 2, 29), "Comida", TransactionKind::Expense),
            txn("Viejo", 999.0, day(2024, 1, 15), "Comida", TransactionKind::Expense),
        ];
        let dashboard = SummaryService::summarize(&txns, &[], Timeframe::Month, today);
        assert_eq!(dashboard.buckets.len(), 29);
        assert_eq!(dashboard.buckets[28].label, "29");
        assert_eq!(dashboard.buckets[28].totals.expenses, 200.0);
        assert_eq!(dashboard.totals.balance(), 800.0);
        assert_eq!(dashboard.recent.len(), 2);
    }

    #[test]
    fn year_view_uses_spanish_month_labels() {
        let today = day(2024, 6, 1);
        let txns = vec![
            txn("Luz", 50.0, day(2024, 3, 3), "Servicios", TransactionKind::Expense),
            txn("Gas", 70.0, day(2024, 3, 9), "Servicios", TransactionKind::Expense),
            txn("Cine", 30.0, day(2024, 12, 9), "Entretenimiento", TransactionKind::Expense),
        ];
        let dashboard = SummaryService::summarize(&txns, &[], Timeframe::Year, today);
        assert_eq!(dashboard.buckets[2].label, "Mar");
        assert_eq!(dashboard.buckets[2].totals.expenses, 120.0);
        assert_eq!(dashboard.expenses_by_category[0], ("Servicios".to_string(), 120.0));
    }

    #[test]
    fn expenses_are_split_by_person() {
        let today = day(2024, 6, 10);
        let people = vec!["Juan".to_string(), "Sofi".to_string()];
        let mut shared = txn("Regalo", 40.0, today, "Otros", TransactionKind::Expense);
        shared.person = Some("sofi".into());
        let txns = vec![
            txn("Cena con juan", 100.0, today, "Comida", TransactionKind::Expense),
            shared,
            txn("Taxi", 25.0, today, "Transporte", TransactionKind::Expense),
        ];
        let dashboard = SummaryService::summarize(&txns, &people, Timeframe::Month, today);
        assert_eq!(
            dashboard.expenses_by_person,
            vec![
                ("Juan".to_string(), 100.0),
                ("Sofi".to_string(), 40.0),
                (UNASSIGNED.to_string(), 25.0),
            ]
        );
    }
}
