//! Aggregations over ledger entries that are cheap to do in memory.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::UtcOffset;

use super::repo_types::{CategoryTotal, LedgerEntry, MonthlyTotals};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Orders totals by amount descending, then by category name.
pub fn sort_totals(totals: &mut [CategoryTotal]) {
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
}

/// Groups entries by category, summing amounts and counting entries.
///
/// Categories without entries do not appear in the result.
pub fn summarize_by_category<'a>(
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<&str, (Decimal, i64)> = BTreeMap::new();
    for entry in entries {
        let slot = groups.entry(entry.category.as_str()).or_default();
        slot.0 += entry.amount;
        slot.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
        })
        .collect();
    sort_totals(&mut totals);
    totals
}

/// Twelve monthly buckets of income and expenses, January first.
///
/// Callers pass entries of a single calendar year; months are read in `offset`.
pub fn monthly_series(
    deposits: &[LedgerEntry],
    expenses: &[LedgerEntry],
    offset: UtcOffset,
) -> Vec<MonthlyTotals> {
    let mut series: Vec<MonthlyTotals> = MONTH_LABELS
        .iter()
        .map(|&month| MonthlyTotals {
            month,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
        })
        .collect();

    let bucket = |entry: &LedgerEntry| usize::from(u8::from(entry.date.to_offset(offset).month())) - 1;
    for deposit in deposits {
        series[bucket(deposit)].income += deposit.amount;
    }
    for expense in expenses {
        series[bucket(expense)].expenses += expense.amount;
    }
    series
}
