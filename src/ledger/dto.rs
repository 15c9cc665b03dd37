use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime, Time, UtcOffset,
};

use super::repo_types::{CategoryTotal, LedgerEntry, LedgerKind, Overview};
use crate::error::{AppError, AppResult};

/// Timestamp as sent by clients: epoch milliseconds, RFC 3339, or a bare
/// `YYYY-MM-DD` date.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Millis(i64),
    Text(String),
}

impl DateInput {
    /// Bare dates resolve to midnight in `offset`.
    pub fn resolve(&self, offset: UtcOffset) -> AppResult<OffsetDateTime> {
        match self {
            Self::Millis(ms) => OffsetDateTime::from_unix_timestamp_nanos(i128::from(*ms) * 1_000_000)
                .map_err(|_| AppError::validation("Date is out of range")),
            Self::Text(text) => {
                let text = text.trim();
                if let Ok(instant) = OffsetDateTime::parse(text, &Rfc3339) {
                    return Ok(instant);
                }
                Date::parse(text, format_description!("[year]-[month]-[day]"))
                    .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(offset))
                    .map_err(|_| {
                        AppError::validation(
                            "Date must be epoch milliseconds, an RFC 3339 timestamp or a YYYY-MM-DD date",
                        )
                    })
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntryRequest {
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub date: Option<DateInput>,
}

/// Partial update. Absent (or `null`) fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub date: Option<DateInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    pub year: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub success: bool,
    pub message: String,
    pub entry: LedgerEntry,
}

/// A list of entries, keyed `expenses` or `deposits` after its kind.
#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expenses: Option<Vec<LedgerEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposits: Option<Vec<LedgerEntry>>,
}

impl EntriesResponse {
    pub fn new(kind: LedgerKind, entries: Vec<LedgerEntry>) -> Self {
        let (expenses, deposits) = match kind {
            LedgerKind::Expense => (Some(entries), None),
            LedgerKind::Deposit => (None, Some(entries)),
        };
        Self {
            success: true,
            expenses,
            deposits,
        }
    }
}

/// A single entry, keyed `expense` or `deposit` after its kind.
#[derive(Debug, Serialize)]
pub struct SingleEntryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense: Option<LedgerEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit: Option<LedgerEntry>,
}

impl SingleEntryResponse {
    pub fn new(kind: LedgerKind, entry: LedgerEntry) -> Self {
        let (expense, deposit) = match kind {
            LedgerKind::Expense => (Some(entry), None),
            LedgerKind::Deposit => (None, Some(entry)),
        };
        Self {
            success: true,
            expense,
            deposit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategorySummaryResponse {
    pub success: bool,
    pub categories: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub success: bool,
    pub overview: Overview,
}
